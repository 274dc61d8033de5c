//! Transcendental routines of the numeric kernel.
//!
//! Everything here works on the extended reals at the context's working
//! precision: argument reduction plus a series, with the constants (π, ln 2,
//! ln 10, e) derived on first use and cached on the context. The display
//! guard band absorbs the rounding tail of the series, so no routine needs
//! more than context arithmetic.

use bigdecimal::{num_bigint::BigInt, BigDecimal, FromPrimitive, One, RoundingMode, ToPrimitive,
                 Zero};

use crate::interpreter::value::real::{MathContext, Real};

/// Inputs beyond this magnitude saturate `exp` straight to an infinity or
/// zero; the result exponent would otherwise overflow the decimal scale.
const EXP_SATURATION: u64 = 1_000_000_000_000_000_000;

/// π at working precision (Machin's formula, cached).
pub fn pi(ctx: &MathContext) -> BigDecimal {
    ctx.consts
       .pi
       .get_or_init(|| {
           let one = BigDecimal::one();
           let t5 = atan_taylor(ctx, &ctx.div(&one, &BigDecimal::from(5)));
           let t239 = atan_taylor(ctx, &ctx.div(&one, &BigDecimal::from(239)));
           ctx.sub(&ctx.mul(&BigDecimal::from(16), &t5),
                   &ctx.mul(&BigDecimal::from(4), &t239))
       })
       .clone()
}

/// ln 2 at working precision (cached).
pub fn ln2(ctx: &MathContext) -> BigDecimal {
    ctx.consts
       .ln2
       .get_or_init(|| {
           let third = ctx.div(&BigDecimal::one(), &BigDecimal::from(3));
           ctx.mul(&BigDecimal::from(2), &atanh_series(ctx, &third))
       })
       .clone()
}

/// ln 10 at working precision (cached).
pub fn ln10(ctx: &MathContext) -> BigDecimal {
    ctx.consts
       .ln10
       .get_or_init(|| {
           let two_thirds = ctx.div(&BigDecimal::from(2), &BigDecimal::from(3));
           let ln5 = ctx.mul(&BigDecimal::from(2), &atanh_series(ctx, &two_thirds));
           ctx.add(&ln2(ctx), &ln5)
       })
       .clone()
}

/// Euler's number at working precision (cached).
pub fn euler(ctx: &MathContext) -> BigDecimal {
    ctx.consts
       .e
       .get_or_init(|| exp_dec(ctx, &BigDecimal::one()))
       .clone()
}

/// The exponential on the extended reals.
pub fn exp(x: &Real, ctx: &MathContext) -> Real {
    match x {
        Real::Nan => Real::Nan,
        Real::Inf(true) => Real::zero(),
        Real::Inf(false) => Real::Inf(false),
        Real::Num(d) => {
            if d.abs() > BigDecimal::from(EXP_SATURATION) {
                if d < &BigDecimal::zero() {
                    Real::zero()
                } else {
                    Real::Inf(false)
                }
            } else {
                Real::Num(exp_dec(ctx, d))
            }
        },
    }
}

/// The natural logarithm on the extended reals.
///
/// Defined for non-negative inputs: `ln 0` is `-Inf` and negative inputs
/// yield `NaN` (the complex layer supplies the principal branch there).
pub fn ln(x: &Real, ctx: &MathContext) -> Real {
    match x {
        Real::Nan | Real::Inf(true) => Real::Nan,
        Real::Inf(false) => Real::Inf(false),
        Real::Num(d) => {
            if d.is_zero() {
                Real::Inf(true)
            } else if d < &BigDecimal::zero() {
                Real::Nan
            } else {
                Real::Num(ln_dec(ctx, d))
            }
        },
    }
}

/// The sine on the extended reals.
pub fn sin(x: &Real, ctx: &MathContext) -> Real {
    match x {
        Real::Num(d) => Real::Num(sin_dec(ctx, d)),
        _ => Real::Nan,
    }
}

/// The cosine on the extended reals.
pub fn cos(x: &Real, ctx: &MathContext) -> Real {
    match x {
        Real::Num(d) => Real::Num(cos_dec(ctx, d)),
        _ => Real::Nan,
    }
}

/// The arc tangent on the extended reals.
pub fn atan(x: &Real, ctx: &MathContext) -> Real {
    match x {
        Real::Nan => Real::Nan,
        Real::Inf(negative) => {
            let half_pi = ctx.div(&pi(ctx), &BigDecimal::from(2));
            Real::Num(if *negative { -half_pi } else { half_pi })
        },
        Real::Num(d) => Real::Num(atan_dec(ctx, d)),
    }
}

/// The two-argument arc tangent, with the usual quadrant and infinity
/// conventions.
pub fn atan2(y: &Real, x: &Real, ctx: &MathContext) -> Real {
    let pi_d = pi(ctx);
    let half_pi = ctx.div(&pi_d, &BigDecimal::from(2));

    match (y, x) {
        (Real::Nan, _) | (_, Real::Nan) => Real::Nan,
        (Real::Inf(yn), Real::Inf(xn)) => {
            let eighths = match (yn, xn) {
                (false, false) => 1,
                (false, true) => 3,
                (true, true) => -3,
                (true, false) => -1,
            };
            Real::Num(ctx.div(&ctx.mul(&pi_d, &BigDecimal::from(eighths)),
                              &BigDecimal::from(4)))
        },
        (Real::Inf(negative), Real::Num(_)) => {
            Real::Num(if *negative { -half_pi } else { half_pi })
        },
        (Real::Num(d), Real::Inf(negative)) => {
            if *negative {
                if d < &BigDecimal::zero() {
                    Real::Num(-pi_d)
                } else {
                    Real::Num(pi_d)
                }
            } else {
                Real::zero()
            }
        },
        (Real::Num(yd), Real::Num(xd)) => {
            if xd.is_zero() {
                if yd.is_zero() {
                    Real::zero()
                } else if yd < &BigDecimal::zero() {
                    Real::Num(-half_pi)
                } else {
                    Real::Num(half_pi)
                }
            } else {
                let base = atan_dec(ctx, &ctx.div(yd, xd));
                if xd > &BigDecimal::zero() {
                    Real::Num(base)
                } else if yd < &BigDecimal::zero() {
                    Real::Num(ctx.sub(&base, &pi_d))
                } else {
                    Real::Num(ctx.add(&base, &pi_d))
                }
            }
        },
    }
}

/// The square root on the extended reals; negative inputs yield `NaN` (the
/// complex layer supplies the principal branch there).
pub fn sqrt(x: &Real, ctx: &MathContext) -> Real {
    match x {
        Real::Nan | Real::Inf(true) => Real::Nan,
        Real::Inf(false) => Real::Inf(false),
        Real::Num(d) => {
            if d < &BigDecimal::zero() {
                Real::Nan
            } else {
                Real::Num(sqrt_dec(ctx, d))
            }
        },
    }
}

/// `sqrt(a² + b²)` on the extended reals.
pub fn hypot(a: &Real, b: &Real, ctx: &MathContext) -> Real {
    match (a, b) {
        (Real::Nan, _) | (_, Real::Nan) => Real::Nan,
        (Real::Inf(_), _) | (_, Real::Inf(_)) => Real::Inf(false),
        (Real::Num(x), Real::Num(y)) => {
            Real::Num(sqrt_dec(ctx, &ctx.add(&ctx.mul(x, x), &ctx.mul(y, y))))
        },
    }
}

fn exp_dec(ctx: &MathContext, x: &BigDecimal) -> BigDecimal {
    if x.is_zero() {
        return BigDecimal::one();
    }

    let quarter = BigDecimal::new(BigInt::from(25), 2);
    let two = BigDecimal::from(2);

    let mut r = ctx.round(x);
    let mut halvings = 0u32;
    while r.abs() > quarter {
        r = ctx.div(&r, &two);
        halvings += 1;
    }

    let mut sum = BigDecimal::one();
    let mut term = BigDecimal::one();
    let mut n = 1u64;
    loop {
        term = ctx.div(&ctx.mul(&term, &r), &BigDecimal::from(n));
        let next = ctx.add(&sum, &term);
        if next == sum {
            break;
        }
        sum = next;
        n += 1;
    }

    for _ in 0..halvings {
        sum = ctx.mul(&sum, &sum);
    }
    sum
}

fn ln_dec(ctx: &MathContext, x: &BigDecimal) -> BigDecimal {
    let x = x.normalized();
    let digits = i64::try_from(x.digits()).unwrap_or(i64::MAX);
    let (int_part, scale) = x.into_bigint_and_exponent();
    let exponent = digits - 1 - scale;

    // mantissa in [1, 10), halved into (0.6, 1.2) so the series converges
    let mut m = BigDecimal::new(int_part, digits - 1);
    let mut acc = ctx.mul(&BigDecimal::from(exponent), &ln10(ctx));

    let threshold = BigDecimal::new(BigInt::from(12), 1);
    let two = BigDecimal::from(2);
    let mut halvings = 0i64;
    while m >= threshold {
        m = ctx.div(&m, &two);
        halvings += 1;
    }
    acc = ctx.add(&acc, &ctx.mul(&BigDecimal::from(halvings), &ln2(ctx)));

    let one = BigDecimal::one();
    let t = ctx.div(&ctx.sub(&m, &one), &ctx.add(&m, &one));
    ctx.add(&acc, &ctx.mul(&two, &atanh_series(ctx, &t)))
}

/// `atanh t = t + t³/3 + t⁵/5 + …` for `|t| < 1`.
fn atanh_series(ctx: &MathContext, t: &BigDecimal) -> BigDecimal {
    let t2 = ctx.mul(t, t);
    let mut power = t.clone();
    let mut sum = t.clone();
    let mut k = 1u64;
    loop {
        power = ctx.mul(&power, &t2);
        let term = ctx.div(&power, &BigDecimal::from(2 * k + 1));
        let next = ctx.add(&sum, &term);
        if next == sum {
            break;
        }
        sum = next;
        k += 1;
    }
    sum
}

/// `atan t = t - t³/3 + t⁵/5 - …` for small `|t|`.
fn atan_taylor(ctx: &MathContext, t: &BigDecimal) -> BigDecimal {
    let neg_t2 = -ctx.mul(t, t);
    let mut power = t.clone();
    let mut sum = t.clone();
    let mut k = 1u64;
    loop {
        power = ctx.mul(&power, &neg_t2);
        let term = ctx.div(&power, &BigDecimal::from(2 * k + 1));
        let next = ctx.add(&sum, &term);
        if next == sum {
            break;
        }
        sum = next;
        k += 1;
    }
    sum
}

fn atan_dec(ctx: &MathContext, x: &BigDecimal) -> BigDecimal {
    let one = BigDecimal::one();
    if x.abs() > one {
        let half_pi = ctx.div(&pi(ctx), &BigDecimal::from(2));
        let inner = atan_dec(ctx, &ctx.div(&one, x));
        return if x > &BigDecimal::zero() {
            ctx.sub(&half_pi, &inner)
        } else {
            ctx.sub(&-half_pi, &inner)
        };
    }

    // halve the argument until the series converges quickly:
    // atan x = 2 atan(x / (1 + sqrt(1 + x²)))
    let quarter = BigDecimal::new(BigInt::from(25), 2);
    let mut x = x.clone();
    let mut doublings = 0u32;
    while x.abs() > quarter {
        let s = sqrt_dec(ctx, &ctx.add(&one, &ctx.mul(&x, &x)));
        x = ctx.div(&x, &ctx.add(&one, &s));
        doublings += 1;
    }

    let mut result = atan_taylor(ctx, &x);
    for _ in 0..doublings {
        result = ctx.mul(&BigDecimal::from(2), &result);
    }
    result
}

/// Reduces the argument into `[-π, π]`.
fn reduce_periodic(ctx: &MathContext, x: &BigDecimal) -> BigDecimal {
    let two_pi = ctx.mul(&BigDecimal::from(2), &pi(ctx));
    let n = ctx.div(x, &two_pi).with_scale_round(0, RoundingMode::HalfEven);
    ctx.sub(x, &ctx.mul(&n, &two_pi))
}

fn sin_dec(ctx: &MathContext, x: &BigDecimal) -> BigDecimal {
    let r = reduce_periodic(ctx, x);
    let r2 = ctx.mul(&r, &r);
    let mut term = r.clone();
    let mut sum = r;
    let mut k = 1u64;
    loop {
        term = -ctx.div(&ctx.mul(&term, &r2), &BigDecimal::from(2 * k * (2 * k + 1)));
        let next = ctx.add(&sum, &term);
        if next == sum {
            break;
        }
        sum = next;
        k += 1;
    }
    sum
}

fn cos_dec(ctx: &MathContext, x: &BigDecimal) -> BigDecimal {
    let r = reduce_periodic(ctx, x);
    let r2 = ctx.mul(&r, &r);
    let mut term = BigDecimal::one();
    let mut sum = BigDecimal::one();
    let mut k = 1u64;
    loop {
        term = -ctx.div(&ctx.mul(&term, &r2), &BigDecimal::from((2 * k - 1) * (2 * k)));
        let next = ctx.add(&sum, &term);
        if next == sum {
            break;
        }
        sum = next;
        k += 1;
    }
    sum
}

fn sqrt_dec(ctx: &MathContext, a: &BigDecimal) -> BigDecimal {
    if a.is_zero() {
        return BigDecimal::zero();
    }

    let seed = a.to_f64().map_or(f64::INFINITY, f64::sqrt);
    let mut y = if seed.is_finite() && seed > 0.0 {
        BigDecimal::from_f64(seed).unwrap_or_else(BigDecimal::one)
    } else {
        // magnitude-only seed for values outside f64 range
        let digits = i64::try_from(a.digits()).unwrap_or(i64::MAX);
        let (_, scale) = a.as_bigint_and_exponent();
        let exponent = digits - 1 - scale;
        BigDecimal::new(BigInt::one(), -(exponent / 2))
    };

    let two = BigDecimal::from(2);
    let mut previous = BigDecimal::zero();
    for _ in 0..64 {
        let next = ctx.div(&ctx.add(&y, &ctx.div(a, &y)), &two);
        if next == y || next == previous {
            break;
        }
        previous = std::mem::replace(&mut y, next);
    }
    y
}

#[cfg(test)]
mod tests {
    use super::*;

    fn num(text: &str) -> Real {
        Real::from_literal(text).unwrap()
    }

    #[test]
    fn exponential_and_logarithm_invert() {
        let ctx = MathContext::default();
        let x = num("2.5");

        let roundtrip = ln(&exp(&x, &ctx), &ctx);
        assert!(roundtrip.eq_display(&x, &ctx));
        assert!(exp(&Real::zero(), &ctx).eq_display(&Real::one(), &ctx));
        assert_eq!(ln(&Real::zero(), &ctx), Real::Inf(true));
    }

    #[test]
    fn square_roots() {
        let ctx = MathContext::default();

        assert!(sqrt(&num("9"), &ctx).eq_display(&num("3"), &ctx));
        assert!(sqrt(&num("2"), &ctx).to_display_string(&ctx)
                                     .starts_with("1.41421356"));
        assert_eq!(sqrt(&num("-1"), &ctx), Real::Nan);
    }

    #[test]
    fn trigonometry_at_well_known_points() {
        let ctx = MathContext::default();
        let half_pi = Real::Num(ctx.div(&pi(&ctx), &BigDecimal::from(2)));

        assert!(sin(&half_pi, &ctx).eq_display(&Real::one(), &ctx));
        assert!(cos(&Real::zero(), &ctx).eq_display(&Real::one(), &ctx));
        assert_eq!(sin(&Real::Inf(false), &ctx), Real::Nan);
    }

    #[test]
    fn arc_tangent_matches_pi() {
        let ctx = MathContext::default();
        let quarter_pi = atan(&Real::one(), &ctx);
        let four = Real::from_i64(4);

        assert!(quarter_pi.mul(&four, &ctx)
                          .eq_display(&Real::Num(pi(&ctx)), &ctx));
    }
}
