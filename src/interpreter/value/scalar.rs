use std::cmp::Ordering;

use bigdecimal::{BigDecimal, One};

use crate::interpreter::value::{
    kernel,
    real::{MathContext, Real},
};

/// Class tag of a scalar: ordinary decimal or logical (0/1).
///
/// Comparison and logical operators produce `Logical` scalars; arithmetic
/// always produces `Decimal` ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberClass {
    /// An ordinary decimal number.
    Decimal,
    /// A boolean projected into {0, 1}.
    Logical,
}

/// An arbitrary-precision complex scalar.
///
/// Both components are extended reals, so the IEEE-style special values
/// (±∞, `NaN`) are representable and propagate through every operation.
#[derive(Debug, Clone, PartialEq)]
pub struct Scalar {
    /// The real part.
    pub re:    Real,
    /// The imaginary part.
    pub im:    Real,
    /// The class tag.
    pub class: NumberClass,
}

impl Scalar {
    /// Builds a decimal scalar from both components.
    #[must_use]
    pub const fn new(re: Real, im: Real) -> Self {
        Self { re,
               im,
               class: NumberClass::Decimal, }
    }

    /// Builds a real-valued decimal scalar.
    #[must_use]
    pub fn real(re: Real) -> Self {
        Self::new(re, Real::zero())
    }

    /// Builds a scalar from an `i64`.
    #[must_use]
    pub fn from_i64(value: i64) -> Self {
        Self::new(Real::from_i64(value), Real::zero())
    }

    /// Builds a scalar from a `usize`.
    #[must_use]
    pub fn from_usize(value: usize) -> Self {
        Self::new(Real::from_usize(value), Real::zero())
    }

    /// The scalar zero.
    #[must_use]
    pub fn zero() -> Self {
        Self::from_i64(0)
    }

    /// The scalar one.
    #[must_use]
    pub fn one() -> Self {
        Self::from_i64(1)
    }

    /// A logical scalar carrying 0 or 1.
    #[must_use]
    pub fn logical(value: bool) -> Self {
        Self { re:    if value { Real::one() } else { Real::zero() },
               im:    Real::zero(),
               class: NumberClass::Logical, }
    }

    /// The imaginary unit.
    #[must_use]
    pub fn imaginary_unit() -> Self {
        Self::new(Real::zero(), Real::one())
    }

    /// Positive infinity.
    #[must_use]
    pub fn infinity() -> Self {
        Self::new(Real::Inf(false), Real::zero())
    }

    /// Not-a-number.
    #[must_use]
    pub fn nan() -> Self {
        Self::new(Real::Nan, Real::zero())
    }

    /// `true` when the imaginary part is zero.
    #[must_use]
    pub fn is_real(&self) -> bool {
        self.im.is_zero()
    }

    /// `true` when both components are zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.re.is_zero() && self.im.is_zero()
    }

    /// `true` when the value is a real integer.
    #[must_use]
    pub fn is_integer(&self) -> bool {
        self.is_real() && self.re.is_integer()
    }

    /// The boolean projection: non-zero and free of `NaN`.
    #[must_use]
    pub fn is_true(&self) -> bool {
        if self.re.is_nan() || self.im.is_nan() {
            return false;
        }
        !self.is_zero()
    }

    /// Reads the value as a subscript (a positive real integer), if it is
    /// one.
    #[must_use]
    pub fn to_subscript(&self) -> Option<usize> {
        if !self.is_real() {
            return None;
        }
        match self.re.to_index() {
            Some(i) if i >= 1 => Some(i),
            _ => None,
        }
    }

    /// Addition.
    #[must_use]
    pub fn add(&self, other: &Self, ctx: &MathContext) -> Self {
        Self::new(self.re.add(&other.re, ctx), self.im.add(&other.im, ctx))
    }

    /// Subtraction.
    #[must_use]
    pub fn sub(&self, other: &Self, ctx: &MathContext) -> Self {
        Self::new(self.re.sub(&other.re, ctx), self.im.sub(&other.im, ctx))
    }

    /// Multiplication.
    #[must_use]
    pub fn mul(&self, other: &Self, ctx: &MathContext) -> Self {
        if self.is_real() && other.is_real() {
            return Self::new(self.re.mul(&other.re, ctx), Real::zero());
        }
        let re = self.re
                     .mul(&other.re, ctx)
                     .sub(&self.im.mul(&other.im, ctx), ctx);
        let im = self.re
                     .mul(&other.im, ctx)
                     .add(&self.im.mul(&other.re, ctx), ctx);
        Self::new(re, im)
    }

    /// Right division `self / other`.
    ///
    /// A zero divisor produces component-wise signed infinities (`0/0` is
    /// `NaN`); an infinite divisor pulls finite dividends to zero.
    #[must_use]
    pub fn div(&self, other: &Self, ctx: &MathContext) -> Self {
        if self.is_real() && other.is_real() {
            return Self::new(self.re.div(&other.re, ctx), Real::zero());
        }
        if other.is_zero() {
            return Self::new(self.re.div(&Real::zero(), ctx),
                             self.im.div(&Real::zero(), ctx));
        }
        let denom = other.re
                         .mul(&other.re, ctx)
                         .add(&other.im.mul(&other.im, ctx), ctx);
        let recip = Self::new(other.re.div(&denom, ctx), other.im.neg().div(&denom, ctx));
        self.mul(&recip, ctx)
    }

    /// Left division `other \ self`, reading `self \ other` as "divide the
    /// right operand by the left".
    #[must_use]
    pub fn ldiv(&self, other: &Self, ctx: &MathContext) -> Self {
        other.div(self, ctx)
    }

    /// Negation.
    #[must_use]
    pub fn neg(&self) -> Self {
        Self::new(self.re.neg(), self.im.neg())
    }

    /// Complex conjugation.
    #[must_use]
    pub fn conj(&self) -> Self {
        Self::new(self.re.clone(), self.im.neg())
    }

    /// The magnitude as a real scalar.
    #[must_use]
    pub fn abs(&self, ctx: &MathContext) -> Self {
        if self.is_real() {
            return Self::new(self.re.abs(), Real::zero());
        }
        Self::new(kernel::hypot(&self.re, &self.im, ctx), Real::zero())
    }

    /// The argument (phase angle) in `(-π, π]` as a real scalar.
    #[must_use]
    pub fn arg(&self, ctx: &MathContext) -> Self {
        Self::new(kernel::atan2(&self.im, &self.re, ctx), Real::zero())
    }

    /// The sign: `z / |z|` for non-zero values, zero at zero.
    #[must_use]
    pub fn sign(&self, ctx: &MathContext) -> Self {
        if self.is_zero() {
            return Self::zero();
        }
        if self.is_real() {
            return if self.re.is_nan() {
                Self::nan()
            } else if self.re.is_negative() {
                Self::from_i64(-1)
            } else {
                Self::one()
            };
        }
        self.div(&self.abs(ctx), ctx)
    }

    /// Component-wise floor.
    #[must_use]
    pub fn floor(&self) -> Self {
        Self::new(self.re.floor(), self.im.floor())
    }

    /// Component-wise ceiling.
    #[must_use]
    pub fn ceil(&self) -> Self {
        Self::new(self.re.ceil(), self.im.ceil())
    }

    /// Component-wise rounding to nearest, halves away from zero.
    #[must_use]
    pub fn round(&self) -> Self {
        Self::new(self.re.round_nearest(), self.im.round_nearest())
    }

    /// Component-wise truncation toward zero.
    #[must_use]
    pub fn fix(&self) -> Self {
        Self::new(self.re.fix(), self.im.fix())
    }

    /// The principal square root.
    #[must_use]
    pub fn sqrt(&self, ctx: &MathContext) -> Self {
        if self.is_real() && !self.re.is_negative() {
            return Self::new(kernel::sqrt(&self.re, ctx), Real::zero());
        }
        let r = self.abs(ctx).re;
        let two = Real::from_i64(2);
        let re = kernel::sqrt(&r.add(&self.re, ctx).div(&two, ctx), ctx);
        let mut im = kernel::sqrt(&r.sub(&self.re, ctx).div(&two, ctx), ctx);
        if self.im.is_negative() {
            im = im.neg();
        }
        Self::new(re, im)
    }

    /// The exponential.
    #[must_use]
    pub fn exp(&self, ctx: &MathContext) -> Self {
        let magnitude = kernel::exp(&self.re, ctx);
        if self.im.is_zero() {
            return Self::new(magnitude, Real::zero());
        }
        Self::new(magnitude.mul(&kernel::cos(&self.im, ctx), ctx),
                  magnitude.mul(&kernel::sin(&self.im, ctx), ctx))
    }

    /// The principal-branch natural logarithm.
    #[must_use]
    pub fn ln(&self, ctx: &MathContext) -> Self {
        if self.is_real() && !self.re.is_negative() {
            return Self::new(kernel::ln(&self.re, ctx), Real::zero());
        }
        let modulus = self.abs(ctx).re;
        Self::new(kernel::ln(&modulus, ctx), kernel::atan2(&self.im, &self.re, ctx))
    }

    /// The base-10 logarithm.
    #[must_use]
    pub fn log10(&self, ctx: &MathContext) -> Self {
        let ln10 = Self::new(Real::Num(kernel::ln10(ctx)), Real::zero());
        self.ln(ctx).div(&ln10, ctx)
    }

    /// The base-`b` logarithm.
    #[must_use]
    pub fn logb(&self, base: &Self, ctx: &MathContext) -> Self {
        self.ln(ctx).div(&base.ln(ctx), ctx)
    }

    /// Exponentiation with the principal branch: `exp(y · ln x)`, with a
    /// repeated-product shortcut for real integer exponents and a real
    /// shortcut for non-negative real bases.
    #[must_use]
    pub fn pow(&self, exponent: &Self, ctx: &MathContext) -> Self {
        if exponent.is_zero() {
            return Self::one();
        }
        if self.is_zero() {
            return if exponent.is_real() && !exponent.re.is_negative() {
                Self::zero()
            } else if exponent.is_real() {
                Self::infinity()
            } else {
                Self::nan()
            };
        }

        if exponent.is_integer() {
            if let Some(n) = exponent.re.abs().to_index() {
                let mut result = Self::one();
                let mut base = self.clone();
                let mut n = n;
                while n > 0 {
                    if n % 2 == 1 {
                        result = result.mul(&base, ctx);
                    }
                    base = base.mul(&base, ctx);
                    n /= 2;
                }
                if exponent.re.is_negative() {
                    result = Self::one().div(&result, ctx);
                }
                return result;
            }
        }

        if self.is_real() && !self.re.is_negative() && exponent.is_real() {
            let ln_base = kernel::ln(&self.re, ctx);
            return Self::new(kernel::exp(&exponent.re.mul(&ln_base, ctx), ctx), Real::zero());
        }

        self.ln(ctx).mul(exponent, ctx).exp(ctx)
    }

    /// The sine.
    #[must_use]
    pub fn sin(&self, ctx: &MathContext) -> Self {
        if self.is_real() {
            return Self::new(kernel::sin(&self.re, ctx), Real::zero());
        }
        Self::new(kernel::sin(&self.re, ctx).mul(&cosh_real(&self.im, ctx), ctx),
                  kernel::cos(&self.re, ctx).mul(&sinh_real(&self.im, ctx), ctx))
    }

    /// The cosine.
    #[must_use]
    pub fn cos(&self, ctx: &MathContext) -> Self {
        if self.is_real() {
            return Self::new(kernel::cos(&self.re, ctx), Real::zero());
        }
        Self::new(kernel::cos(&self.re, ctx).mul(&cosh_real(&self.im, ctx), ctx),
                  kernel::sin(&self.re, ctx).neg().mul(&sinh_real(&self.im, ctx), ctx))
    }

    /// The tangent.
    #[must_use]
    pub fn tan(&self, ctx: &MathContext) -> Self {
        self.sin(ctx).div(&self.cos(ctx), ctx)
    }

    /// The cosecant.
    #[must_use]
    pub fn csc(&self, ctx: &MathContext) -> Self {
        Self::one().div(&self.sin(ctx), ctx)
    }

    /// The secant.
    #[must_use]
    pub fn sec(&self, ctx: &MathContext) -> Self {
        Self::one().div(&self.cos(ctx), ctx)
    }

    /// The cotangent.
    #[must_use]
    pub fn cot(&self, ctx: &MathContext) -> Self {
        self.cos(ctx).div(&self.sin(ctx), ctx)
    }

    /// The principal arc sine.
    #[must_use]
    pub fn asin(&self, ctx: &MathContext) -> Self {
        if self.is_real() {
            if let Some(Ordering::Less | Ordering::Equal) =
                self.re.abs().partial_cmp(&Real::one())
            {
                let one = Real::one();
                let root = kernel::sqrt(&one.sub(&self.re.mul(&self.re, ctx), ctx), ctx);
                return Self::new(kernel::atan2(&self.re, &root, ctx), Real::zero());
            }
        }
        // asin z = -i ln(iz + sqrt(1 - z²))
        let i = Self::imaginary_unit();
        let inner = i.mul(self, ctx)
                     .add(&Self::one().sub(&self.mul(self, ctx), ctx).sqrt(ctx), ctx);
        i.neg().mul(&inner.ln(ctx), ctx)
    }

    /// The principal arc cosine.
    #[must_use]
    pub fn acos(&self, ctx: &MathContext) -> Self {
        let half_pi = Self::new(Real::Num(kernel::pi(ctx)), Real::zero())
            .div(&Self::from_i64(2), ctx);
        half_pi.sub(&self.asin(ctx), ctx)
    }

    /// The principal arc tangent.
    #[must_use]
    pub fn atan(&self, ctx: &MathContext) -> Self {
        if self.is_real() {
            return Self::new(kernel::atan(&self.re, ctx), Real::zero());
        }
        // atan z = -(i/2) ln((1 + iz)/(1 - iz))
        let i = Self::imaginary_unit();
        let iz = i.mul(self, ctx);
        let ratio = Self::one().add(&iz, ctx)
                               .div(&Self::one().sub(&iz, ctx), ctx);
        i.neg().div(&Self::from_i64(2), ctx).mul(&ratio.ln(ctx), ctx)
    }

    /// The arc cosecant.
    #[must_use]
    pub fn acsc(&self, ctx: &MathContext) -> Self {
        Self::one().div(self, ctx).asin(ctx)
    }

    /// The arc secant.
    #[must_use]
    pub fn asec(&self, ctx: &MathContext) -> Self {
        Self::one().div(self, ctx).acos(ctx)
    }

    /// The arc cotangent.
    #[must_use]
    pub fn acot(&self, ctx: &MathContext) -> Self {
        Self::one().div(self, ctx).atan(ctx)
    }

    /// The hyperbolic sine.
    #[must_use]
    pub fn sinh(&self, ctx: &MathContext) -> Self {
        if self.is_real() {
            return Self::new(sinh_real(&self.re, ctx), Real::zero());
        }
        Self::new(sinh_real(&self.re, ctx).mul(&kernel::cos(&self.im, ctx), ctx),
                  cosh_real(&self.re, ctx).mul(&kernel::sin(&self.im, ctx), ctx))
    }

    /// The hyperbolic cosine.
    #[must_use]
    pub fn cosh(&self, ctx: &MathContext) -> Self {
        if self.is_real() {
            return Self::new(cosh_real(&self.re, ctx), Real::zero());
        }
        Self::new(cosh_real(&self.re, ctx).mul(&kernel::cos(&self.im, ctx), ctx),
                  sinh_real(&self.re, ctx).mul(&kernel::sin(&self.im, ctx), ctx))
    }

    /// The hyperbolic tangent.
    #[must_use]
    pub fn tanh(&self, ctx: &MathContext) -> Self {
        self.sinh(ctx).div(&self.cosh(ctx), ctx)
    }

    /// The hyperbolic cosecant.
    #[must_use]
    pub fn csch(&self, ctx: &MathContext) -> Self {
        Self::one().div(&self.sinh(ctx), ctx)
    }

    /// The hyperbolic secant.
    #[must_use]
    pub fn sech(&self, ctx: &MathContext) -> Self {
        Self::one().div(&self.cosh(ctx), ctx)
    }

    /// The hyperbolic cotangent.
    #[must_use]
    pub fn coth(&self, ctx: &MathContext) -> Self {
        self.cosh(ctx).div(&self.sinh(ctx), ctx)
    }

    /// The principal inverse hyperbolic sine: `ln(z + sqrt(z² + 1))`.
    #[must_use]
    pub fn asinh(&self, ctx: &MathContext) -> Self {
        self.add(&self.mul(self, ctx).add(&Self::one(), ctx).sqrt(ctx), ctx)
            .ln(ctx)
    }

    /// The principal inverse hyperbolic cosine: `ln(z + sqrt(z² - 1))`.
    #[must_use]
    pub fn acosh(&self, ctx: &MathContext) -> Self {
        self.add(&self.mul(self, ctx).sub(&Self::one(), ctx).sqrt(ctx), ctx)
            .ln(ctx)
    }

    /// The principal inverse hyperbolic tangent: `ln((1+z)/(1-z)) / 2`.
    #[must_use]
    pub fn atanh(&self, ctx: &MathContext) -> Self {
        Self::one().add(self, ctx)
                   .div(&Self::one().sub(self, ctx), ctx)
                   .ln(ctx)
                   .div(&Self::from_i64(2), ctx)
    }

    /// The inverse hyperbolic cosecant.
    #[must_use]
    pub fn acsch(&self, ctx: &MathContext) -> Self {
        Self::one().div(self, ctx).asinh(ctx)
    }

    /// The inverse hyperbolic secant.
    #[must_use]
    pub fn asech(&self, ctx: &MathContext) -> Self {
        Self::one().div(self, ctx).acosh(ctx)
    }

    /// The inverse hyperbolic cotangent.
    #[must_use]
    pub fn acoth(&self, ctx: &MathContext) -> Self {
        Self::one().div(self, ctx).atanh(ctx)
    }

    /// The gamma function by the Lanczos approximation (g = 7, 9
    /// coefficients); poles at the non-positive integers yield `Inf`.
    #[must_use]
    pub fn gamma(&self, ctx: &MathContext) -> Self {
        if self.is_real() && self.re.is_integer() && !self.re.is_negative() && !self.re.is_zero()
        {
            // integer arguments have exact factorials
            if let Some(n) = self.re.to_index() {
                if let Some(exact) = factorial_exact(n - 1, ctx) {
                    return exact;
                }
            }
        }
        if self.is_integer() && (self.re.is_negative() || self.re.is_zero()) {
            return Self::infinity();
        }
        lanczos_gamma(self, ctx)
    }

    /// The factorial as `gamma(n + 1)` restricted to non-negative real
    /// integers; other inputs yield `None` for the caller's domain guard.
    #[must_use]
    pub fn factorial(&self, ctx: &MathContext) -> Option<Self> {
        if !self.is_real() || !self.re.is_integer() || self.re.is_negative() {
            return None;
        }
        let n = self.re.to_index()?;
        factorial_exact(n, ctx)
    }

    /// Polar lexicographic comparison: magnitude first, ties broken by the
    /// argument in `(-π, π]`. Real operands short-circuit to the real
    /// order. `None` whenever `NaN` is involved.
    #[must_use]
    pub fn compare(&self, other: &Self, ctx: &MathContext) -> Option<Ordering> {
        if self.re.is_nan() || self.im.is_nan() || other.re.is_nan() || other.im.is_nan() {
            return None;
        }
        if self.is_real() && other.is_real() {
            return self.re.partial_cmp(&other.re);
        }

        let a = self.abs(ctx).re;
        let b = other.abs(ctx).re;
        if a.eq_display(&b, ctx) {
            self.arg(ctx).re.partial_cmp(&other.arg(ctx).re)
        } else {
            a.partial_cmp(&b)
        }
    }

    /// Equality at display precision, component-wise.
    #[must_use]
    pub fn eq_display(&self, other: &Self, ctx: &MathContext) -> bool {
        self.re.eq_display(&other.re, ctx) && self.im.eq_display(&other.im, ctx)
    }

    /// Renders the scalar: `a`, `bi`, `a + bi`, or `a - bi`.
    #[must_use]
    pub fn to_display_string(&self, ctx: &MathContext) -> String {
        if self.im.is_zero() {
            return self.re.to_display_string(ctx);
        }
        if self.re.is_zero() {
            return format!("{}i", self.im.to_display_string(ctx));
        }
        if self.im.is_negative() {
            format!("{} - {}i",
                    self.re.to_display_string(ctx),
                    self.im.neg().to_display_string(ctx))
        } else {
            format!("{} + {}i",
                    self.re.to_display_string(ctx),
                    self.im.to_display_string(ctx))
        }
    }
}

/// `sinh x = (eˣ - e⁻ˣ) / 2` on the extended reals.
fn sinh_real(x: &Real, ctx: &MathContext) -> Real {
    let ep = kernel::exp(x, ctx);
    let en = kernel::exp(&x.neg(), ctx);
    ep.sub(&en, ctx).div(&Real::from_i64(2), ctx)
}

/// `cosh x = (eˣ + e⁻ˣ) / 2` on the extended reals.
fn cosh_real(x: &Real, ctx: &MathContext) -> Real {
    let ep = kernel::exp(x, ctx);
    let en = kernel::exp(&x.neg(), ctx);
    ep.add(&en, ctx).div(&Real::from_i64(2), ctx)
}

/// The exact integer factorial, rounded through the context.
fn factorial_exact(n: usize, ctx: &MathContext) -> Option<Scalar> {
    let mut acc = BigDecimal::one();
    for k in 2..=u64::try_from(n).ok()? {
        acc = ctx.mul(&acc, &BigDecimal::from(k));
    }
    Some(Scalar::new(Real::Num(acc), Real::zero()))
}

/// Lanczos coefficients for g = 7 (Numerical Recipes table). The accuracy
/// of `gamma` is bounded by this table, well inside the display guard band.
const LANCZOS: [&str; 9] = ["0.99999999999980993",
                            "676.5203681218851",
                            "-1259.1392167224028",
                            "771.32342877765313",
                            "-176.61502916214059",
                            "12.507343278686905",
                            "-0.13857109526572012",
                            "0.0000099843695780195716",
                            "0.00000015056327351493116"];

fn lanczos_gamma(z: &Scalar, ctx: &MathContext) -> Scalar {
    let half = Scalar::new(Real::from_literal("0.5").unwrap_or_else(Real::one), Real::zero());

    if let Some(Ordering::Less) = z.re.partial_cmp(&half.re) {
        // reflection: Γ(z) = π / (sin(πz) Γ(1 - z))
        let pi = Scalar::new(Real::Num(kernel::pi(ctx)), Real::zero());
        let sine = pi.mul(z, ctx).sin(ctx);
        let reflected = Scalar::one().sub(z, ctx).gamma(ctx);
        return pi.div(&sine.mul(&reflected, ctx), ctx);
    }

    let z = z.sub(&Scalar::one(), ctx);
    let mut x = Scalar::new(Real::from_literal(LANCZOS[0]).unwrap_or_else(Real::one),
                            Real::zero());
    for (i, coeff) in LANCZOS.iter().enumerate().skip(1) {
        let c = Scalar::new(Real::from_literal(coeff).unwrap_or_else(Real::zero), Real::zero());
        let denom = z.add(&Scalar::from_usize(i), ctx);
        x = x.add(&c.div(&denom, ctx), ctx);
    }

    let g_half = Scalar::new(Real::from_literal("7.5").unwrap_or_else(Real::one), Real::zero());
    let t = z.add(&g_half, ctx);
    let two_pi = Scalar::new(Real::Num(kernel::pi(ctx)), Real::zero()).mul(&Scalar::from_i64(2),
                                                                           ctx);

    two_pi.sqrt(ctx)
          .mul(&t.pow(&z.add(&half, ctx), ctx), ctx)
          .mul(&t.neg().exp(ctx), ctx)
          .mul(&x, ctx)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn real(text: &str) -> Scalar {
        Scalar::new(Real::from_literal(text).unwrap(), Real::zero())
    }

    fn complex(re: &str, im: &str) -> Scalar {
        Scalar::new(Real::from_literal(re).unwrap(), Real::from_literal(im).unwrap())
    }

    #[test]
    fn complex_multiplication() {
        let ctx = MathContext::default();
        let product = complex("1", "2").mul(&complex("3", "-1"), &ctx);

        assert!(product.eq_display(&complex("5", "5"), &ctx));
    }

    #[test]
    fn division_by_zero_follows_the_numerator() {
        let ctx = MathContext::default();

        let q = real("-4").div(&Scalar::zero(), &ctx);
        assert_eq!(q.re, Real::Inf(true));

        let indeterminate = Scalar::zero().div(&Scalar::zero(), &ctx);
        assert!(indeterminate.re.is_nan());
    }

    #[test]
    fn principal_square_root_of_negative_reals() {
        let ctx = MathContext::default();
        let root = real("-9").sqrt(&ctx);

        assert!(root.re.is_zero());
        assert!(root.im.eq_display(&Real::from_i64(3), &ctx));
    }

    #[test]
    fn integer_powers_are_exact() {
        let ctx = MathContext::default();

        assert!(real("-2").pow(&real("2"), &ctx).eq_display(&real("4"), &ctx));
        assert!(real("-2").pow(&real("3"), &ctx)
                          .eq_display(&real("-8"), &ctx));
        assert!(real("2").pow(&real("-2"), &ctx)
                         .eq_display(&real("0.25"), &ctx));
    }

    #[test]
    fn factorial_is_exact() {
        let ctx = MathContext::default();

        let f5 = real("5").factorial(&ctx).unwrap();
        assert!(f5.eq_display(&real("120"), &ctx));
        assert!(real("0").factorial(&ctx)
                         .unwrap()
                         .eq_display(&Scalar::one(), &ctx));
        assert!(real("-1").factorial(&ctx).is_none());
        assert!(real("2.5").factorial(&ctx).is_none());
    }

    #[test]
    fn polar_ordering() {
        let ctx = MathContext::default();

        // |3| < |4i|, and among equal moduli the argument decides
        assert_eq!(real("3").compare(&complex("0", "4"), &ctx), Some(Ordering::Less));
        assert_eq!(complex("0", "2").compare(&real("2"), &ctx),
                   Some(Ordering::Greater));
        assert_eq!(real("7").compare(&real("7"), &ctx), Some(Ordering::Equal));
        assert_eq!(Scalar::nan().compare(&real("1"), &ctx), None);
    }

    #[test]
    fn gamma_of_small_integers() {
        let ctx = MathContext::default();

        assert!(real("5").gamma(&ctx).eq_display(&real("24"), &ctx));
        assert_eq!(real("0").gamma(&ctx).re, Real::Inf(false));
    }
}
