use std::{cell::OnceCell, cmp::Ordering, num::NonZeroU64, str::FromStr};

use bigdecimal::{num_bigint::BigInt, BigDecimal, One, RoundingMode, ToPrimitive, Zero};

/// Default working precision in significant digits.
pub const DEFAULT_PRECISION: u64 = 336;
/// Width of the guard band subtracted from the working precision to obtain
/// the display precision used for comparison and rendering.
pub const GUARD_DIGITS: u64 = 7;
/// Adjusted exponent at and below which rendering switches to scientific
/// notation.
pub const EXP_NEGATIVE: i64 = -7;
/// Adjusted exponent at and above which rendering switches to scientific
/// notation.
pub const EXP_POSITIVE: i64 = 20;

/// Instance-scoped configuration of the numeric kernel.
///
/// Every arithmetic operation rounds through this context, so two evaluators
/// with different contexts can coexist in one process. The context also
/// caches the transcendental constants (π, ln 2, ln 10, e) the kernel
/// derives on first use.
#[derive(Debug, Clone)]
pub struct MathContext {
    precision: NonZeroU64,
    rounding:  RoundingMode,
    pub(crate) consts: ConstCache,
}

/// Lazily-computed constants shared by the kernel functions.
#[derive(Debug, Clone, Default)]
pub(crate) struct ConstCache {
    pub(crate) pi:   OnceCell<BigDecimal>,
    pub(crate) ln2:  OnceCell<BigDecimal>,
    pub(crate) ln10: OnceCell<BigDecimal>,
    pub(crate) e:    OnceCell<BigDecimal>,
}

impl Default for MathContext {
    fn default() -> Self {
        Self::new(DEFAULT_PRECISION)
    }
}

impl MathContext {
    /// Creates a context with the given working precision, half-down
    /// rounding, and an empty constant cache.
    #[must_use]
    pub fn new(precision: u64) -> Self {
        Self { precision: NonZeroU64::new(precision.max(GUARD_DIGITS + 1)).unwrap_or(NonZeroU64::MIN),
               rounding:  RoundingMode::HalfDown,
               consts:    ConstCache::default(), }
    }

    /// The working precision in significant digits.
    #[must_use]
    pub const fn precision(&self) -> u64 {
        self.precision.get()
    }

    /// The display precision: working precision minus the guard band.
    #[must_use]
    pub const fn display_precision(&self) -> u64 {
        self.precision.get() - GUARD_DIGITS
    }

    /// Rounds a decimal to the working precision.
    #[must_use]
    pub fn round(&self, d: &BigDecimal) -> BigDecimal {
        d.with_precision_round(self.precision, self.rounding)
    }

    /// Rounds a decimal to the display precision.
    #[must_use]
    pub fn round_display(&self, d: &BigDecimal) -> BigDecimal {
        let prec = NonZeroU64::new(self.display_precision()).unwrap_or(NonZeroU64::MIN);
        d.with_precision_round(prec, self.rounding)
    }

    /// Adds two decimals under this context.
    #[must_use]
    pub fn add(&self, a: &BigDecimal, b: &BigDecimal) -> BigDecimal {
        self.round(&(a + b))
    }

    /// Subtracts two decimals under this context.
    #[must_use]
    pub fn sub(&self, a: &BigDecimal, b: &BigDecimal) -> BigDecimal {
        self.round(&(a - b))
    }

    /// Multiplies two decimals under this context.
    #[must_use]
    pub fn mul(&self, a: &BigDecimal, b: &BigDecimal) -> BigDecimal {
        self.round(&(a * b))
    }

    /// Divides two decimals under this context.
    ///
    /// The quotient is produced from scaled `BigInt` division so that it
    /// carries the full working precision plus a one-digit guard, then is
    /// rounded through the context. The divisor must be non-zero; callers
    /// handle the zero-divisor cases on the extended reals.
    #[must_use]
    pub fn div(&self, a: &BigDecimal, b: &BigDecimal) -> BigDecimal {
        if a.is_zero() {
            return BigDecimal::zero();
        }

        let a = a.normalized();
        let b = b.normalized();
        let a_digits = i64::try_from(a.digits()).unwrap_or(i64::MAX);
        let b_digits = i64::try_from(b.digits()).unwrap_or(i64::MAX);

        let (a_int, a_scale) = a.into_bigint_and_exponent();
        let (b_int, b_scale) = b.into_bigint_and_exponent();

        let prec = i64::try_from(self.precision.get()).unwrap_or(i64::MAX);
        let shift = (prec + 1 + b_digits - a_digits).max(0);

        let numerator = a_int * pow10(u64::try_from(shift).unwrap_or(0));
        let quotient = numerator / b_int;

        self.round(&BigDecimal::new(quotient, a_scale - b_scale + shift))
    }

    /// `true` when two decimals are equal after rounding both to the display
    /// precision.
    #[must_use]
    pub fn eq_display(&self, a: &BigDecimal, b: &BigDecimal) -> bool {
        self.round_display(a) == self.round_display(b)
    }
}

/// Returns `10^k` as a `BigInt`.
pub(crate) fn pow10(k: u64) -> BigInt {
    BigInt::from(10).pow(u32::try_from(k).unwrap_or(u32::MAX))
}

/// `true` when a decimal has no fractional part (non-positive scale after
/// normalization).
fn decimal_is_integer(d: &BigDecimal) -> bool {
    let (_, scale) = d.normalized().into_bigint_and_exponent();
    scale <= 0
}

/// An arbitrary-precision real extended with the two infinities and `NaN`.
///
/// `BigDecimal` has no non-finite values, so the kernel's division-by-zero
/// and propagation rules live on this wrapper. The `bool` carried by `Inf`
/// is the sign: `true` is negative.
#[derive(Debug, Clone, PartialEq)]
pub enum Real {
    /// A finite decimal.
    Num(BigDecimal),
    /// Positive (`false`) or negative (`true`) infinity.
    Inf(bool),
    /// Not a number.
    Nan,
}

impl Real {
    /// The additive identity.
    #[must_use]
    pub fn zero() -> Self {
        Self::Num(BigDecimal::zero())
    }

    /// The multiplicative identity.
    #[must_use]
    pub fn one() -> Self {
        Self::Num(BigDecimal::one())
    }

    /// Builds a real from an `i64`.
    #[must_use]
    pub fn from_i64(value: i64) -> Self {
        Self::Num(BigDecimal::from(value))
    }

    /// Builds a real from a `usize`.
    #[must_use]
    pub fn from_usize(value: usize) -> Self {
        Self::Num(BigDecimal::from(u64::try_from(value).unwrap_or(u64::MAX)))
    }

    /// Parses a decimal literal such as `3.25` or `1.2e-5`.
    ///
    /// # Example
    /// ```
    /// use octava::interpreter::value::real::Real;
    ///
    /// assert!(Real::from_literal("2.5").is_some());
    /// assert!(Real::from_literal("abc").is_none());
    /// ```
    #[must_use]
    pub fn from_literal(text: &str) -> Option<Self> {
        BigDecimal::from_str(text).ok().map(Self::Num)
    }

    /// Returns `true` for `NaN`.
    #[must_use]
    pub const fn is_nan(&self) -> bool {
        matches!(self, Self::Nan)
    }

    /// Returns `true` for finite values.
    #[must_use]
    pub const fn is_finite(&self) -> bool {
        matches!(self, Self::Num(_))
    }

    /// Returns `true` for finite zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        matches!(self, Self::Num(d) if d.is_zero())
    }

    /// Returns `true` for negative finite values and negative infinity.
    #[must_use]
    pub fn is_negative(&self) -> bool {
        match self {
            Self::Num(d) => d < &BigDecimal::zero(),
            Self::Inf(negative) => *negative,
            Self::Nan => false,
        }
    }

    /// Returns `true` for finite values with no fractional part.
    #[must_use]
    pub fn is_integer(&self) -> bool {
        matches!(self, Self::Num(d) if decimal_is_integer(d))
    }

    /// Borrows the finite decimal, if any.
    #[must_use]
    pub const fn as_decimal(&self) -> Option<&BigDecimal> {
        match self {
            Self::Num(d) => Some(d),
            _ => None,
        }
    }

    /// Negates the value.
    #[must_use]
    pub fn neg(&self) -> Self {
        match self {
            Self::Num(d) => Self::Num(-d),
            Self::Inf(negative) => Self::Inf(!negative),
            Self::Nan => Self::Nan,
        }
    }

    /// The absolute value.
    #[must_use]
    pub fn abs(&self) -> Self {
        match self {
            Self::Num(d) => Self::Num(d.abs()),
            Self::Inf(_) => Self::Inf(false),
            Self::Nan => Self::Nan,
        }
    }

    /// Adds two extended reals: `∞ + (−∞)` is `NaN`, infinities absorb
    /// finite addends, `NaN` propagates.
    #[must_use]
    pub fn add(&self, other: &Self, ctx: &MathContext) -> Self {
        match (self, other) {
            (Self::Nan, _) | (_, Self::Nan) => Self::Nan,
            (Self::Inf(a), Self::Inf(b)) => {
                if a == b {
                    Self::Inf(*a)
                } else {
                    Self::Nan
                }
            },
            (Self::Inf(a), Self::Num(_)) => Self::Inf(*a),
            (Self::Num(_), Self::Inf(b)) => Self::Inf(*b),
            (Self::Num(a), Self::Num(b)) => Self::Num(ctx.add(a, b)),
        }
    }

    /// Subtracts two extended reals.
    #[must_use]
    pub fn sub(&self, other: &Self, ctx: &MathContext) -> Self {
        self.add(&other.neg(), ctx)
    }

    /// Multiplies two extended reals: `0 × ∞` is `NaN`, signs combine,
    /// `NaN` propagates.
    #[must_use]
    pub fn mul(&self, other: &Self, ctx: &MathContext) -> Self {
        match (self, other) {
            (Self::Nan, _) | (_, Self::Nan) => Self::Nan,
            (Self::Inf(_), b) if b.is_zero() => Self::Nan,
            (a, Self::Inf(_)) if a.is_zero() => Self::Nan,
            (Self::Inf(_), _) | (_, Self::Inf(_)) => {
                Self::Inf(self.is_negative() != other.is_negative())
            },
            (Self::Num(a), Self::Num(b)) => Self::Num(ctx.mul(a, b)),
        }
    }

    /// Divides two extended reals.
    ///
    /// Division by zero yields an infinity following the sign of the
    /// numerator; `0 / 0` yields `NaN`; a finite value over an infinity
    /// yields zero; `∞ / ∞` yields `NaN`.
    ///
    /// # Example
    /// ```
    /// use octava::interpreter::value::real::{MathContext, Real};
    ///
    /// let ctx = MathContext::default();
    /// let one = Real::one();
    /// let zero = Real::zero();
    ///
    /// assert_eq!(one.div(&zero, &ctx), Real::Inf(false));
    /// assert_eq!(zero.div(&zero, &ctx), Real::Nan);
    /// ```
    #[must_use]
    pub fn div(&self, other: &Self, ctx: &MathContext) -> Self {
        match (self, other) {
            (Self::Nan, _) | (_, Self::Nan) | (Self::Inf(_), Self::Inf(_)) => Self::Nan,
            (Self::Num(_), Self::Inf(_)) => Self::zero(),
            (Self::Inf(_), Self::Num(_)) => {
                Self::Inf(self.is_negative() != other.is_negative())
            },
            (Self::Num(a), Self::Num(b)) => {
                if b.is_zero() {
                    if a.is_zero() {
                        Self::Nan
                    } else {
                        Self::Inf(self.is_negative())
                    }
                } else {
                    Self::Num(ctx.div(a, b))
                }
            },
        }
    }

    /// Compares two extended reals; `None` whenever `NaN` is involved.
    #[must_use]
    pub fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Self::Nan, _) | (_, Self::Nan) => None,
            (Self::Inf(a), Self::Inf(b)) => {
                if a == b {
                    Some(Ordering::Equal)
                } else if *a {
                    Some(Ordering::Less)
                } else {
                    Some(Ordering::Greater)
                }
            },
            (Self::Inf(negative), Self::Num(_)) => {
                Some(if *negative { Ordering::Less } else { Ordering::Greater })
            },
            (Self::Num(_), Self::Inf(negative)) => {
                Some(if *negative { Ordering::Greater } else { Ordering::Less })
            },
            (Self::Num(a), Self::Num(b)) => Some(a.cmp(b)),
        }
    }

    /// Tests equality at display precision (`NaN` is never equal, not even
    /// to itself).
    #[must_use]
    pub fn eq_display(&self, other: &Self, ctx: &MathContext) -> bool {
        match (self, other) {
            (Self::Num(a), Self::Num(b)) => ctx.eq_display(a, b),
            (Self::Inf(a), Self::Inf(b)) => a == b,
            _ => false,
        }
    }

    /// Rounds toward negative infinity.
    #[must_use]
    pub fn floor(&self) -> Self {
        self.to_integer(RoundingMode::Floor)
    }

    /// Rounds toward positive infinity.
    #[must_use]
    pub fn ceil(&self) -> Self {
        self.to_integer(RoundingMode::Ceiling)
    }

    /// Rounds to the nearest integer, halves away from zero.
    #[must_use]
    pub fn round_nearest(&self) -> Self {
        self.to_integer(RoundingMode::HalfUp)
    }

    /// Truncates toward zero.
    #[must_use]
    pub fn fix(&self) -> Self {
        self.to_integer(RoundingMode::Down)
    }

    fn to_integer(&self, mode: RoundingMode) -> Self {
        match self {
            Self::Num(d) => Self::Num(d.with_scale_round(0, mode)),
            other => other.clone(),
        }
    }

    /// Projects to `f64`, used only to seed iterative kernel routines.
    #[must_use]
    pub fn to_f64(&self) -> f64 {
        match self {
            Self::Num(d) => d.to_f64().unwrap_or(f64::NAN),
            Self::Inf(negative) => {
                if *negative {
                    f64::NEG_INFINITY
                } else {
                    f64::INFINITY
                }
            },
            Self::Nan => f64::NAN,
        }
    }

    /// Converts a finite integer value to `usize`, if representable.
    #[must_use]
    pub fn to_index(&self) -> Option<usize> {
        match self {
            Self::Num(d) if decimal_is_integer(d) => d.to_usize(),
            _ => None,
        }
    }

    /// Renders the value at display precision.
    ///
    /// Finite values use plain decimal notation between the scientific
    /// boundaries (adjusted exponent in `(-7, 20)`) and `m.mmme±XX`
    /// notation outside them. Trailing zeros are trimmed.
    ///
    /// # Example
    /// ```
    /// use octava::interpreter::value::real::{MathContext, Real};
    ///
    /// let ctx = MathContext::default();
    /// let x = Real::from_literal("0.0000001").unwrap();
    ///
    /// assert_eq!(x.to_display_string(&ctx), "1e-7");
    /// assert_eq!(Real::from_i64(14).to_display_string(&ctx), "14");
    /// ```
    #[must_use]
    pub fn to_display_string(&self, ctx: &MathContext) -> String {
        match self {
            Self::Nan => "NaN".to_string(),
            Self::Inf(negative) => {
                if *negative {
                    "-Inf".to_string()
                } else {
                    "Inf".to_string()
                }
            },
            Self::Num(d) => format_decimal(&ctx.round_display(d)),
        }
    }
}

/// Formats a finite decimal with the scientific-notation boundaries.
fn format_decimal(d: &BigDecimal) -> String {
    let d = d.normalized();
    if d.is_zero() {
        return "0".to_string();
    }

    let negative = d < BigDecimal::zero();
    let (int_part, scale) = d.abs().into_bigint_and_exponent();
    let digits = int_part.to_string();
    let ndigits = i64::try_from(digits.len()).unwrap_or(i64::MAX);
    let exponent = ndigits - 1 - scale;

    let body = if exponent <= EXP_NEGATIVE || exponent >= EXP_POSITIVE {
        let mantissa = if digits.len() > 1 {
            format!("{}.{}", &digits[..1], &digits[1..])
        } else {
            digits
        };
        if exponent < 0 {
            format!("{mantissa}e{exponent}")
        } else {
            format!("{mantissa}e+{exponent}")
        }
    } else if scale <= 0 {
        let zeros = usize::try_from(-scale).unwrap_or(0);
        format!("{}{}", digits, "0".repeat(zeros))
    } else if ndigits > scale {
        let split = usize::try_from(ndigits - scale).unwrap_or(0);
        format!("{}.{}", &digits[..split], &digits[split..])
    } else {
        let zeros = usize::try_from(scale - ndigits).unwrap_or(0);
        format!("0.{}{}", "0".repeat(zeros), digits)
    };

    if negative {
        format!("-{body}")
    } else {
        body
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn num(text: &str) -> Real {
        Real::from_literal(text).unwrap()
    }

    #[test]
    fn division_produces_extended_values() {
        let ctx = MathContext::default();

        assert_eq!(num("-3").div(&Real::zero(), &ctx), Real::Inf(true));
        assert_eq!(Real::zero().div(&Real::zero(), &ctx), Real::Nan);
        assert_eq!(num("5").div(&Real::Inf(false), &ctx), Real::zero());
        assert_eq!(Real::Inf(false).div(&num("-2"), &ctx), Real::Inf(true));
    }

    #[test]
    fn context_division_is_precise() {
        let ctx = MathContext::default();
        let third = ctx.div(&BigDecimal::from(1), &BigDecimal::from(3));
        let product = ctx.mul(&third, &BigDecimal::from(3));

        assert!(ctx.eq_display(&product, &BigDecimal::from(1)));
    }

    #[test]
    fn rendering_boundaries() {
        let ctx = MathContext::default();

        assert_eq!(num("0.000001").to_display_string(&ctx), "0.000001");
        assert_eq!(num("0.0000001").to_display_string(&ctx), "1e-7");
        assert_eq!(num("123.450").to_display_string(&ctx), "123.45");
        assert_eq!(num("1e20").to_display_string(&ctx), "1e+20");
        assert_eq!(num("-2.5e21").to_display_string(&ctx), "-2.5e+21");
        assert_eq!(Real::Inf(true).to_display_string(&ctx), "-Inf");
        assert_eq!(Real::Nan.to_display_string(&ctx), "NaN");
    }

    #[test]
    fn rounding_modes() {
        assert_eq!(num("2.5").round_nearest(), num("3"));
        assert_eq!(num("-2.5").round_nearest(), num("-3"));
        assert_eq!(num("-1.7").fix(), num("-1"));
        assert_eq!(num("-1.2").floor(), num("-2"));
    }
}
