//! Fixed-point stablecoin amounts.
//!
//! An [`Amount`] is a scaled `i128` with [`Amount::DECIMALS`] fractional
//! digits (`1.0` == `10_000_000` raw). Arithmetic is checked and never goes
//! through floating point, so every host computes identical results.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Scaled-integer amount of the settlement stablecoin.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize,
)]
pub struct Amount(i128);

impl Amount {
    /// Number of fractional decimal digits.
    pub const DECIMALS: u32 = 7;
    /// Raw units per whole token.
    pub const SCALE: i128 = 10_000_000;
    pub const ZERO: Self = Self(0);

    /// Wrap a raw scaled value.
    #[must_use]
    pub const fn from_raw(raw: i128) -> Self {
        Self(raw)
    }

    /// Whole token units, e.g. `from_units(1000)` is 1000.0000000.
    #[must_use]
    pub const fn from_units(units: i64) -> Self {
        Self(units as i128 * Self::SCALE)
    }

    #[must_use]
    pub const fn raw(self) -> i128 {
        self.0
    }

    #[must_use]
    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    #[must_use]
    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Self)
    }

    #[must_use]
    pub fn checked_sub(self, rhs: Self) -> Option<Self> {
        self.0.checked_sub(rhs.0).map(Self)
    }

    /// `self * numerator / denominator`, truncating toward zero.
    ///
    /// The product is accumulated in `i128`; `None` on overflow or a zero
    /// denominator.
    #[must_use]
    pub fn checked_mul_div(self, numerator: i128, denominator: i128) -> Option<Self> {
        if denominator == 0 {
            return None;
        }
        self.0
            .checked_mul(numerator)
            .and_then(|product| product.checked_div(denominator))
            .map(Self)
    }

    /// Human-readable decimal value, `None` if it exceeds 96 bits of mantissa.
    #[must_use]
    pub fn to_decimal(self) -> Option<Decimal> {
        Decimal::try_from_i128_with_scale(self.0, Self::DECIMALS)
            .ok()
            .map(|d| d.normalize())
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_decimal() {
            Some(value) => write!(f, "{value}"),
            None => write!(f, "{}e-{}", self.0, Self::DECIMALS),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_units_scales() {
        assert_eq!(Amount::from_units(1).raw(), 10_000_000);
        assert_eq!(Amount::from_units(1000).raw(), 10_000_000_000);
    }

    #[test]
    fn display_is_normalized() {
        assert_eq!(Amount::from_units(1050).to_string(), "1050");
        assert_eq!(Amount::from_raw(15_000_000).to_string(), "1.5");
        assert_eq!(Amount::from_raw(1).to_string(), "0.0000001");
    }

    #[test]
    fn mul_div_truncates_toward_zero() {
        let a = Amount::from_raw(10);
        assert_eq!(a.checked_mul_div(1, 3), Some(Amount::from_raw(3)));
        let neg = Amount::from_raw(-10);
        assert_eq!(neg.checked_mul_div(1, 3), Some(Amount::from_raw(-3)));
    }

    #[test]
    fn mul_div_overflow_and_zero_denominator() {
        assert_eq!(Amount::from_raw(i128::MAX).checked_mul_div(2, 1), None);
        assert_eq!(Amount::from_units(1).checked_mul_div(1, 0), None);
    }

    #[test]
    fn checked_add_overflow() {
        assert_eq!(Amount::from_raw(i128::MAX).checked_add(Amount::from_raw(1)), None);
        assert_eq!(
            Amount::from_units(2).checked_sub(Amount::from_units(3)),
            Some(Amount::from_units(-1))
        );
    }

    #[test]
    fn huge_amount_display_falls_back() {
        let huge = Amount::from_raw(i128::MAX);
        assert!(huge.to_decimal().is_none());
        assert!(huge.to_string().ends_with("e-7"));
    }

    #[test]
    fn serde_roundtrip() {
        let a = Amount::from_raw(123_456_789);
        let json = serde_json::to_string(&a).unwrap();
        let back: Amount = serde_json::from_str(&json).unwrap();
        assert_eq!(a, back);
    }
}
