//! Token amounts
//!
//! All ledger arithmetic goes through the checked helpers so that an
//! overflow surfaces as a [`LedgerError::Overflow`] instead of wrapping.

use crate::{LedgerError, LedgerResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Non-negative token quantity in the token's smallest unit
///
/// Serialized as a decimal string so the full `u128` range survives
/// self-describing formats. Plain integers up to `u64::MAX` are also
/// accepted on input.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount(pub u128);

impl Amount {
    pub const ZERO: Amount = Amount(0);

    pub fn new(value: u128) -> Self {
        Self(value)
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(Self)
    }

    pub fn checked_sub(self, other: Self) -> Option<Self> {
        self.0.checked_sub(other.0).map(Self)
    }

    pub fn saturating_add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }

    pub fn saturating_sub(self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0))
    }

    /// Add, reporting overflow against `context`.
    pub fn try_add(self, other: Self, context: &'static str) -> LedgerResult<Self> {
        self.checked_add(other).ok_or(LedgerError::Overflow(context))
    }

    /// Subtract, reporting an insufficient balance when `other > self`.
    pub fn try_sub(self, other: Self) -> LedgerResult<Self> {
        self.checked_sub(other)
            .ok_or(LedgerError::InsufficientBalance {
                required: other,
                available: self,
            })
    }

    /// `self * numerator / denominator`, computed without intermediate overflow
    /// for any `numerator <= denominator <= 100`.
    pub fn mul_div(self, numerator: u128, denominator: u128) -> Self {
        if denominator == 0 {
            return Self::ZERO;
        }
        let whole = self.0 / denominator;
        let rem = self.0 % denominator;
        Self(
            whole
                .saturating_mul(numerator)
                .saturating_add(rem.saturating_mul(numerator) / denominator),
        )
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u128> for Amount {
    fn from(value: u128) -> Self {
        Self(value)
    }
}

impl Serialize for Amount {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.0)
    }
}

struct AmountVisitor;

impl serde::de::Visitor<'_> for AmountVisitor {
    type Value = Amount;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a decimal string or non-negative integer")
    }

    fn visit_str<E: serde::de::Error>(self, v: &str) -> Result<Amount, E> {
        v.parse::<u128>()
            .map(Amount)
            .map_err(|_| E::invalid_value(serde::de::Unexpected::Str(v), &self))
    }

    fn visit_u64<E: serde::de::Error>(self, v: u64) -> Result<Amount, E> {
        Ok(Amount(u128::from(v)))
    }

    fn visit_u128<E: serde::de::Error>(self, v: u128) -> Result<Amount, E> {
        Ok(Amount(v))
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(AmountVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checked_arithmetic() {
        let a = Amount::new(1000);
        let b = Amount::new(300);
        assert_eq!(a.checked_add(b), Some(Amount::new(1300)));
        assert_eq!(a.checked_sub(b), Some(Amount::new(700)));
        assert_eq!(b.checked_sub(a), None);
        assert_eq!(Amount::new(u128::MAX).checked_add(Amount::new(1)), None);
    }

    #[test]
    fn test_try_ops() {
        let err = Amount::new(u128::MAX)
            .try_add(Amount::new(1), "allocated")
            .unwrap_err();
        assert_eq!(err, LedgerError::Overflow("allocated"));

        let err = Amount::new(5).try_sub(Amount::new(6)).unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientBalance { .. }));
    }

    #[test]
    fn test_mul_div() {
        assert_eq!(Amount::new(1_000_000).mul_div(4, 100), Amount::new(40_000));
        assert_eq!(Amount::new(99).mul_div(50, 100), Amount::new(49));
        assert_eq!(Amount::new(u128::MAX).mul_div(100, 100), Amount::new(u128::MAX));
        assert_eq!(Amount::new(10).mul_div(1, 0), Amount::ZERO);
    }

    #[test]
    fn test_serde_decimal_string() {
        let json = serde_json::to_string(&Amount::new(u128::MAX)).unwrap();
        assert_eq!(json, format!("\"{}\"", u128::MAX));
        let back: Amount = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Amount::new(u128::MAX));

        let plain: Amount = serde_json::from_str("1000").unwrap();
        assert_eq!(plain, Amount::new(1_000));
        assert!(serde_json::from_str::<Amount>("\"-1\"").is_err());
        assert!(serde_json::from_str::<Amount>("-1").is_err());
    }

    #[test]
    fn test_zero() {
        assert!(Amount::ZERO.is_zero());
        assert!(!Amount::new(1).is_zero());
        assert_eq!(format!("{}", Amount::new(42)), "42");
    }
}
