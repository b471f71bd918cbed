//! Type-safe yen price representation using decimal arithmetic.
//!
//! Prices are whole yen in practice, but amounts are kept as [`Decimal`] so
//! that subtotals are exact and rounding only happens where a policy says so
//! (tax). A `Price` is never negative.
//!
//! # Serialization
//!
//! Prices serialize as plain JSON numbers (`1000.0`), matching the persisted
//! cart layout, and deserialization rejects negative amounts.
//!
//! # Bounds
//!
//! Amounts are capped at [`Price::MAX`] (2^53 - 1 yen), the largest integer a
//! JSON number carries exactly, so any whole-yen price survives a save and
//! reload unchanged. Arithmetic on prices saturates at the cap and never
//! panics; [`Price::checked_add`] and [`Price::checked_times`] report when the
//! cap would be crossed.

use core::fmt;
use core::iter::Sum;
use core::ops::Add;
use core::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Errors that can occur when constructing a [`Price`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// The amount is below zero.
    #[error("price cannot be negative (got {0})")]
    Negative(Decimal),
    /// The amount is above [`Price::MAX`].
    #[error("price exceeds the maximum of 9007199254740991 yen (got {0})")]
    TooLarge(Decimal),
    /// The input is not a decimal number.
    #[error("invalid price: {0}")]
    Invalid(String),
}

/// A non-negative amount of yen.
///
/// ## Examples
///
/// ```
/// use kago_core::Price;
///
/// let unit = Price::from_yen(1000);
/// assert_eq!(unit.times(3).to_string(), "¥3,000");
///
/// assert!("-1".parse::<Price>().is_err());
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Price(Decimal);

impl Price {
    /// Zero yen.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Largest representable amount, in whole yen.
    pub const MAX_YEN: u64 = (1 << 53) - 1;

    /// Largest representable price: 9,007,199,254,740,991 yen.
    pub const MAX: Self = Self(Decimal::from_parts(u32::MAX, (1 << 21) - 1, 0, false, 0));

    /// Create a price from a decimal amount.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::Negative`] if the amount is below zero and
    /// [`PriceError::TooLarge`] if it is above [`Price::MAX`].
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        if amount < Decimal::ZERO {
            return Err(PriceError::Negative(amount));
        }
        if amount > Self::MAX.0 {
            return Err(PriceError::TooLarge(amount));
        }
        Ok(Self(amount))
    }

    /// Create a price from a whole number of yen, clamped to [`Price::MAX`].
    #[must_use]
    pub fn from_yen(yen: u64) -> Self {
        Self(Decimal::from(yen.min(Self::MAX_YEN)))
    }

    /// Returns the underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Returns `true` if the amount is zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Add two prices, returning `None` above [`Price::MAX`].
    #[must_use]
    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).and_then(Self::bounded)
    }

    /// Multiply by a quantity, returning `None` above [`Price::MAX`].
    #[must_use]
    pub fn checked_times(self, quantity: u32) -> Option<Self> {
        self.0
            .checked_mul(Decimal::from(quantity))
            .and_then(Self::bounded)
    }

    /// Multiply by a quantity, saturating at [`Price::MAX`]. No rounding is
    /// applied.
    #[must_use]
    pub fn times(self, quantity: u32) -> Self {
        self.checked_times(quantity).unwrap_or(Self::MAX)
    }

    /// Multiply by a non-negative rate (e.g., a tax rate), saturating at
    /// [`Price::MAX`].
    ///
    /// Callers guarantee `rate >= 0`; [`crate::PricingPolicy`] validates its
    /// rate on construction.
    #[must_use]
    pub(crate) fn scaled_by(self, rate: Decimal) -> Self {
        self.0
            .checked_mul(rate)
            .and_then(Self::bounded)
            .unwrap_or(Self::MAX)
    }

    fn bounded(amount: Decimal) -> Option<Self> {
        (amount <= Self::MAX.0).then_some(Self(amount))
    }

    /// Round to the nearest whole yen, halves rounding up.
    #[must_use]
    pub fn round_half_up(self) -> Self {
        Self(
            self.0
                .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero),
        )
    }
}

impl Add for Price {
    type Output = Self;

    /// Saturates at [`Price::MAX`].
    fn add(self, rhs: Self) -> Self::Output {
        self.checked_add(rhs).unwrap_or(Self::MAX)
    }
}

impl Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl TryFrom<Decimal> for Price {
    type Error = PriceError;

    fn try_from(amount: Decimal) -> Result<Self, Self::Error> {
        Self::new(amount)
    }
}

impl FromStr for Price {
    type Err = PriceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let amount = s
            .trim()
            .parse::<Decimal>()
            .map_err(|e| PriceError::Invalid(e.to_string()))?;
        Self::new(amount)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let amount = self.0.normalize();
        let whole = amount.trunc();
        let fraction = amount - whole;

        write!(f, "¥{}", group_thousands(&whole.to_string()))?;
        if !fraction.is_zero() {
            // "0.5" -> ".5"
            f.write_str(fraction.to_string().trim_start_matches('0'))?;
        }
        Ok(())
    }
}

impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        rust_decimal::serde::float::serialize(&self.0, serializer)
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let amount = rust_decimal::serde::float::deserialize(deserializer)?;
        Self::new(amount).map_err(serde::de::Error::custom)
    }
}

/// Insert `,` separators every three digits.
fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_negative() {
        assert!(matches!(
            Price::new(Decimal::new(-1, 0)),
            Err(PriceError::Negative(_))
        ));
        assert!(Price::new(Decimal::ZERO).is_ok());
    }

    #[test]
    fn test_parse() {
        assert_eq!("1000".parse::<Price>().unwrap(), Price::from_yen(1000));
        assert!(matches!(
            "abc".parse::<Price>(),
            Err(PriceError::Invalid(_))
        ));
        assert!(matches!("-5".parse::<Price>(), Err(PriceError::Negative(_))));
    }

    #[test]
    fn test_display_groups_thousands() {
        assert_eq!(Price::ZERO.to_string(), "¥0");
        assert_eq!(Price::from_yen(500).to_string(), "¥500");
        assert_eq!(Price::from_yen(1600).to_string(), "¥1,600");
        assert_eq!(Price::from_yen(1_234_567).to_string(), "¥1,234,567");
    }

    #[test]
    fn test_display_keeps_fraction() {
        let price = Price::new(Decimal::new(10005, 1)).unwrap();
        assert_eq!(price.to_string(), "¥1,000.5");
    }

    #[test]
    fn test_round_half_up() {
        let half = Price::new(Decimal::new(1005, 1)).unwrap(); // 100.5
        assert_eq!(half.round_half_up(), Price::from_yen(101));

        let below = Price::new(Decimal::new(1004, 1)).unwrap(); // 100.4
        assert_eq!(below.round_half_up(), Price::from_yen(100));
    }

    #[test]
    fn test_sum_and_times() {
        let total: Price = [Price::from_yen(1000).times(2), Price::from_yen(250)]
            .into_iter()
            .sum();
        assert_eq!(total, Price::from_yen(2250));
    }

    #[test]
    fn test_serializes_as_number() {
        let json = serde_json::to_value(Price::from_yen(1000)).unwrap();
        assert!(json.is_number());

        let parsed: Price = serde_json::from_str("1000").unwrap();
        assert_eq!(parsed, Price::from_yen(1000));
    }

    #[test]
    fn test_deserialize_rejects_negative() {
        assert!(serde_json::from_str::<Price>("-10").is_err());
    }

    #[test]
    fn test_max_is_two_pow_53_minus_one() {
        assert_eq!(Price::MAX.amount(), Decimal::from(9_007_199_254_740_991_u64));
        assert_eq!(Price::from_yen(Price::MAX_YEN), Price::MAX);
        assert_eq!(Price::from_yen(u64::MAX), Price::MAX);
    }

    #[test]
    fn test_rejects_amounts_above_max() {
        assert!(matches!(
            "79228162514264337593543950335".parse::<Price>(),
            Err(PriceError::TooLarge(_))
        ));
        assert!(matches!(
            Price::new(Price::MAX.amount() + Decimal::ONE),
            Err(PriceError::TooLarge(_))
        ));
        assert!(serde_json::from_str::<Price>("12345678901234567").is_err());
    }

    #[test]
    fn test_max_round_trips_exactly() {
        let json = serde_json::to_string(&Price::MAX).unwrap();
        assert_eq!(serde_json::from_str::<Price>(&json).unwrap(), Price::MAX);

        let price = Price::from_yen(1_234_567_890_123_456);
        let json = serde_json::to_string(&price).unwrap();
        assert_eq!(serde_json::from_str::<Price>(&json).unwrap(), price);
    }

    #[test]
    fn test_arithmetic_saturates_instead_of_panicking() {
        let huge = Price::MAX;
        assert_eq!(huge.times(u32::MAX), Price::MAX);
        assert_eq!(huge + huge, Price::MAX);
        assert_eq!(
            huge.scaled_by(Decimal::new(10, 2)),
            Price::new(Decimal::new(9_007_199_254_740_991, 1)).unwrap()
        );
        assert_eq!(huge.scaled_by(Decimal::MAX), Price::MAX);

        let total: Price = [huge, huge, Price::from_yen(1)].into_iter().sum();
        assert_eq!(total, Price::MAX);
    }

    #[test]
    fn test_checked_arithmetic_reports_overflow() {
        assert_eq!(Price::MAX.checked_add(Price::from_yen(1)), None);
        assert_eq!(Price::MAX.checked_add(Price::ZERO), Some(Price::MAX));
        assert_eq!(
            Price::from_yen(2).checked_times(u32::MAX),
            Some(Price::from_yen(8_589_934_590))
        );
        assert_eq!(Price::MAX.checked_times(2), None);
    }
}
