//! Monetary amount of a sale, using decimal arithmetic.

use core::fmt;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Errors that can occur when constructing an [`Amount`].
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmountError {
    /// The value is below zero.
    #[error("amount cannot be negative")]
    Negative,
    /// The value does not fit the `NUMERIC(14,2)` column.
    #[error("amount cannot exceed {}", Amount::MAX)]
    TooLarge,
}

/// A non-negative amount in reais, always held at two decimal places.
///
/// Construction rounds half away from zero, so `10.005` becomes `10.01`.
/// On the wire the amount is a JSON number; on input a numeric string is
/// accepted too.
///
/// ```
/// use gestao_vendas_core::Amount;
/// use rust_decimal::Decimal;
///
/// let amount = Amount::new(Decimal::new(1_500_555, 3)).unwrap();
/// assert_eq!(amount.value(), Decimal::new(150_056, 2));
/// assert!(Amount::new(Decimal::new(-1, 0)).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "Decimal")]
pub struct Amount(#[serde(serialize_with = "rust_decimal::serde::float::serialize")] Decimal);

impl Amount {
    /// Zero reais.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Largest storable amount, 999 999 999 999.99.
    pub const MAX: Self = Self(Decimal::from_parts(276_447_231, 23_283, 0, false, 2));

    /// Number of decimal places kept.
    pub const SCALE: u32 = 2;

    /// Round `value` to two places and wrap it.
    ///
    /// # Errors
    ///
    /// Returns [`AmountError::Negative`] if the rounded value is below zero
    /// and [`AmountError::TooLarge`] if it is above [`Amount::MAX`].
    pub fn new(value: Decimal) -> Result<Self, AmountError> {
        let rounded = value.round_dp_with_strategy(Self::SCALE, RoundingStrategy::MidpointAwayFromZero);
        if rounded.is_sign_negative() && !rounded.is_zero() {
            return Err(AmountError::Negative);
        }
        if rounded > Self::MAX.0 {
            return Err(AmountError::TooLarge);
        }
        Ok(Self(rounded.abs()))
    }

    /// Returns the rounded decimal value.
    #[must_use]
    pub const fn value(&self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = AmountError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Amount {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <Decimal as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <Decimal as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Amount {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let value = <Decimal as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self::new(value)?)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Amount {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <Decimal as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use core::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_rounds_half_away_from_zero() {
        assert_eq!(Amount::new(dec("10.005")).unwrap().value(), dec("10.01"));
        assert_eq!(Amount::new(dec("10.004")).unwrap().value(), dec("10.00"));
        assert_eq!(Amount::new(dec("99.999")).unwrap().value(), dec("100.00"));
        assert_eq!(Amount::new(dec("1500")).unwrap().value(), dec("1500"));
    }

    #[test]
    fn test_rejects_negative() {
        assert_eq!(Amount::new(dec("-0.01")), Err(AmountError::Negative));
        assert_eq!(Amount::new(dec("-10")), Err(AmountError::Negative));
    }

    #[test]
    fn test_upper_bound_matches_column() {
        assert_eq!(Amount::MAX.value(), dec("999999999999.99"));
        assert_eq!(Amount::new(dec("999999999999.99")).unwrap(), Amount::MAX);
        assert_eq!(Amount::new(dec("999999999999.995")), Err(AmountError::TooLarge));
        assert_eq!(Amount::new(dec("10000000000000")), Err(AmountError::TooLarge));
    }

    #[test]
    fn test_tiny_negative_rounds_to_zero() {
        assert_eq!(Amount::new(dec("-0.001")).unwrap(), Amount::ZERO);
    }

    #[test]
    fn test_deserializes_number_and_string() {
        let from_number: Amount = serde_json::from_str("1500.555").unwrap();
        assert_eq!(from_number.value(), dec("1500.56"));

        let from_string: Amount = serde_json::from_str("\"89.9\"").unwrap();
        assert_eq!(from_string.value(), dec("89.90"));

        assert!(serde_json::from_str::<Amount>("-5").is_err());
    }

    #[test]
    fn test_serializes_as_number() {
        let amount = Amount::new(dec("129.90")).unwrap();
        assert_eq!(serde_json::to_string(&amount).unwrap(), "129.9");
    }

    #[test]
    fn test_display_two_places() {
        assert_eq!(Amount::new(dec("7")).unwrap().to_string(), "7.00");
    }
}
