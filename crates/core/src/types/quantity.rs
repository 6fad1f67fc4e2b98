//! Cart line quantities.
//!
//! Shoppers type quantities into free-form inputs, so parsing is lenient about
//! locale formatting while [`Quantity`] itself only ever holds a value that can
//! be persisted on a cart line.

use core::fmt;
use core::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing or constructing a [`Quantity`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum QuantityError {
    /// The input string is empty (after trimming).
    #[error("quantity cannot be empty")]
    Empty,
    /// The input is not a number in any supported notation.
    #[error("quantity is not a number: {0:?}")]
    NotANumber(String),
    /// The value is zero or negative.
    #[error("quantity must be greater than zero (got {0})")]
    NotPositive(Decimal),
}

/// Parse a requested quantity as typed by a shopper.
///
/// Accepts plain decimals (`"3"`, `"2.5"`), a comma as the decimal separator
/// when it is the only separator (`"2,5"`), and commas as thousands separators
/// when a dot is present or commas repeat (`"1,000.5"`, `"1,000,000"`).
/// Surrounding whitespace is ignored. The result may be zero or negative;
/// clamping is the caller's concern.
///
/// # Errors
///
/// Returns [`QuantityError::Empty`] for blank input and
/// [`QuantityError::NotANumber`] when the text is not numeric.
///
/// # Example
///
/// ```
/// use cartkeeper_core::parse_decimal;
/// use rust_decimal::Decimal;
///
/// assert_eq!(parse_decimal(" 2,5 ").unwrap(), Decimal::new(25, 1));
/// assert_eq!(parse_decimal("1,000.5").unwrap(), Decimal::new(10005, 1));
/// assert!(parse_decimal("two").is_err());
/// ```
pub fn parse_decimal(input: &str) -> Result<Decimal, QuantityError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(QuantityError::Empty);
    }

    let commas = trimmed.matches(',').count();
    let normalized = if commas == 0 {
        trimmed.to_owned()
    } else if commas == 1 && !trimmed.contains('.') {
        trimmed.replace(',', ".")
    } else {
        trimmed.replace(',', "")
    };

    Decimal::from_str(&normalized).map_err(|_| QuantityError::NotANumber(input.to_owned()))
}

/// A strictly positive cart line quantity.
///
/// Products sold by weight or length may carry fractional quantities, so the
/// value is a [`Decimal`] rather than an integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Quantity(Decimal);

impl Quantity {
    /// A quantity of one.
    pub const ONE: Self = Self(Decimal::ONE);

    /// Decimal places a stored cart line quantity keeps.
    pub const SCALE: u32 = 4;

    /// Largest quantity a cart line can store, `99999999.9999`.
    pub const MAX: Self = Self(Decimal::from_parts(0xD4A5_0FFF, 0xE8, 0, false, Self::SCALE));

    /// Create a quantity from a decimal value.
    ///
    /// # Errors
    ///
    /// Returns [`QuantityError::NotPositive`] if `value` is zero or negative.
    pub fn new(value: Decimal) -> Result<Self, QuantityError> {
        if value <= Decimal::ZERO {
            return Err(QuantityError::NotPositive(value));
        }
        Ok(Self(value))
    }

    /// Returns the quantity as a decimal.
    #[must_use]
    pub const fn as_decimal(&self) -> Decimal {
        self.0
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.normalize())
    }
}

impl FromStr for Quantity {
    type Err = QuantityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(parse_decimal(s)?)
    }
}

impl TryFrom<Decimal> for Quantity {
    type Error = QuantityError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Quantity> for Decimal {
    fn from(quantity: Quantity) -> Self {
        quantity.0
    }
}

// SQLx support (with postgres feature)
#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Quantity {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <Decimal as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <Decimal as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Quantity {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let value = <Decimal as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self::new(value)?)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Quantity {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <Decimal as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}
