//! # Material Quantities
//!
//! Decimal quantities for raw-material stock and recipe usage.
//!
//! ## Why Decimal?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Raw materials are counted in fractional units (0.25 kg, 1.5 l).        │
//! │                                                                         │
//! │  f64:     20.0 - 0.1 × 3 + 0.1 × 3  may not equal 20.0                  │
//! │  Decimal: 20 - 0.3 + 0.3 == 20 always                                   │
//! │                                                                         │
//! │  A sale followed by its void restores material stock exactly.           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Both [`MaterialQty`] and [`ConversionRate`] wrap a [`Decimal`] with at
//! most six decimal places. SQLite stores them as INTEGER millionths; the
//! conversion happens at the sqlx boundary, so a value must fit in an `i64`
//! of millionths to be stored.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Neg, Sub};
use std::str::FromStr;
use thiserror::Error;
use ts_rs::TS;

use crate::money::Money;

/// Decimal places kept by quantities and rates.
pub const DECIMALS: u32 = 6;

// =============================================================================
// Parse Error
// =============================================================================

/// Failure parsing or bounding a decimal quantity.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseQtyError {
    #[error("empty quantity")]
    Empty,
    #[error("invalid digit in {0:?}")]
    InvalidDigit(String),
    #[error("more than 6 decimal places in {0:?}")]
    TooPrecise(String),
    #[error("{0:?} is out of range")]
    Overflow(String),
}

/// Normalizes `value` and checks it is storable.
fn bounded(value: Decimal) -> Result<Decimal, ParseQtyError> {
    let value = value.normalize();
    if value.scale() > DECIMALS {
        return Err(ParseQtyError::TooPrecise(value.to_string()));
    }
    if to_millionths(value).is_none() {
        return Err(ParseQtyError::Overflow(value.to_string()));
    }
    Ok(value)
}

fn parse_bounded(input: &str) -> Result<Decimal, ParseQtyError> {
    let s = input.trim();
    if s.is_empty() {
        return Err(ParseQtyError::Empty);
    }
    let value =
        Decimal::from_str(s).map_err(|_| ParseQtyError::InvalidDigit(input.to_string()))?;
    bounded(value)
}

fn to_millionths(value: Decimal) -> Option<i64> {
    let mut scaled = value;
    scaled.rescale(DECIMALS);
    if scaled.scale() != DECIMALS {
        return None;
    }
    i64::try_from(scaled.mantissa()).ok()
}

fn from_millionths(millionths: i64) -> Decimal {
    Decimal::new(millionths, DECIMALS).normalize()
}

/// Keeps a product of two storable values storable, or gives up.
fn checked_product(a: Decimal, b: Decimal) -> Option<Decimal> {
    let product = a
        .checked_mul(b)?
        .round_dp_with_strategy(DECIMALS, RoundingStrategy::MidpointAwayFromZero);
    bounded(product).ok()
}

// =============================================================================
// Material Quantity
// =============================================================================

/// A raw-material quantity with up to six decimal places.
///
/// ## Example
/// ```rust
/// use warungin_core::quantity::MaterialQty;
///
/// let flour: MaterialQty = "2.50".parse().unwrap();
/// assert_eq!(flour.to_millionths(), Some(2_500_000));
/// assert_eq!(flour.to_string(), "2.5");
/// ```
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[serde(try_from = "Decimal", into = "Decimal")]
#[ts(export)]
pub struct MaterialQty(#[ts(type = "string")] Decimal);

impl MaterialQty {
    pub fn from_millionths(millionths: i64) -> Self {
        MaterialQty(from_millionths(millionths))
    }

    /// Whole units, e.g. `from_units(20)` is 20.
    pub fn from_units(units: i64) -> Self {
        MaterialQty(Decimal::from(units))
    }

    /// Storage form. `None` when the value no longer fits an `i64` of
    /// millionths.
    pub fn to_millionths(self) -> Option<i64> {
        to_millionths(self.0)
    }

    /// The largest storable quantity.
    pub fn max_value() -> Self {
        MaterialQty::from_millionths(i64::MAX)
    }

    #[inline]
    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    #[inline]
    pub const fn zero() -> Self {
        MaterialQty(Decimal::ZERO)
    }

    #[inline]
    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    #[inline]
    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }

    /// Converts a recipe quantity into stock units.
    ///
    /// Rounds half away from zero at the sixth decimal. `None` when the
    /// result is not storable.
    pub fn checked_times(self, rate: ConversionRate) -> Option<MaterialQty> {
        checked_product(self.0, rate.0).map(MaterialQty)
    }

    /// Multiplies by an item count. Exact, or `None` when not storable.
    pub fn checked_scale(self, count: i64) -> Option<MaterialQty> {
        checked_product(self.0, Decimal::from(count)).map(MaterialQty)
    }

    pub fn checked_add(self, other: MaterialQty) -> Option<MaterialQty> {
        self.0.checked_add(other.0).and_then(|sum| bounded(sum).ok()).map(MaterialQty)
    }

    /// How many whole `per_unit` portions fit in this quantity (floored).
    ///
    /// Returns `None` when `per_unit` is not positive. A negative stock yields a
    /// negative count.
    pub fn whole_multiples_of(self, per_unit: MaterialQty) -> Option<i64> {
        if !per_unit.is_positive() {
            return None;
        }
        self.0.checked_div(per_unit.0)?.floor().to_i64()
    }

    /// Value of this quantity at a per-unit price, rounded half away from
    /// zero to the cent. Saturates at the `i64` range.
    pub fn price_at(self, unit_price: Money) -> Money {
        let cents = self
            .0
            .checked_mul(Decimal::from(unit_price.cents()))
            .map(|v| v.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero))
            .and_then(|v| v.to_i64());
        Money::from_cents(cents.unwrap_or_else(|| {
            if self.is_negative() != unit_price.is_negative() {
                i64::MIN
            } else {
                i64::MAX
            }
        }))
    }
}

impl TryFrom<Decimal> for MaterialQty {
    type Error = ParseQtyError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        bounded(value).map(MaterialQty)
    }
}

impl From<MaterialQty> for Decimal {
    fn from(qty: MaterialQty) -> Self {
        qty.0
    }
}

impl fmt::Display for MaterialQty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.normalize())
    }
}

impl FromStr for MaterialQty {
    type Err = ParseQtyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_bounded(s).map(MaterialQty)
    }
}

impl Add for MaterialQty {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        MaterialQty((self.0 + other.0).normalize())
    }
}

impl AddAssign for MaterialQty {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        *self = *self + other;
    }
}

impl Sub for MaterialQty {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        MaterialQty((self.0 - other.0).normalize())
    }
}

impl Neg for MaterialQty {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        MaterialQty(-self.0)
    }
}

// =============================================================================
// Conversion Rate
// =============================================================================

/// Multiplier from a recipe's unit into the material's stock unit.
///
/// Stored values ≤ 0 mean "not configured" and behave as 1 via
/// [`ConversionRate::effective`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(try_from = "Decimal", into = "Decimal")]
#[ts(export)]
pub struct ConversionRate(#[ts(type = "string")] Decimal);

impl ConversionRate {
    /// Parts per million, e.g. `from_ppm(1_000)` is 0.001 (grams to kilograms).
    pub fn from_ppm(ppm: i64) -> Self {
        ConversionRate(from_millionths(ppm))
    }

    #[inline]
    pub const fn one() -> Self {
        ConversionRate(Decimal::ONE)
    }

    pub fn to_ppm(self) -> Option<i64> {
        to_millionths(self.0)
    }

    #[inline]
    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    /// The rate actually applied: one whenever the stored value is ≤ 0.
    #[inline]
    pub fn effective(self) -> Self {
        if self.0 <= Decimal::ZERO {
            ConversionRate::one()
        } else {
            self
        }
    }
}

impl Default for ConversionRate {
    fn default() -> Self {
        ConversionRate::one()
    }
}

impl TryFrom<Decimal> for ConversionRate {
    type Error = ParseQtyError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        bounded(value).map(ConversionRate)
    }
}

impl From<ConversionRate> for Decimal {
    fn from(rate: ConversionRate) -> Self {
        rate.0
    }
}

impl fmt::Display for ConversionRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.normalize())
    }
}

impl FromStr for ConversionRate {
    type Err = ParseQtyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_bounded(s).map(ConversionRate)
    }
}

// =============================================================================
// SQLite Columns (INTEGER millionths)
// =============================================================================

#[cfg(feature = "sqlx")]
mod sqlite_column {
    use super::{from_millionths, to_millionths, ConversionRate, MaterialQty, ParseQtyError};
    use sqlx::encode::IsNull;
    use sqlx::error::BoxDynError;
    use sqlx::sqlite::{Sqlite, SqliteTypeInfo};
    use sqlx::{Database, Decode, Encode, Type};

    macro_rules! millionths_column {
        ($ty:ident) => {
            impl Type<Sqlite> for $ty {
                fn type_info() -> SqliteTypeInfo {
                    <i64 as Type<Sqlite>>::type_info()
                }

                fn compatible(ty: &SqliteTypeInfo) -> bool {
                    <i64 as Type<Sqlite>>::compatible(ty)
                }
            }

            impl<'q> Encode<'q, Sqlite> for $ty {
                fn encode_by_ref(
                    &self,
                    buf: &mut <Sqlite as Database>::ArgumentBuffer<'q>,
                ) -> Result<IsNull, BoxDynError> {
                    let millionths = to_millionths(self.0)
                        .ok_or_else(|| ParseQtyError::Overflow(self.to_string()))?;
                    <i64 as Encode<'q, Sqlite>>::encode(millionths, buf)
                }
            }

            impl<'r> Decode<'r, Sqlite> for $ty {
                fn decode(value: <Sqlite as Database>::ValueRef<'r>) -> Result<Self, BoxDynError> {
                    let millionths = <i64 as Decode<'r, Sqlite>>::decode(value)?;
                    Ok($ty(from_millionths(millionths)))
                }
            }
        };
    }

    millionths_column!(MaterialQty);
    millionths_column!(ConversionRate);
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn qty(s: &str) -> MaterialQty {
        s.parse().unwrap()
    }

    #[test]
    fn test_parse_and_display() {
        assert_eq!(qty("20").to_millionths(), Some(20_000_000));
        assert_eq!(qty("0.25").to_millionths(), Some(250_000));
        assert_eq!(qty("-1.000001").to_millionths(), Some(-1_000_001));

        assert_eq!(qty("2.500").to_string(), "2.5");
        assert_eq!(qty("12").to_string(), "12");
        assert_eq!(qty("-0.75").to_string(), "-0.75");
        assert_eq!((qty("0.25") + qty("0.25")).to_string(), "0.5");
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!("".parse::<MaterialQty>(), Err(ParseQtyError::Empty));
        assert!(matches!(
            "1.2345678".parse::<MaterialQty>(),
            Err(ParseQtyError::TooPrecise(_))
        ));
        assert!(matches!(
            "1,5".parse::<MaterialQty>(),
            Err(ParseQtyError::InvalidDigit(_))
        ));
        assert!(matches!(
            "10000000000000".parse::<MaterialQty>(),
            Err(ParseQtyError::Overflow(_))
        ));
    }

    #[test]
    fn test_json_uses_decimal_strings() {
        let json = serde_json::to_string(&qty("0.25")).unwrap();
        assert_eq!(json, "\"0.25\"");
        let back: MaterialQty = serde_json::from_str("\"1.5\"").unwrap();
        assert_eq!(back, qty("1.5"));
        assert!(serde_json::from_str::<MaterialQty>("\"0.0000001\"").is_err());
    }

    #[test]
    fn test_conversion_rate_default_rule() {
        assert_eq!(ConversionRate::from_ppm(0).effective(), ConversionRate::one());
        assert_eq!(
            ConversionRate::from_ppm(-5).effective(),
            ConversionRate::one()
        );
        let rate: ConversionRate = "0.001".parse().unwrap();
        assert_eq!(rate.effective(), rate);
        assert_eq!(rate, ConversionRate::from_ppm(1_000));
    }

    #[test]
    fn test_times_conversion() {
        // 250 g per unit, stock counted in kg
        let grams = qty("250");
        let per_kg: ConversionRate = "0.001".parse().unwrap();
        assert_eq!(grams.checked_times(per_kg), Some(qty("0.25")));

        // 0.0000005 rounds away from zero
        let tiny = qty("0.000001").checked_times("0.5".parse().unwrap());
        assert_eq!(tiny, Some(qty("0.000001")));
    }

    #[test]
    fn test_out_of_range_products_are_refused() {
        let huge = MaterialQty::from_units(10_000_000_000);
        assert_eq!(huge.checked_scale(999), None);
        assert_eq!(huge.checked_times("1000000".parse().unwrap()), None);
        assert_eq!(MaterialQty::max_value().checked_add(qty("1")), None);
        assert_eq!(qty("2").checked_scale(-3), Some(qty("-6")));
    }

    #[test]
    fn test_whole_multiples_floor() {
        assert_eq!(qty("20").whole_multiples_of(qty("2")), Some(10));
        assert_eq!(qty("7").whole_multiples_of(qty("2")), Some(3));
        assert_eq!(qty("-1").whole_multiples_of(qty("2")), Some(-1));
        assert_eq!(qty("5").whole_multiples_of(MaterialQty::zero()), None);
        assert_eq!(qty("5").whole_multiples_of(MaterialQty::max_value()), Some(0));
    }

    #[test]
    fn test_deduct_then_restore_is_exact() {
        let start = qty("20");
        let usage = qty("0.1")
            .checked_times("3".parse().unwrap())
            .and_then(|u| u.checked_scale(7))
            .unwrap();
        let after = start + (-usage) + usage;
        assert_eq!(after, start);
    }

    #[test]
    fn test_price_at() {
        // 0.25 kg at 12.000 per kg
        let cost = qty("0.25").price_at(Money::from_cents(1_200_000));
        assert_eq!(cost.cents(), 300_000);
        assert_eq!(MaterialQty::max_value().price_at(Money::from_cents(10_000_000_000)).cents(), i64::MAX);
    }
}
