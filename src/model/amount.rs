//! Amount type for handling monetary values that arrive as numbers or loosely formatted strings.
//!
//! `Amount::coerce` is the one place where untrusted numeric input becomes a value. Anything that
//! cannot be read as a number becomes zero.

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::error::Error;
use std::fmt;
use std::fmt::{Debug, Display, Formatter};
use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub};
use std::str::FromStr;
use tracing::trace;

/// The currency sign used when displaying amounts.
const CURRENCY: char = '£';

/// The largest magnitude accepted from input, one trillion. Anything larger coerces to zero.
const MAX_AMOUNT: Decimal = Decimal::from_parts(0xD4A5_1000, 0xE8, 0, false, 0);

/// Represents an amount of money.
///
/// Parsing accepts an optional leading minus, an optional currency sign (`£` or `$`), and commas
/// as thousands separators. Values beyond one trillion are rejected. Display always uses the pound
/// sign and two decimals with commas. Arithmetic saturates instead of overflowing.
///
/// ```
/// # use client_ledger::model::Amount;
/// # use std::str::FromStr;
/// let amount = Amount::from_str("£1,250.5").unwrap();
/// assert_eq!(amount.to_string(), "£1,250.50");
/// assert_eq!(Amount::coerce("not a number").to_string(), "£0.00");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount(Decimal);

impl Amount {
    pub const ZERO: Amount = Amount(Decimal::ZERO);

    pub const fn new(value: Decimal) -> Self {
        Self(value)
    }

    /// The canonical numeric-parse step. Invalid or non-numeric input is treated as zero.
    pub fn coerce(s: &str) -> Self {
        match Amount::from_str(s) {
            Ok(amount) => amount,
            Err(e) => {
                trace!("Treating unparseable amount '{s}' as zero: {e}");
                Amount::ZERO
            }
        }
    }

    /// Converts a floating point number; non-finite or out of range values become zero.
    pub fn from_f64(value: f64) -> Self {
        Decimal::from_f64(value)
            .and_then(|v| Self::bounded(v).ok())
            .unwrap_or_default()
    }

    /// `value` as an amount, unless its magnitude exceeds `MAX_AMOUNT`.
    fn bounded(value: Decimal) -> Result<Self, AmountError> {
        if value > MAX_AMOUNT {
            return Err(AmountError(
                rust_decimal::Error::ExceedsMaximumPossibleValue,
            ));
        }
        if value < -MAX_AMOUNT {
            return Err(AmountError(
                rust_decimal::Error::LessThanMinimumPossibleValue,
            ));
        }
        Ok(Self(value))
    }

    /// Returns the underlying Decimal value.
    pub fn value(&self) -> Decimal {
        self.0
    }

    pub fn to_f64(&self) -> f64 {
        self.0.to_f64().unwrap_or_default()
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    /// Rounds to whole pence, half away from zero.
    pub fn round(&self) -> Self {
        Self(
            self.0
                .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero),
        )
    }

    /// Formats as a plain two-decimal number without sign or separators, e.g. `1250.50`.
    pub fn fixed(&self) -> String {
        format!("{:.2}", self.round().0)
    }
}

/// An error that can occur when parsing strings into `Decimal` values.
pub struct AmountError(rust_decimal::Error);

impl Debug for AmountError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Debug::fmt(&self.0, f)
    }
}

impl Display for AmountError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl std::error::Error for AmountError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.0)
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Ok(Amount::default());
        }

        let (negative, unsigned) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };
        let unsigned = unsigned
            .strip_prefix(CURRENCY)
            .or_else(|| unsigned.strip_prefix('$'))
            .unwrap_or(unsigned)
            .replace(',', "");

        let value = Decimal::from_str(unsigned.trim()).map_err(AmountError)?;
        Amount::bounded(if negative { -value } else { value })
    }
}

impl Display for Amount {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let rounded = self.round();
        let sign = if rounded.is_negative() { "-" } else { "" };
        let num = rounded.0.abs().to_f64().unwrap_or_default();
        write!(f, "{sign}{CURRENCY}{}", format_num::format_num!(",.2", num))
    }
}

impl Serialize for Amount {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_f64(self.to_f64())
    }
}

/// Accepts JSON numbers and strings. Strings go through `Amount::coerce`.
impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(AmountVisitor)
    }
}

struct AmountVisitor;

impl<'de> Visitor<'de> for AmountVisitor {
    type Value = Amount;

    fn expecting(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str("a number or a numeric string")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Amount, E> {
        Ok(Amount::bounded(Decimal::from(v)).unwrap_or_default())
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Amount, E> {
        Ok(Amount::bounded(Decimal::from(v)).unwrap_or_default())
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Amount, E> {
        Ok(Amount::from_f64(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Amount, E> {
        Ok(Amount::coerce(v))
    }

    fn visit_unit<E: de::Error>(self) -> Result<Amount, E> {
        Ok(Amount::ZERO)
    }

    fn visit_none<E: de::Error>(self) -> Result<Amount, E> {
        Ok(Amount::ZERO)
    }

    fn visit_bool<E: de::Error>(self, _: bool) -> Result<Amount, E> {
        Ok(Amount::ZERO)
    }
}

impl From<Decimal> for Amount {
    fn from(value: Decimal) -> Self {
        Amount(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

impl Add for Amount {
    type Output = Amount;

    fn add(self, rhs: Self) -> Self::Output {
        Amount(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for Amount {
    fn add_assign(&mut self, rhs: Self) {
        self.0 = self.0.saturating_add(rhs.0);
    }
}

impl Sub for Amount {
    type Output = Amount;

    fn sub(self, rhs: Self) -> Self::Output {
        Amount(self.0.saturating_sub(rhs.0))
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Amount::ZERO, |acc, a| acc + a)
    }
}

impl<'a> Sum<&'a Amount> for Amount {
    fn sum<I: Iterator<Item = &'a Amount>>(iter: I) -> Self {
        iter.fold(Amount::ZERO, |acc, a| acc + *a)
    }
}
