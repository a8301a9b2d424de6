//! Money and quantity values as they are stored in documents.
//!
//! Documents written by other clients (or by hand in the console) are not
//! guaranteed to hold numbers: a price may arrive as `9.99`, `"9.99"`, `null`
//! or be missing entirely. Both types here deserialize leniently and fall back
//! to zero for anything that does not parse, so totals never fail on bad data.

use core::fmt;
use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// Number of decimal places used for every displayed amount.
pub const DISPLAY_SCALE: u32 = 2;

/// A unit price in the restaurant's currency.
///
/// Serialized as a JSON number. Deserialized from a number or a numeric
/// string; anything else reads as zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Price(Decimal);

impl Price {
    /// Zero price.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a price from a decimal amount.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Create a price from an amount in cents.
    #[must_use]
    pub fn from_cents(cents: i64) -> Self {
        Self(Decimal::new(cents, 2))
    }

    /// The decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Best-effort conversion of a stored JSON value.
    #[must_use]
    pub fn from_value(value: &Value) -> Self {
        Self(lenient_decimal(value).unwrap_or(Decimal::ZERO))
    }

    /// Amount rounded to two decimals, e.g. `"9.99"`.
    #[must_use]
    pub fn to_fixed(&self) -> String {
        format_fixed(self.0)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${}", self.to_fixed())
    }
}

impl From<Decimal> for Price {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        rust_decimal::serde::float::serialize(&self.0, serializer)
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(Self::from_value(&value))
    }
}

/// Number of units of one cart line.
///
/// Deserialized from an integer or the integer prefix of a string;
/// anything else reads as zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
#[serde(transparent)]
pub struct Quantity(i64);

impl Quantity {
    /// A single unit.
    pub const ONE: Self = Self(1);

    /// Create a quantity.
    #[must_use]
    pub const fn new(count: i64) -> Self {
        Self(count)
    }

    /// The raw count.
    #[must_use]
    pub const fn get(&self) -> i64 {
        self.0
    }

    /// Quantity after applying `delta`.
    #[must_use]
    pub const fn offset(self, delta: i64) -> Self {
        Self(self.0.saturating_add(delta))
    }

    /// Whether a line holding this quantity may continue to exist.
    #[must_use]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Best-effort conversion of a stored JSON value.
    #[must_use]
    pub fn from_value(value: &Value) -> Self {
        let count = match value {
            Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().map(truncate_to_i64))
                .unwrap_or(0),
            Value::String(s) => leading_integer(s).unwrap_or(0),
            _ => 0,
        };
        Self(count)
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<'de> Deserialize<'de> for Quantity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(Self::from_value(&value))
    }
}

/// Format an amount with exactly two decimals.
///
/// Rounds half away from zero: `0.125` becomes `"0.13"`.
#[must_use]
pub fn format_fixed(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(DISPLAY_SCALE, RoundingStrategy::MidpointAwayFromZero);
    format!("{rounded:.2}")
}

fn lenient_decimal(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(Decimal::from(i))
            } else {
                // Go through the textual form so 9.99 stays 9.99.
                Decimal::from_str(&n.to_string())
                    .or_else(|_| Decimal::from_scientific(&n.to_string()))
                    .ok()
            }
        }
        Value::String(s) => leading_decimal(s),
        _ => None,
    }
}

/// Parse the longest numeric prefix of `s`, ignoring leading whitespace.
fn leading_decimal(s: &str) -> Option<Decimal> {
    let s = s.trim_start();
    let mut end = 0;
    let mut seen_digit = false;
    let mut seen_dot = false;
    for (idx, c) in s.char_indices() {
        match c {
            '+' | '-' if idx == 0 => {}
            '0'..='9' => seen_digit = true,
            '.' if !seen_dot => seen_dot = true,
            _ => break,
        }
        end = idx + c.len_utf8();
    }
    if !seen_digit {
        return None;
    }
    s.get(..end)?.trim_end_matches('.').parse::<Decimal>().ok()
}

fn leading_integer(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let end = s
        .char_indices()
        .take_while(|&(idx, c)| c.is_ascii_digit() || (idx == 0 && (c == '-' || c == '+')))
        .map(|(idx, c)| idx + c.len_utf8())
        .last()?;
    s.get(..end)?.parse().ok()
}

#[allow(clippy::cast_possible_truncation)] // Quantities far below i64::MAX
fn truncate_to_i64(f: f64) -> i64 {
    f as i64
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_price_from_number() {
        assert_eq!(Price::from_value(&json!(9.99)), Price::from_cents(999));
        assert_eq!(Price::from_value(&json!(5)), Price::from_cents(500));
    }

    #[test]
    fn test_price_from_numeric_string() {
        assert_eq!(Price::from_value(&json!("12.50")), Price::from_cents(1250));
        assert_eq!(Price::from_value(&json!(" 7.5 dollars")), Price::from_cents(750));
    }

    #[test]
    fn test_price_from_garbage_is_zero() {
        assert_eq!(Price::from_value(&json!("free")), Price::ZERO);
        assert_eq!(Price::from_value(&json!(null)), Price::ZERO);
        assert_eq!(Price::from_value(&json!({"amount": 3})), Price::ZERO);
    }

    #[test]
    fn test_quantity_lenient() {
        assert_eq!(Quantity::from_value(&json!(3)), Quantity::new(3));
        assert_eq!(Quantity::from_value(&json!("4 pizzas")), Quantity::new(4));
        assert_eq!(Quantity::from_value(&json!("two")), Quantity::new(0));
        assert_eq!(Quantity::from_value(&json!(null)), Quantity::new(0));
    }

    #[test]
    fn test_price_deserialize_missing_field_defaults() {
        #[derive(Deserialize)]
        struct Doc {
            #[serde(default)]
            price: Price,
        }
        let doc: Doc = serde_json::from_value(json!({})).unwrap();
        assert_eq!(doc.price, Price::ZERO);
    }

    #[test]
    fn test_price_serializes_as_number() {
        let json = serde_json::to_value(Price::from_cents(999)).unwrap();
        assert_eq!(json, json!(9.99));
    }

    #[test]
    fn test_format_fixed_rounds_half_away_from_zero() {
        assert_eq!(format_fixed(Decimal::new(125, 3)), "0.13");
        assert_eq!(format_fixed(Decimal::new(-125, 3)), "-0.13");
        assert_eq!(format_fixed(Decimal::ZERO), "0.00");
        assert_eq!(format_fixed(Decimal::new(2498, 2)), "24.98");
    }

    #[test]
    fn test_price_display() {
        assert_eq!(Price::from_cents(1000).to_string(), "$10.00");
    }

    #[test]
    fn test_quantity_offset() {
        assert!(!Quantity::ONE.offset(-1).is_positive());
        assert_eq!(Quantity::new(2).offset(3), Quantity::new(5));
    }
}
