//! Money helpers backed by `rust_decimal`.
//!
//! Every sum in the POS is accumulated as `Decimal` so repeated additions do
//! not drift. Values read from the data service may arrive as JSON numbers,
//! numeric strings, null, or be missing entirely; anything that is not a
//! finite number decodes to zero.

use rust_decimal::prelude::*;
use serde_json::Value;
use std::str::FromStr;

/// Rounding used for display (2 decimal places, half away from zero).
const DECIMAL_PLACES: u32 = 2;

/// Decode an amount field leniently. Absent or non-numeric values are zero.
pub fn parse_amount(value: Option<&Value>) -> Decimal {
    match value {
        Some(Value::Number(n)) => {
            if let Some(i) = n.as_i64() {
                Decimal::from(i)
            } else {
                n.as_f64().map(to_decimal).unwrap_or_default()
            }
        }
        Some(Value::String(s)) => parse_amount_str(s).unwrap_or_default(),
        _ => Decimal::ZERO,
    }
}

/// Parse a user- or service-supplied decimal string. Accepts plain and
/// scientific notation; rejects empty and non-numeric input.
pub fn parse_amount_str(raw: &str) -> Option<Decimal> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .ok()
}

/// Convert f64 to Decimal for calculation; NaN and infinities become zero.
#[inline]
pub fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or_default()
}

/// Convert Decimal back to f64 for the wire, rounded to 2 decimal places.
#[inline]
pub fn to_f64(value: Decimal) -> f64 {
    value
        .round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
        .to_f64()
        .unwrap_or_default()
}

/// `price × quantity`, saturating at `Decimal::MAX` instead of overflowing.
pub fn line_total(price: Decimal, quantity: u32) -> Decimal {
    price.saturating_mul(Decimal::from(quantity))
}

/// Sum an iterator of amounts, saturating instead of overflowing.
pub fn sum<I>(amounts: I) -> Decimal
where
    I: IntoIterator<Item = Decimal>,
{
    amounts
        .into_iter()
        .fold(Decimal::ZERO, |acc, v| acc.saturating_add(v))
}

/// Two-decimal fixed representation, e.g. `1500.00`.
pub fn fixed2(value: Decimal) -> String {
    let rounded =
        value.round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero);
    format!("{rounded:.2}")
}

/// Whole-unit representation used by the dashboard tiles, e.g. `3300`.
pub fn whole(value: Decimal) -> String {
    let rounded = value.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    format!("{rounded:.0}")
}

/// Currency-prefixed two-decimal amount, e.g. `₦1500.00`.
pub fn format_currency(symbol: &str, value: Decimal) -> String {
    format!("{symbol}{}", fixed2(value))
}
