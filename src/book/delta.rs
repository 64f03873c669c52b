//! JSON level arrays to typed book updates.
//!
//! Venues send levels as `[price, size]`, `[price, size, count]` or
//! `[price, size, order_id]`, with numbers either as JSON numbers or strings.
//! Anything that does not parse is rejected here, before it reaches a book.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde_json::Value;

use super::level::{CountedLevel, OrderDelta, PriceLevel};
use crate::error::{Error, Result};

/// A book update that can be read from one JSON level array.
pub trait FromLevel: Sized {
    fn from_level(value: &Value) -> Result<Self>;
}

impl FromLevel for PriceLevel {
    fn from_level(value: &Value) -> Result<Self> {
        let row = row(value, 2)?;
        Ok(Self::new(decimal(&row[0])?, decimal(&row[1])?))
    }
}

impl FromLevel for CountedLevel {
    fn from_level(value: &Value) -> Result<Self> {
        let row = row(value, 3)?;
        Ok(Self::new(decimal(&row[0])?, decimal(&row[1])?, count(&row[2])?))
    }
}

impl FromLevel for OrderDelta {
    fn from_level(value: &Value) -> Result<Self> {
        let row = row(value, 3)?;
        let price = match &row[0] {
            Value::Null => None,
            other => Some(decimal(other)?),
        };
        let order_id = match &row[2] {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            other => return Err(Error::Parse(format!("invalid order id: {other}"))),
        };
        Ok(Self::new(price, decimal(&row[1])?, order_id))
    }
}

/// Parse a side's levels. A missing side parses as empty.
pub fn parse_side<D: FromLevel>(value: Option<&Value>) -> Result<Vec<D>> {
    match value {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(levels)) => levels.iter().map(D::from_level).collect(),
        Some(other) => Err(Error::Parse(format!("expected level array, got {other}"))),
    }
}

/// Read a price or amount from a JSON number or numeric string.
pub fn decimal(value: &Value) -> Result<Decimal> {
    let text = match value {
        Value::String(s) => s.as_str(),
        Value::Number(n) => return parse_decimal(&n.to_string()),
        other => return Err(Error::Parse(format!("expected number, got {other}"))),
    };
    parse_decimal(text)
}

fn parse_decimal(text: &str) -> Result<Decimal> {
    Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .map_err(|e| Error::Parse(format!("invalid decimal {text:?}: {e}")))
}

fn count(value: &Value) -> Result<u64> {
    let count = match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0 && *f >= 0.0).map(|f| f as u64)),
        Value::String(s) => s.parse().ok(),
        _ => None,
    };
    count.ok_or_else(|| Error::Parse(format!("invalid count: {value}")))
}

fn row(value: &Value, min_len: usize) -> Result<&[Value]> {
    match value {
        Value::Array(items) if items.len() >= min_len => Ok(items.as_slice()),
        other => Err(Error::Parse(format!(
            "expected level with {min_len} fields, got {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn test_price_level_from_strings_and_numbers() {
        let levels: Vec<PriceLevel> =
            parse_side(Some(&json!([["101.5", "2"], [100.25, 3]]))).unwrap();
        assert_eq!(
            levels,
            vec![
                PriceLevel::new(dec!(101.5), dec!(2)),
                PriceLevel::new(dec!(100.25), dec!(3))
            ]
        );
    }

    #[test]
    fn test_counted_and_order_levels() {
        let counted = CountedLevel::from_level(&json!([101.5, 2, 3])).unwrap();
        assert_eq!(counted.count, 3);

        let order = OrderDelta::from_level(&json!([null, "0", "oid-1"])).unwrap();
        assert_eq!(order, OrderDelta::new(None, dec!(0), "oid-1"));
    }

    #[test]
    fn test_scientific_notation() {
        assert_eq!(decimal(&json!("1e-3")).unwrap(), dec!(0.001));
    }

    #[test]
    fn test_rejects_malformed_levels() {
        assert!(matches!(
            PriceLevel::from_level(&json!(["abc", "1"])),
            Err(Error::Parse(_))
        ));
        assert!(matches!(
            PriceLevel::from_level(&json!([1])),
            Err(Error::Parse(_))
        ));
        assert!(matches!(
            parse_side::<PriceLevel>(Some(&json!({"price": 1}))),
            Err(Error::Parse(_))
        ));
        assert!(parse_side::<PriceLevel>(None).unwrap().is_empty());
    }
}
