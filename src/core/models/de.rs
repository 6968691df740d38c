//! Lenient readers for values the bill service stores loosely.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, de};
use serde_json::Value;

/// Reads an amount that may arrive as a number, a numeric string, `null` or nothing.
/// Anything that is not a finite number reads as 0.
pub fn lenient_amount<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().map(amount_from_value).unwrap_or(0.0))
}

fn amount_from_value(value: &Value) -> f64 {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_leading_number(s),
        _ => None,
    };
    parsed.filter(|n| n.is_finite()).unwrap_or(0.0)
}

// Longest prefix that reads as a float: "120 Taka" is 120, "1e3" is 1000, "1.2.3" is 1.2.
fn parse_leading_number(s: &str) -> Option<f64> {
    let s = s.trim_start();
    let candidate = s
        .find(|c: char| !(c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '+' | '-')))
        .unwrap_or(s.len());
    (1..=candidate).rev().find_map(|end| s[..end].parse().ok())
}

/// Parses `YYYY-MM-DD`, or the date part of an RFC 3339 timestamp.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .or_else(|| s.get(..10).and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok()))
}

pub fn flexible_date<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_date(&raw).ok_or_else(|| de::Error::custom(format!("invalid date: {}", raw)))
}

/// Reads a date that may be missing, `null`, not a string or unparseable; all of those read as `None`.
pub fn lenient_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(Value::as_str).and_then(parse_date))
}

/// `null` and missing both read as an empty string.
pub fn string_or_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn amounts_from_numbers_and_strings() {
        assert_eq!(amount_from_value(&json!(120)), 120.0);
        assert_eq!(amount_from_value(&json!("99.5")), 99.5);
        assert_eq!(amount_from_value(&json!("450 Taka")), 450.0);
        assert_eq!(amount_from_value(&json!("abc")), 0.0);
        assert_eq!(amount_from_value(&json!(null)), 0.0);
        assert_eq!(amount_from_value(&json!(true)), 0.0);
    }

    #[test]
    fn numeric_strings_read_their_longest_float_prefix() {
        assert_eq!(parse_leading_number("1e3"), Some(1000.0));
        assert_eq!(parse_leading_number("1.2.3"), Some(1.2));
        assert_eq!(parse_leading_number("  -40.5abc"), Some(-40.5));
        assert_eq!(parse_leading_number("2e"), Some(2.0));
        assert_eq!(parse_leading_number("1-2"), Some(1.0));
        assert_eq!(parse_leading_number(".5"), Some(0.5));
        assert_eq!(parse_leading_number("-"), None);
        assert_eq!(parse_leading_number("Taka 120"), None);
    }

    #[test]
    fn dates_accept_plain_and_timestamp_forms() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 10);
        assert_eq!(parse_date("2024-03-10"), expected);
        assert_eq!(parse_date("2024-03-10T08:15:00.000Z"), expected);
        assert_eq!(parse_date("10/03/2024"), None);
        assert_eq!(parse_date(""), None);
    }
}
