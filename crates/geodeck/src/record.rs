//! Loosely typed data records supplied by chart configuration.
//!
//! Bubble and hexgrid data are free-form JSON objects whose field names are
//! configurable, so they are kept as [`Record`]s and read through these
//! helpers.

use serde_json::{Map, Value};

/// A data record: a JSON object keyed by field name.
pub type Record = Map<String, Value>;

/// Reads a numeric field.
///
/// Numbers are returned as-is; strings are parsed after trimming, so `"5000"`
/// and `" 2.5 "` both read as numbers. Booleans count as `1` and `0`.
pub fn number(record: &Record, key: &str) -> Option<f64> {
    match record.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }
}

/// Reads a field as display text.
///
/// Strings are returned unquoted and numbers in their shortest form. Missing
/// and `null` fields yield `None`.
pub fn text(record: &Record, key: &str) -> Option<String> {
    match record.get(key)? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(match n.as_f64() {
            Some(v) => format_plain(v),
            None => n.to_string(),
        }),
        other => Some(other.to_string()),
    }
}

/// Formats a number without trailing zeros: `5000.0` becomes `5000`.
pub(crate) fn format_plain(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

/// Formats a number with thousands separators and at most three decimals.
pub(crate) fn format_grouped(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }

    let rounded = (value.abs() * 1000.0).round() / 1000.0;
    let integer = rounded.trunc() as u64;
    let fraction = format!("{:.3}", rounded.fract());
    let fraction = fraction
        .trim_start_matches('0')
        .trim_end_matches('0')
        .trim_end_matches('.');

    let digits = integer.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if value < 0.0 && (integer > 0 || !fraction.is_empty()) {
        "-"
    } else {
        ""
    };
    format!("{sign}{grouped}{fraction}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        match value {
            Value::Object(map) => map,
            _ => unreachable!("test records are objects"),
        }
    }

    #[test]
    fn test_number_accepts_numeric_strings() {
        let r = record(json!({"a": 3, "b": " 2.5 ", "c": "n/a", "d": true, "e": null}));
        assert_eq!(number(&r, "a"), Some(3.0));
        assert_eq!(number(&r, "b"), Some(2.5));
        assert_eq!(number(&r, "c"), None);
        assert_eq!(number(&r, "d"), Some(1.0));
        assert_eq!(number(&r, "e"), None);
        assert_eq!(number(&r, "missing"), None);
    }

    #[test]
    fn test_text() {
        let r = record(json!({"name": "Phoenix", "mw": 1900, "share": 0.25, "e": null}));
        assert_eq!(text(&r, "name").as_deref(), Some("Phoenix"));
        assert_eq!(text(&r, "mw").as_deref(), Some("1900"));
        assert_eq!(text(&r, "share").as_deref(), Some("0.25"));
        assert_eq!(text(&r, "e"), None);
    }

    #[test]
    fn test_format_grouped() {
        assert_eq!(format_grouped(5000.0), "5,000");
        assert_eq!(format_grouped(1234567.0), "1,234,567");
        assert_eq!(format_grouped(999.0), "999");
        assert_eq!(format_grouped(1234.5678), "1,234.568");
        assert_eq!(format_grouped(-2600.5), "-2,600.5");
        assert_eq!(format_grouped(0.0), "0");
    }

    #[test]
    fn test_format_plain() {
        assert_eq!(format_plain(5000.0), "5000");
        assert_eq!(format_plain(0.52), "0.52");
    }
}
