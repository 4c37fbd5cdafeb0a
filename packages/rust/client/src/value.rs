//! Tolerant field extraction from Indico export JSON.
//!
//! The export format is loosely typed: numbers arrive as strings, labels
//! arrive as strings or objects, optional objects arrive as null. Missing
//! or oddly-typed fields fall back to defaults instead of failing.

use chrono::{NaiveDate, NaiveTime};
use serde_json::Value;

/// String field, empty when missing or not a string.
pub(crate) fn str_field(value: &Value, key: &str) -> String {
    value
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .trim()
        .to_string()
}

/// Integer field, accepting JSON numbers and numeric strings.
pub(crate) fn int_field(value: &Value, key: &str) -> Option<i64> {
    as_i64(value.get(key)?)
}

pub(crate) fn as_i64(value: &Value) -> Option<i64> {
    value
        .as_i64()
        .or_else(|| value.as_str().and_then(|s| s.trim().parse().ok()))
}

/// A label field that may be a plain string or an object with a
/// `title`/`name` key. `None` when absent, null, or empty.
pub(crate) fn label_field(value: &Value, key: &str) -> Option<String> {
    let v = value.get(key)?;
    let label = match v {
        Value::String(s) => s.trim().to_string(),
        Value::Object(map) => map
            .get("title")
            .or_else(|| map.get("name"))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .trim()
            .to_string(),
        _ => String::new(),
    };
    if label.is_empty() { None } else { Some(label) }
}

/// Calendar date from a `{ "date": "YYYY-MM-DD", ... }` sub-object.
pub(crate) fn date_field(value: &Value, key: &str) -> Option<NaiveDate> {
    let raw = value.get(key)?.get("date")?.as_str()?;
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()
}

/// Time-of-day from a `{ "time": "HH:MM:SS", ... }` sub-object.
/// Indico emits seconds but older exports omit them.
pub(crate) fn time_field(value: &Value, key: &str) -> Option<NaiveTime> {
    let raw = value.get(key)?.get("time")?.as_str()?;
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
        .ok()
}
