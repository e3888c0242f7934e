// Coercion of loosely typed request values. Query strings only carry text,
// and clients send amounts and dates in whatever shape their form produced.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{de, Deserialize, Deserializer};
use serde_json::Value;

use crate::error::ApiError;

/// Accept `7` as well as `"7"`
pub fn lenient_u64<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Number(n) => n
            .as_u64()
            .ok_or_else(|| de::Error::custom(format!("expected a non-negative integer, got {}", n))),
        Value::String(s) => s
            .trim()
            .parse()
            .map_err(|_| de::Error::custom(format!("expected a non-negative integer, got '{}'", s))),
        other => Err(de::Error::custom(format!("expected a number, got {}", other))),
    }
}

/// Accept `12.5` as well as `"12.5"`. `NaN` and infinities are rejected.
pub fn lenient_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = match Value::deserialize(deserializer)? {
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| de::Error::custom(format!("expected a number, got {}", n)))?,
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| de::Error::custom(format!("expected a number, got '{}'", s)))?,
        other => return Err(de::Error::custom(format!("expected a number, got {}", other))),
    };
    if !value.is_finite() {
        return Err(de::Error::custom("expected a finite number"));
    }
    Ok(value)
}

/// Non-empty text value of `key`. Numbers are accepted and rendered as text,
/// so `{"captcha": 123456}` reads the same as `{"captcha": "123456"}`.
pub fn text_field(data: &Value, key: &str) -> Option<String> {
    match data.get(key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Turn a client supplied date into a UTC timestamp.
///
/// Strings may be RFC 3339, `YYYY-MM-DD HH:MM:SS` / `YYYY-MM-DDTHH:MM:SS`
/// (read as UTC) or a bare `YYYY-MM-DD` (midnight UTC). Numbers are epoch
/// milliseconds.
pub fn coerce_date(value: &Value) -> Result<DateTime<Utc>, ApiError> {
    let parsed = match value {
        Value::String(s) => parse_date_str(s.trim()),
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .and_then(DateTime::from_timestamp_millis),
        _ => None,
    };
    parsed.ok_or_else(|| ApiError::bad_request(format!("invalid date: {}", value)))
}

fn parse_date_str(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
