//! Forgiving field deserializers
//!
//! Multipart forms deliver every value as text, and older admin forms send
//! `null` for untouched inputs. These accept both transports.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// String field: `null` → `""`, numbers and booleans stringified
pub fn text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(String::new()),
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected text, found {}",
            other
        ))),
    }
}

/// Boolean field: accepts `true`, `"true"`, `"on"`, `"1"`, `1`, ...
pub fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Bool(b) => Ok(b),
        Value::Null => Ok(false),
        Value::Number(n) => Ok(n.as_f64().map(|f| f != 0.0).unwrap_or(false)),
        Value::String(s) => scms_common::merge::content::parse_flag(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("expected a boolean, found '{}'", s))),
        other => Err(serde::de::Error::custom(format!(
            "expected a boolean, found {}",
            other
        ))),
    }
}

/// Optional small integer: `null`/`""` → `None`, numeric strings parsed
pub fn opt_u8<'de, D>(deserializer: D) -> Result<Option<u8>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        Value::String(s) if s.trim().is_empty() => Ok(None),
        Value::String(s) => s
            .trim()
            .parse::<u8>()
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("expected a number, found '{}'", s))),
        Value::Number(n) => n
            .as_u64()
            .and_then(|v| u8::try_from(v).ok())
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("number out of range: {}", n))),
        other => Err(serde::de::Error::custom(format!(
            "expected a number, found {}",
            other
        ))),
    }
}

pub fn default_true() -> bool {
    true
}
