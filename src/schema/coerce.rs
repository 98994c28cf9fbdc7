//! Schema-driven coercion of `date-time` and `binary` strings.
//!
//! Walks a JSON-Schema fragment alongside a decoded [`Value`] and replaces
//! formatted strings in place:
//!
//! | Schema | Input | Output |
//! |--------|-------|--------|
//! | `{"type": "string", "format": "date-time"}` | `"2024-01-01T00:00:00Z"` | [`Value::DateTime`] |
//! | `{"type": "string", "format": "binary"}` | `"aGk="` | [`Value::Binary`] |
//!
//! Unparsable dates are left as strings. Malformed base64 is an error.
//! Already-coerced values are skipped, so running the walk twice is a no-op.

use crate::error::{Result, SdkError};
use crate::types::Value;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;
use bytes::Bytes;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};
use serde_json::Value as JsonValue;

const BINARY_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Coerce formatted strings inside `value` according to `schema`.
///
/// Mutates `value` in place and hands the same reference back.
///
/// # Errors
///
/// Returns [`SdkError::Decode`] if a `binary` field holds malformed base64.
///
/// # Examples
///
/// ```
/// use universal_sdk_client::schema::coerce_special_types;
/// use universal_sdk_client::Value;
/// use serde_json::json;
///
/// let schema = json!({
///     "type": "object",
///     "properties": {"createdAt": {"type": "string", "format": "date-time"}}
/// });
/// let mut value = Value::from(json!({"createdAt": "2024-01-01T00:00:00Z"}));
/// coerce_special_types(&mut value, &schema).unwrap();
/// assert!(value.get("createdAt").unwrap().as_datetime().is_some());
/// ```
pub fn coerce_special_types<'a>(value: &'a mut Value, schema: &JsonValue) -> Result<&'a mut Value> {
    coerce_node(value, schema)?;
    Ok(value)
}

fn coerce_node(value: &mut Value, schema: &JsonValue) -> Result<()> {
    if let Some(properties) = schema.get("properties").and_then(JsonValue::as_object) {
        if let Value::Object(fields) = value {
            for (name, property) in properties {
                if let Some(field) = fields.get_mut(name) {
                    coerce_property(field, property)?;
                }
            }
        }
        return Ok(());
    }
    coerce_property(value, schema)
}

fn coerce_property(value: &mut Value, schema: &JsonValue) -> Result<()> {
    if has_type(schema, "object") && schema.get("properties").is_some() {
        if matches!(value, Value::Object(_)) {
            coerce_node(value, schema)?;
        }
    } else if has_type(schema, "array") {
        if let (Some(items), Value::Array(elements)) = (schema.get("items"), &mut *value) {
            for element in elements {
                if has_type(items, "object") {
                    coerce_node(element, items)?;
                } else if has_type(items, "string") {
                    coerce_string(element, format_of(items))?;
                }
            }
        }
    } else if has_type(schema, "string") {
        coerce_string(value, format_of(schema))?;
    }
    Ok(())
}

fn coerce_string(value: &mut Value, format: Option<&str>) -> Result<()> {
    let Value::String(raw) = value else {
        return Ok(());
    };

    match format {
        Some("date-time") => {
            if let Some(parsed) = parse_date_time(raw) {
                *value = Value::DateTime(parsed);
            }
        }
        Some("binary") => {
            let decoded = BINARY_ENGINE
                .decode(raw.trim())
                .map_err(|e| SdkError::Decode(format!("invalid base64 in binary field: {}", e)))?;
            *value = Value::Binary(Bytes::from(decoded));
        }
        _ => {}
    }
    Ok(())
}

/// Parse RFC 3339, falling back to offset-less timestamps and bare dates (UTC).
pub(crate) fn parse_date_time(raw: &str) -> Option<DateTime<FixedOffset>> {
    let raw = raw.trim();
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .map(|naive| naive.and_utc().fixed_offset())
        })
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
                .map(|naive| naive.and_utc().fixed_offset())
        })
}

/// Whether `schema` declares `name` as its type (or one of its types).
pub(crate) fn has_type(schema: &JsonValue, name: &str) -> bool {
    match schema.get("type") {
        Some(JsonValue::String(t)) => t == name,
        Some(JsonValue::Array(types)) => types.iter().any(|t| t.as_str() == Some(name)),
        _ => false,
    }
}

fn format_of(schema: &JsonValue) -> Option<&str> {
    schema.get("format").and_then(JsonValue::as_str)
}
