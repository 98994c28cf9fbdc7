//! JSON-Schema validation of decoded payloads.
//!
//! Scalars are first nudged toward their declared `type` (`"1"` becomes `1`
//! for an integer field, `true` becomes `"true"` for a string field), then the
//! payload is checked with a compiled [`jsonschema::Validator`]. Keywords the
//! validator does not know, such as OpenAPI's `example` or `discriminator`,
//! are ignored.

use crate::error::{Result, SdkError};
use serde_json::{Number, Value as JsonValue};

/// A compiled response schema bound to a description of what it validates.
pub struct SchemaValidator {
    schema: JsonValue,
    validator: jsonschema::Validator,
    context: String,
}

impl SchemaValidator {
    /// Compile `schema`. `context` names the response in error messages,
    /// e.g. `"POST /widgets 201"`.
    ///
    /// # Errors
    ///
    /// Returns [`SdkError::Configuration`] if the schema itself is invalid.
    pub fn compile(schema: JsonValue, context: impl Into<String>) -> Result<Self> {
        let context = context.into();
        let validator = jsonschema::options().build(&schema).map_err(|e| {
            SdkError::Configuration(format!("invalid response schema for {}: {}", context, e))
        })?;
        Ok(SchemaValidator {
            schema,
            validator,
            context,
        })
    }

    /// The schema this validator was compiled from.
    pub fn schema(&self) -> &JsonValue {
        &self.schema
    }

    /// What this validator checks.
    pub fn context(&self) -> &str {
        &self.context
    }

    /// Coerce scalars in `instance` toward the schema, then validate it.
    ///
    /// # Errors
    ///
    /// Returns [`SdkError::Validation`] listing every violation.
    pub fn validate(&self, instance: &mut JsonValue) -> Result<()> {
        coerce_scalar_types(instance, &self.schema);

        let errors: Vec<String> = self
            .validator
            .iter_errors(instance)
            .map(|e| e.to_string())
            .collect();

        if errors.is_empty() {
            Ok(())
        } else {
            Err(SdkError::Validation {
                context: self.context.clone(),
                errors,
            })
        }
    }
}

impl std::fmt::Debug for SchemaValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaValidator")
            .field("context", &self.context)
            .field("schema", &self.schema)
            .finish()
    }
}

/// Convert scalar values whose JSON type disagrees with the declared `type`.
///
/// Objects and arrays are walked through `properties` and `items`. Values that
/// already match, or cannot be converted, are left alone for the validator to
/// judge.
pub fn coerce_scalar_types(instance: &mut JsonValue, schema: &JsonValue) {
    match instance {
        JsonValue::Object(fields) => {
            if let Some(properties) = schema.get("properties").and_then(JsonValue::as_object) {
                for (name, property) in properties {
                    if let Some(field) = fields.get_mut(name) {
                        coerce_scalar_types(field, property);
                    }
                }
            }
        }
        JsonValue::Array(items) => {
            if let Some(item_schema) = schema.get("items") {
                for item in items {
                    coerce_scalar_types(item, item_schema);
                }
            }
        }
        scalar => {
            if let Some(coerced) = coerce_scalar(scalar, schema) {
                *scalar = coerced;
            }
        }
    }
}

fn coerce_scalar(value: &JsonValue, schema: &JsonValue) -> Option<JsonValue> {
    let declared: Vec<&str> = match schema.get("type") {
        Some(JsonValue::String(t)) => vec![t.as_str()],
        Some(JsonValue::Array(types)) => types.iter().filter_map(JsonValue::as_str).collect(),
        _ => return None,
    };

    if declared.iter().any(|t| matches_type(value, t)) {
        return None;
    }
    declared.iter().find_map(|t| convert(value, t))
}

fn matches_type(value: &JsonValue, name: &str) -> bool {
    match name {
        "string" => value.is_string(),
        "number" => value.is_number(),
        "integer" => {
            value.is_i64() || value.is_u64() || value.as_f64().is_some_and(|f| f.fract() == 0.0)
        }
        "boolean" => value.is_boolean(),
        "null" => value.is_null(),
        "object" => value.is_object(),
        "array" => value.is_array(),
        _ => true,
    }
}

fn convert(value: &JsonValue, target: &str) -> Option<JsonValue> {
    match (target, value) {
        ("string", JsonValue::Number(n)) => Some(JsonValue::String(n.to_string())),
        ("string", JsonValue::Bool(b)) => Some(JsonValue::String(b.to_string())),
        ("string", JsonValue::Null) => Some(JsonValue::String(String::new())),

        ("number", JsonValue::String(s)) => parse_number(s.trim()),
        ("integer", JsonValue::String(s)) => s.trim().parse::<i64>().ok().map(JsonValue::from),
        ("number" | "integer", JsonValue::Bool(b)) => Some(JsonValue::from(u8::from(*b))),
        ("number" | "integer", JsonValue::Null) => Some(JsonValue::from(0)),

        ("boolean", JsonValue::String(s)) => match s.as_str() {
            "true" => Some(JsonValue::Bool(true)),
            "false" => Some(JsonValue::Bool(false)),
            _ => None,
        },
        ("boolean", JsonValue::Number(n)) => match n.as_f64() {
            Some(f) if f == 1.0 => Some(JsonValue::Bool(true)),
            Some(f) if f == 0.0 => Some(JsonValue::Bool(false)),
            _ => None,
        },
        ("boolean", JsonValue::Null) => Some(JsonValue::Bool(false)),

        ("null", JsonValue::String(s)) if s.is_empty() => Some(JsonValue::Null),
        ("null", JsonValue::Number(n)) if n.as_f64() == Some(0.0) => Some(JsonValue::Null),
        ("null", JsonValue::Bool(false)) => Some(JsonValue::Null),

        _ => None,
    }
}

fn parse_number(raw: &str) -> Option<JsonValue> {
    if let Ok(i) = raw.parse::<i64>() {
        return Some(JsonValue::from(i));
    }
    raw.parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(JsonValue::Number)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn widget_schema() -> JsonValue {
        json!({
            "type": "object",
            "required": ["id", "name"],
            "properties": {
                "id": {"type": "string"},
                "name": {"type": "string"},
                "count": {"type": "integer"},
                "active": {"type": "boolean"},
                "createdAt": {"type": "string", "format": "date-time"}
            },
            "example": {"id": "1", "name": "a"}
        })
    }

    #[test]
    fn test_valid_payload_passes() {
        let validator = SchemaValidator::compile(widget_schema(), "GET /widgets 200").unwrap();
        let mut payload = json!({"id": "1", "name": "a", "createdAt": "2024-01-01T00:00:00Z"});
        assert!(validator.validate(&mut payload).is_ok());
    }

    #[test]
    fn test_missing_required_fails() {
        let validator = SchemaValidator::compile(widget_schema(), "GET /widgets 200").unwrap();
        let mut payload = json!({"id": "1"});
        let err = validator.validate(&mut payload).unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().contains("GET /widgets 200"));
    }

    #[test]
    fn test_scalars_coerced_before_validation() {
        let validator = SchemaValidator::compile(widget_schema(), "ctx").unwrap();
        let mut payload = json!({"id": 7, "name": "a", "count": "12", "active": "true"});
        validator.validate(&mut payload).unwrap();
        assert_eq!(payload, json!({"id": "7", "name": "a", "count": 12, "active": true}));
    }

    #[test]
    fn test_uncoercible_value_fails() {
        let validator = SchemaValidator::compile(widget_schema(), "ctx").unwrap();
        let mut payload = json!({"id": "1", "name": "a", "count": "twelve"});
        assert!(validator.validate(&mut payload).is_err());
    }

    #[test]
    fn test_array_items_coerced() {
        let schema = json!({"type": "array", "items": {"type": "number"}});
        let mut payload = json!(["1.5", 2, "3"]);
        coerce_scalar_types(&mut payload, &schema);
        assert_eq!(payload, json!([1.5, 2, 3]));
    }

    #[test]
    fn test_union_type_left_alone() {
        let schema = json!({"type": ["string", "null"]});
        let mut payload = json!(null);
        coerce_scalar_types(&mut payload, &schema);
        assert!(payload.is_null());
    }
}
