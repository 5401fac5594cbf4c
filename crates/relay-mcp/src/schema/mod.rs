//! Argument Schema Validation
//!
//! Recursive-descent validation of tool argument objects against object
//! schemas held as plain value trees. The validator checks the three rules
//! the protocol requires of `type == "object"` schemas:
//!
//! - every name in `required` is present
//! - every declared property, when present, satisfies its declared type
//!   (string | number | integer | boolean | array | object)
//! - when `additionalProperties` is `false`, undeclared names are errors
//!
//! Violations are accumulated as a path-tagged list rather than failing
//! fast, so the client sees every problem in one `InvalidParams` response.

// Layer 1: Standard library imports
use std::fmt;

// Layer 2: Third-party crate imports
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Stable violation codes surfaced in `error.data.errors[].code`
pub mod violation_codes {
    /// A name in the schema's `required` set is missing
    pub const REQUIRED: &str = "required";
    /// A present property does not satisfy its declared type
    pub const TYPE_MISMATCH: &str = "type";
    /// An undeclared property with `additionalProperties: false`
    pub const ADDITIONAL_PROPERTY: &str = "additional_property";
    /// The argument payload itself is not an object
    pub const NOT_AN_OBJECT: &str = "not_an_object";
}

/// A single validation failure, anchored to a property path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaViolation {
    /// Slash-separated path from the argument root (e.g. `/config/port`)
    pub path: String,
    /// Human-readable description of the failure
    pub message: String,
    /// Stable machine-readable code
    pub code: String,
}

impl SchemaViolation {
    fn new(path: impl Into<String>, message: impl Into<String>, code: &str) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
            code: code.to_string(),
        }
    }
}

impl fmt::Display for SchemaViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Check whether a value satisfies a declared schema type name
fn matches_type(value: &Value, type_name: &str) -> bool {
    match type_name {
        "string" => value.is_string(),
        "number" => value.is_number(),
        "integer" => value.is_i64() || value.is_u64(),
        "boolean" => value.is_boolean(),
        "array" => value.is_array(),
        "object" => value.is_object(),
        "null" => value.is_null(),
        // Unknown type names are treated as permissive rather than
        // rejecting arguments a looser schema author intended to allow.
        _ => true,
    }
}

/// Validate an argument object against an object schema
///
/// Returns the full list of violations; an empty list means the arguments
/// are valid. A schema without `type: "object"` (or with no constraints at
/// all) accepts anything, matching the open-by-default posture of tool
/// schemas in the wild.
pub fn validate_arguments(schema: &Value, arguments: &Value) -> Vec<SchemaViolation> {
    let mut violations = Vec::new();
    validate_object(schema, arguments, "", &mut violations);
    violations
}

fn validate_object(schema: &Value, value: &Value, path: &str, out: &mut Vec<SchemaViolation>) {
    let schema_obj = match schema.as_object() {
        Some(obj) => obj,
        None => return,
    };

    let is_object_schema = schema_obj
        .get("type")
        .and_then(Value::as_str)
        .map(|t| t == "object")
        .unwrap_or(false);
    if !is_object_schema {
        return;
    }

    let value_obj = match value.as_object() {
        Some(obj) => obj,
        None => {
            out.push(SchemaViolation::new(
                if path.is_empty() { "/" } else { path },
                format!("expected an object, got {}", json_type_name(value)),
                violation_codes::NOT_AN_OBJECT,
            ));
            return;
        }
    };

    let properties = schema_obj
        .get("properties")
        .and_then(Value::as_object);

    if let Some(required) = schema_obj.get("required").and_then(Value::as_array) {
        for name in required.iter().filter_map(Value::as_str) {
            if !value_obj.contains_key(name) {
                out.push(SchemaViolation::new(
                    format!("{path}/{name}"),
                    format!("missing required property '{name}'"),
                    violation_codes::REQUIRED,
                ));
            }
        }
    }

    if let Some(properties) = properties {
        for (name, property_schema) in properties {
            let Some(property_value) = value_obj.get(name) else {
                continue;
            };
            let property_path = format!("{path}/{name}");

            if let Some(expected) = property_schema.get("type").and_then(Value::as_str) {
                if !matches_type(property_value, expected) {
                    out.push(SchemaViolation::new(
                        &property_path,
                        format!(
                            "expected {expected}, got {}",
                            json_type_name(property_value)
                        ),
                        violation_codes::TYPE_MISMATCH,
                    ));
                    continue;
                }
            }

            // Nested object schemas validate recursively.
            validate_object(property_schema, property_value, &property_path, out);
        }
    }

    let additional_allowed = schema_obj
        .get("additionalProperties")
        .and_then(Value::as_bool)
        .unwrap_or(true);
    if !additional_allowed {
        for name in value_obj.keys() {
            let declared = properties.map(|p| p.contains_key(name)).unwrap_or(false);
            if !declared {
                out.push(SchemaViolation::new(
                    format!("{path}/{name}"),
                    format!("unexpected property '{name}'"),
                    violation_codes::ADDITIONAL_PROPERTY,
                ));
            }
        }
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn echo_schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "message": {"type": "string"},
                "count": {"type": "integer"},
            },
            "required": ["message"],
            "additionalProperties": false,
        })
    }

    #[test]
    fn accepts_valid_arguments() {
        let violations = validate_arguments(&echo_schema(), &json!({"message": "hi"}));
        assert!(violations.is_empty());

        let violations =
            validate_arguments(&echo_schema(), &json!({"message": "hi", "count": 3}));
        assert!(violations.is_empty());
    }

    #[test]
    fn reports_missing_required() {
        let violations = validate_arguments(&echo_schema(), &json!({"count": 3}));
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].code, violation_codes::REQUIRED);
        assert_eq!(violations[0].path, "/message");
    }

    #[test]
    fn reports_type_mismatch() {
        let violations = validate_arguments(&echo_schema(), &json!({"message": 42}));
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].code, violation_codes::TYPE_MISMATCH);
        assert!(violations[0].message.contains("expected string"));
    }

    #[test]
    fn integer_type_rejects_fractions() {
        let violations = validate_arguments(
            &echo_schema(),
            &json!({"message": "hi", "count": 1.5}),
        );
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].path, "/count");
    }

    #[test]
    fn reports_additional_properties() {
        let violations =
            validate_arguments(&echo_schema(), &json!({"message": "hi", "extra": true}));
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].code, violation_codes::ADDITIONAL_PROPERTY);
        assert_eq!(violations[0].path, "/extra");
    }

    #[test]
    fn additional_properties_default_open() {
        let schema = json!({
            "type": "object",
            "properties": {"a": {"type": "string"}},
        });
        let violations = validate_arguments(&schema, &json!({"a": "x", "b": 1}));
        assert!(violations.is_empty());
    }

    #[test]
    fn accumulates_multiple_violations() {
        let violations = validate_arguments(
            &echo_schema(),
            &json!({"count": "three", "extra": null}),
        );
        let codes: Vec<&str> = violations.iter().map(|v| v.code.as_str()).collect();
        assert!(codes.contains(&violation_codes::REQUIRED));
        assert!(codes.contains(&violation_codes::TYPE_MISMATCH));
        assert!(codes.contains(&violation_codes::ADDITIONAL_PROPERTY));
    }

    #[test]
    fn nested_object_schemas_validate_recursively() {
        let schema = json!({
            "type": "object",
            "properties": {
                "config": {
                    "type": "object",
                    "properties": {"port": {"type": "integer"}},
                    "required": ["port"],
                },
            },
            "required": ["config"],
        });
        let violations = validate_arguments(&schema, &json!({"config": {}}));
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].path, "/config/port");
    }

    #[test]
    fn non_object_arguments_rejected() {
        let violations = validate_arguments(&echo_schema(), &json!([1, 2, 3]));
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].code, violation_codes::NOT_AN_OBJECT);
    }

    #[test]
    fn schema_without_object_type_is_permissive() {
        let violations = validate_arguments(&json!({}), &json!("anything"));
        assert!(violations.is_empty());
    }
}
