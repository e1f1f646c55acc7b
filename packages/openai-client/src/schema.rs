//! Strict JSON schemas for structured outputs, derived with `schemars`.
//!
//! OpenAI's `json_schema` response format in strict mode only accepts a
//! subset of JSON Schema:
//! - every object has `additionalProperties: false`
//! - every property is listed in `required` (optional fields are nullable)
//! - no `$ref` into `definitions`
//! - no numeric `format` annotations such as `uint` or `double`
//!
//! [`StructuredOutput::strict_schema`] rewrites the `schemars` output into
//! that subset in one recursive pass.

use schemars::{schema_for, JsonSchema};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// Types that can be requested as a structured output.
///
/// Implemented for every `JsonSchema + DeserializeOwned` type.
pub trait StructuredOutput: JsonSchema + DeserializeOwned {
    /// Strict-mode schema for this type.
    fn strict_schema() -> Value {
        let mut root = serde_json::to_value(schema_for!(Self)).unwrap_or_default();

        let definitions = match &mut root {
            Value::Object(map) => {
                map.remove("$schema");
                map.remove("definitions").unwrap_or(Value::Null)
            }
            _ => Value::Null,
        };

        strictify(&mut root, &definitions);
        root
    }

    /// Name used for the `json_schema.name` field of the request.
    fn schema_name() -> String {
        <Self as JsonSchema>::schema_name()
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect()
    }
}

impl<T: JsonSchema + DeserializeOwned> StructuredOutput for T {}

fn strictify(value: &mut Value, definitions: &Value) {
    match value {
        Value::Object(map) => {
            if let Some(target) = resolve_ref(map, definitions) {
                *value = target;
                strictify(value, definitions);
                return;
            }

            if is_object_schema(map) {
                close_object(map);
            }
            if is_numeric_schema(map) {
                map.remove("format");
            }

            for child in map.values_mut() {
                strictify(child, definitions);
            }
        }
        Value::Array(items) => {
            for item in items {
                strictify(item, definitions);
            }
        }
        _ => {}
    }
}

fn resolve_ref(map: &Map<String, Value>, definitions: &Value) -> Option<Value> {
    let path = map.get("$ref")?.as_str()?;
    let name = path.strip_prefix("#/definitions/")?;
    definitions.get(name).cloned()
}

fn is_object_schema(map: &Map<String, Value>) -> bool {
    match map.get("type") {
        Some(Value::String(t)) => t == "object",
        Some(Value::Array(types)) => types.iter().any(|t| t == "object"),
        _ => map.contains_key("properties"),
    }
}

fn is_numeric_schema(map: &Map<String, Value>) -> bool {
    let numeric = |t: &Value| t == "integer" || t == "number";
    match map.get("type") {
        Some(Value::Array(types)) => types.iter().any(numeric),
        Some(t) => numeric(t),
        None => false,
    }
}

fn close_object(map: &mut Map<String, Value>) {
    map.insert("additionalProperties".to_string(), Value::Bool(false));

    let required: Vec<Value> = map
        .get("properties")
        .and_then(Value::as_object)
        .map(|props| props.keys().cloned().map(Value::String).collect())
        .unwrap_or_default();
    map.insert("required".to_string(), Value::Array(required));
}
