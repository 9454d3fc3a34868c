use std::fmt;

use serde_json::{Map, Value};

/// Problems found while checking invocation arguments against a capability schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaViolations(pub Vec<String>);

impl fmt::Display for SchemaViolations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("; "))
    }
}

impl std::error::Error for SchemaViolations {}

fn matches_type(expected: &str, value: &Value) -> bool {
    match expected {
        "string" => value.is_string(),
        "number" => value.is_number(),
        "integer" => value.is_i64() || value.is_u64(),
        "boolean" => value.is_boolean(),
        "object" => value.is_object(),
        "array" => value.is_array(),
        "null" => value.is_null(),
        _ => true,
    }
}

fn type_problem(key: &str, property: &Value, value: &Value) -> Option<String> {
    let accepted: Vec<&str> = match property.get("type") {
        Some(Value::String(single)) => vec![single.as_str()],
        Some(Value::Array(many)) => many.iter().filter_map(|v| v.as_str()).collect(),
        _ => return None,
    };
    if accepted.iter().any(|expected| matches_type(expected, value)) {
        None
    } else {
        Some(format!("argument `{key}` must be of type {}", accepted.join(" | ")))
    }
}

fn enum_problem(key: &str, property: &Value, value: &Value) -> Option<String> {
    let allowed = property.get("enum")?.as_array()?;
    if allowed.contains(value) {
        None
    } else {
        let names: Vec<String> = allowed.iter().map(|v| v.to_string()).collect();
        Some(format!("argument `{key}` must be one of {}", names.join(", ")))
    }
}

/// Checks `args` against an object schema and fills in declared defaults.
///
/// Only the subset used by capability schemas is enforced: `required`, property
/// `type` and `enum`, and `additionalProperties: false`. A null payload is read as an
/// empty object.
pub fn prepare_args(schema: &Value, args: Value) -> Result<Value, SchemaViolations> {
    let mut args = match args {
        Value::Object(map) => map,
        Value::Null => Map::new(),
        _ => {
            return Err(SchemaViolations(vec![
                "arguments must be a JSON object".to_string(),
            ]))
        }
    };

    let empty = Map::new();
    let properties = schema
        .get("properties")
        .and_then(|v| v.as_object())
        .unwrap_or(&empty);
    let closed = schema.get("additionalProperties") == Some(&Value::Bool(false));
    let mut problems = Vec::new();

    for (key, property) in properties {
        if !args.contains_key(key) {
            if let Some(default) = property.get("default") {
                args.insert(key.clone(), default.clone());
            }
        }
    }

    if let Some(required) = schema.get("required").and_then(|v| v.as_array()) {
        for key in required.iter().filter_map(|v| v.as_str()) {
            if !args.contains_key(key) {
                problems.push(format!("missing required argument `{key}`"));
            }
        }
    }

    for (key, value) in &args {
        match properties.get(key) {
            Some(property) => {
                problems.extend(type_problem(key, property, value));
                problems.extend(enum_problem(key, property, value));
            }
            None if closed => problems.push(format!("unexpected argument `{key}`")),
            None => {}
        }
    }

    if problems.is_empty() {
        Ok(Value::Object(args))
    } else {
        Err(SchemaViolations(problems))
    }
}
