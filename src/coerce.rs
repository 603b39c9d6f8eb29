//! Value coercion into declared property types
//!
//! Converts arbitrary values into a target `ValueType` before they are
//! stored through a binding, and backs the typed getters of the property
//! store. Strings are trimmed before parsing; booleans accept yes/no/y/n/
//! true/false in any case as well as numeric forms.
//!
//! Two families:
//! - the plain `*_value` functions fail on anything unparsable, including
//!   absent input;
//! - the `*_with_default` functions treat absent input (null or a blank
//!   string) as the default, but still fail on unparsable input.

use serde_json::{Map, Value};

use crate::error::CoercionError;
use crate::value::{describe, ValueKind, ValueType};

/// Whether a value counts as absent: null, or a blank string.
pub fn is_absent(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

/// Coerce `value` into the declared `target` type.
///
/// Null coerces to null for nullable targets and fails for scalar ones
/// (the binding layer reports that case as null-into-scalar before ever
/// calling here).
pub fn coerce(value: &Value, target: ValueType) -> Result<Value, CoercionError> {
    if value.is_null() {
        return if target.is_nullable() {
            Ok(Value::Null)
        } else {
            Err(CoercionError::new("null", target.to_string()))
        };
    }
    match target.kind() {
        ValueKind::Bool => bool_value(value).map(Value::Bool),
        ValueKind::Int => int_value(value).map(Value::from),
        ValueKind::Float => float_value(value).map(Value::from),
        ValueKind::String => string_value(value).map(Value::String),
        ValueKind::Array => array_value(value).map(Value::Array),
        ValueKind::Object => object_value(value).map(Value::Object),
        ValueKind::Any => Ok(value.clone()),
    }
}

/// Boolean reading of a value.
///
/// Numbers are false when zero; strings accept no/false/n and yes/true/y
/// (case-insensitive) or anything that parses as an integer.
pub fn bool_value(value: &Value) -> Result<bool, CoercionError> {
    match value {
        Value::Bool(b) => Ok(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(i != 0)
            } else {
                Ok(n.as_f64().map(|f| f != 0.0).unwrap_or(false))
            }
        }
        Value::String(s) => {
            let s = s.trim();
            if s.eq_ignore_ascii_case("no")
                || s.eq_ignore_ascii_case("false")
                || s.eq_ignore_ascii_case("n")
            {
                Ok(false)
            } else if s.eq_ignore_ascii_case("yes")
                || s.eq_ignore_ascii_case("true")
                || s.eq_ignore_ascii_case("y")
            {
                Ok(true)
            } else if let Ok(i) = s.parse::<i64>() {
                Ok(i != 0)
            } else {
                Err(CoercionError::new(describe(value), "bool"))
            }
        }
        _ => Err(CoercionError::new(describe(value), "bool")),
    }
}

/// Integer reading of a value. Floats truncate; booleans map to 1 and 0.
pub fn int_value(value: &Value) -> Result<i64, CoercionError> {
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(i)
            } else if let Some(f) = n.as_f64() {
                Ok(f as i64)
            } else {
                Err(CoercionError::new(describe(value), "int"))
            }
        }
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| CoercionError::new(describe(value), "int")),
        Value::Bool(b) => Ok(if *b { 1 } else { 0 }),
        _ => Err(CoercionError::new(describe(value), "int")),
    }
}

/// Float reading of a value. Booleans map to 1.0 and 0.0.
pub fn float_value(value: &Value) -> Result<f64, CoercionError> {
    match value {
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| CoercionError::new(describe(value), "float")),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| CoercionError::new(describe(value), "float")),
        Value::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
        _ => Err(CoercionError::new(describe(value), "float")),
    }
}

/// String reading of a value. Numbers and booleans render themselves;
/// structured values do not silently flatten.
pub fn string_value(value: &Value) -> Result<String, CoercionError> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        _ => Err(CoercionError::new(describe(value), "string")),
    }
}

/// Array reading of a value.
///
/// Strings starting with `[` parse as JSON arrays; any other non-blank
/// string splits on commas into an array of trimmed strings.
pub fn array_value(value: &Value) -> Result<Vec<Value>, CoercionError> {
    match value {
        Value::Array(items) => Ok(items.clone()),
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                return Err(CoercionError::new(describe(value), "array"));
            }
            if s.starts_with('[') {
                match serde_json::from_str::<Value>(s) {
                    Ok(Value::Array(items)) => Ok(items),
                    _ => Err(CoercionError::new(describe(value), "array")),
                }
            } else {
                Ok(s
                    .split(',')
                    .map(|item| Value::String(item.trim().to_string()))
                    .collect())
            }
        }
        _ => Err(CoercionError::new(describe(value), "array")),
    }
}

/// Object reading of a value; strings must parse as JSON objects.
pub fn object_value(value: &Value) -> Result<Map<String, Value>, CoercionError> {
    match value {
        Value::Object(map) => Ok(map.clone()),
        Value::String(s) => {
            let s = s.trim();
            if s.starts_with('{') {
                match serde_json::from_str::<Value>(s) {
                    Ok(Value::Object(map)) => Ok(map),
                    _ => Err(CoercionError::new(describe(value), "object")),
                }
            } else {
                Err(CoercionError::new(describe(value), "object"))
            }
        }
        _ => Err(CoercionError::new(describe(value), "object")),
    }
}

/// Boolean reading with a default for absent input.
pub fn bool_with_default(value: &Value, default: bool) -> Result<bool, CoercionError> {
    if is_absent(value) {
        Ok(default)
    } else {
        bool_value(value)
    }
}

/// Integer reading with a default for absent input.
///
/// Boolean `true` reads as 1; `false` yields the default rather than 0,
/// matching the long-standing with-default convention.
pub fn int_with_default(value: &Value, default: i64) -> Result<i64, CoercionError> {
    if is_absent(value) {
        return Ok(default);
    }
    match value {
        Value::Bool(true) => Ok(1),
        Value::Bool(false) => Ok(default),
        other => int_value(other),
    }
}

/// Float reading with a default for absent input; booleans as in
/// [`int_with_default`].
pub fn float_with_default(value: &Value, default: f64) -> Result<f64, CoercionError> {
    if is_absent(value) {
        return Ok(default);
    }
    match value {
        Value::Bool(true) => Ok(1.0),
        Value::Bool(false) => Ok(default),
        other => float_value(other),
    }
}
