//! Key-path traversal
//!
//! Dotted paths (`"a.b.c"`) read and write through a binding for the first
//! segment and plain value descent for the rest: object members by name,
//! array elements by numeric segment. Writing replaces the leaf inside the
//! first segment's value, then stores the whole value back through the
//! binding, so the owning type observes a single write.

use serde_json::Value;

use crate::error::KeystoneError;
use crate::kvc::{coding, Bindable};

/// Read the value at a dotted key path.
pub fn value_for_key_path(obj: &dyn Bindable, path: &str) -> Result<Value, KeystoneError> {
    let segments = split(path)?;
    let mut current = coding::value_for_key(obj, segments[0])?;
    for segment in &segments[1..] {
        current = descend(&current, segment)
            .cloned()
            .ok_or_else(|| KeystoneError::KeyPath {
                path: path.to_string(),
                segment: segment.to_string(),
            })?;
    }
    Ok(current)
}

/// Write `value` at a dotted key path.
///
/// Single-segment paths degrade to a plain take. For longer paths every
/// segment except the leaf must already exist; the leaf may be a new
/// member of an object.
pub fn take_value_for_key_path(
    obj: &mut dyn Bindable,
    value: Value,
    path: &str,
) -> Result<(), KeystoneError> {
    let segments = split(path)?;
    if segments.len() == 1 {
        return coding::take_value_for_key(obj, value, segments[0]);
    }

    let first = segments[0];
    let mut root = coding::value_for_key(&*obj, first)?;

    let mut cursor = &mut root;
    for segment in &segments[1..segments.len() - 1] {
        cursor = descend_mut(cursor, segment).ok_or_else(|| KeystoneError::KeyPath {
            path: path.to_string(),
            segment: segment.to_string(),
        })?;
    }

    let leaf = segments[segments.len() - 1];
    set_member(cursor, leaf, value).ok_or_else(|| KeystoneError::KeyPath {
        path: path.to_string(),
        segment: leaf.to_string(),
    })?;

    coding::take_value_for_key(obj, root, first)
}

fn split(path: &str) -> Result<Vec<&str>, KeystoneError> {
    let segments: Vec<&str> = path.split('.').collect();
    if path.is_empty() || segments.iter().any(|s| s.is_empty()) {
        return Err(KeystoneError::KeyPath {
            path: path.to_string(),
            segment: String::new(),
        });
    }
    Ok(segments)
}

/// One step down into a value: numeric segments index arrays, everything
/// else looks up object members.
pub(crate) fn descend<'a>(value: &'a Value, segment: &str) -> Option<&'a Value> {
    if let Ok(index) = segment.parse::<usize>() {
        if value.is_array() {
            return value.get(index);
        }
    }
    value.get(segment)
}

fn descend_mut<'a>(value: &'a mut Value, segment: &str) -> Option<&'a mut Value> {
    if let Ok(index) = segment.parse::<usize>() {
        if value.is_array() {
            return value.get_mut(index);
        }
    }
    value.get_mut(segment)
}

/// Store into a direct member of `parent`. New object members are
/// created; array indexes must be in bounds.
fn set_member(parent: &mut Value, segment: &str, value: Value) -> Option<()> {
    match parent {
        Value::Object(map) => {
            map.insert(segment.to_string(), value);
            Some(())
        }
        Value::Array(items) => {
            let index = segment.parse::<usize>().ok()?;
            let slot = items.get_mut(index)?;
            *slot = value;
            Some(())
        }
        _ => None,
    }
}
