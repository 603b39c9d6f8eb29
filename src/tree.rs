//! JSON documents as bindable value trees
//!
//! `ValueTree` wraps a parsed JSON document and exposes its entries to the
//! binding engine through dictionary-backed `OtherStorage` bindings: its
//! member table is empty and every key resolves through the override hook.
//! Object members answer by name, array elements by numeric key, and a key
//! the document lacks reads as null, the way map-backed storage behaves.
//! Nested access composes with key paths since every produced value is
//! itself plain JSON.

use once_cell::sync::Lazy;
use serde_json::Value;

use crate::error::AccessorError;
use crate::keypath::descend;
use crate::kvc::{Bindable, BindingHook, KeyBinding, MemberTable};
use crate::value::ValueType;

/// A bindable JSON document.
#[derive(Debug, Clone)]
pub struct ValueTree {
    root: Value,
}

static TREE_TABLE: Lazy<MemberTable> =
    Lazy::new(|| MemberTable::for_type::<ValueTree>("ValueTree").finish());

impl ValueTree {
    pub fn new(root: Value) -> Self {
        Self { root }
    }

    /// Parse a JSON document into a tree.
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        Ok(Self {
            root: serde_json::from_str(text)?,
        })
    }

    pub fn root(&self) -> &Value {
        &self.root
    }

    pub fn into_root(self) -> Value {
        self.root
    }
}

impl Bindable for ValueTree {
    fn member_table(&self) -> &'static MemberTable {
        &TREE_TABLE
    }

    fn binding_hook(&self) -> Option<&dyn BindingHook> {
        Some(self)
    }
}

impl BindingHook for ValueTree {
    fn other_storage_binding(&self, key: &str) -> Option<KeyBinding> {
        let read_key = key.to_string();
        let write_key = key.to_string();
        Some(KeyBinding::read_write_for::<ValueTree, _, _>(
            "ValueTree",
            key,
            ValueType::any(),
            move |tree| Ok(descend(&tree.root, &read_key).cloned().unwrap_or(Value::Null)),
            move |tree, value| store(&mut tree.root, &write_key, value),
        ))
    }
}

fn store(root: &mut Value, key: &str, value: Value) -> Result<(), AccessorError> {
    match root {
        Value::Object(map) => {
            map.insert(key.to_string(), value);
            Ok(())
        }
        Value::Array(items) => {
            let index = key
                .parse::<usize>()
                .map_err(|_| AccessorError::new(format!("'{}' is not an array index", key)))?;
            let len = items.len();
            let slot = items.get_mut(index).ok_or_else(|| {
                AccessorError::new(format!("index {} out of bounds ({})", index, len))
            })?;
            *slot = value;
            Ok(())
        }
        other => Err(AccessorError::new(format!(
            "cannot store '{}' into a {} root",
            key,
            kind_name(other)
        ))),
    }
}

fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
