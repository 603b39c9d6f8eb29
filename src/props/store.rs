//! Concurrent property storage with typed cached lookups
//!
//! A `PropertyStore` keeps raw string properties and a cache of converted
//! values in front of them, so a property asked for as an int a thousand
//! times parses once. Absent keys cache a distinct undefined marker —
//! the same negative-caching idea the binding cache uses. Writes
//! invalidate the affected conversion; bulk merges flush the cache whole.

use std::collections::BTreeMap;
use std::path::Path;

use dashmap::DashMap;
use once_cell::sync::Lazy;
use serde_json::{Map, Value};

use crate::coerce;

use super::{loader, PropsError};

/// Cached conversion state for one key.
#[derive(Clone, Debug)]
enum Converted {
    /// The key had no usable raw value; asking again yields the default.
    Undefined,
    Parsed(Value),
}

/// Thread-safe string properties with a typed-conversion cache.
#[derive(Default, Debug)]
pub struct PropertyStore {
    values: DashMap<String, String>,
    converted: DashMap<String, Converted>,
}

/// Process-wide default store.
static SHARED: Lazy<PropertyStore> = Lazy::new(PropertyStore::new);

/// The process-wide property store.
pub fn shared() -> &'static PropertyStore {
    &SHARED
}

impl PropertyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw lookup; an unset key falls back to `"<key>.Default"`.
    pub fn get(&self, key: &str) -> Option<String> {
        if let Some(value) = self.values.get(key) {
            return Some(value.clone());
        }
        self.values
            .get(&format!("{}.Default", key))
            .map(|value| value.clone())
    }

    /// Set a property, invalidating its cached conversion.
    pub fn set(&self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        self.values.insert(key.clone(), value.into());
        self.converted.remove(&key);
    }

    /// Remove a property and its cached conversion.
    pub fn remove(&self, key: &str) {
        self.values.remove(key);
        self.converted.remove(key);
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn keys(&self) -> Vec<String> {
        self.values.iter().map(|e| e.key().clone()).collect()
    }

    /// Load a properties file (includes honored) into this store.
    pub fn load_file(&self, path: &Path) -> Result<(), PropsError> {
        loader::load_into(self, path)
    }

    pub fn bool_for_key(&self, key: &str) -> Result<bool, PropsError> {
        self.bool_for_key_with_default(key, false)
    }

    pub fn bool_for_key_with_default(&self, key: &str, default: bool) -> Result<bool, PropsError> {
        match self.cached(key) {
            Some(Converted::Undefined) => return Ok(default),
            Some(Converted::Parsed(Value::Bool(b))) => return Ok(b),
            _ => {}
        }
        match self.raw_value(key) {
            None => Ok(default),
            Some(raw) => {
                let parsed = coerce::bool_value(&raw)?;
                self.remember(key, Value::Bool(parsed));
                Ok(parsed)
            }
        }
    }

    pub fn int_for_key(&self, key: &str) -> Result<i64, PropsError> {
        self.int_for_key_with_default(key, 0)
    }

    pub fn int_for_key_with_default(&self, key: &str, default: i64) -> Result<i64, PropsError> {
        match self.cached(key) {
            Some(Converted::Undefined) => return Ok(default),
            Some(Converted::Parsed(Value::Number(n))) => {
                if let Some(i) = n.as_i64() {
                    return Ok(i);
                }
            }
            _ => {}
        }
        match self.raw_value(key) {
            None => Ok(default),
            Some(raw) => {
                let parsed = coerce::int_value(&raw)?;
                self.remember(key, Value::from(parsed));
                Ok(parsed)
            }
        }
    }

    pub fn float_for_key(&self, key: &str) -> Result<f64, PropsError> {
        self.float_for_key_with_default(key, 0.0)
    }

    pub fn float_for_key_with_default(&self, key: &str, default: f64) -> Result<f64, PropsError> {
        match self.cached(key) {
            Some(Converted::Undefined) => return Ok(default),
            Some(Converted::Parsed(Value::Number(n))) => {
                if let Some(f) = n.as_f64() {
                    return Ok(f);
                }
            }
            _ => {}
        }
        match self.raw_value(key) {
            None => Ok(default),
            Some(raw) => {
                let parsed = coerce::float_value(&raw)?;
                self.remember(key, Value::from(parsed));
                Ok(parsed)
            }
        }
    }

    /// Strings skip the conversion cache; the raw value is the value.
    pub fn string_for_key(&self, key: &str) -> Option<String> {
        self.get(key)
    }

    pub fn string_for_key_with_default(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or_else(|| default.to_string())
    }

    /// Arrays parse from JSON (`[...]`) or comma-separated form.
    pub fn array_for_key(&self, key: &str) -> Result<Vec<Value>, PropsError> {
        self.array_for_key_with_default(key, Vec::new())
    }

    pub fn array_for_key_with_default(
        &self,
        key: &str,
        default: Vec<Value>,
    ) -> Result<Vec<Value>, PropsError> {
        match self.cached(key) {
            Some(Converted::Undefined) => return Ok(default),
            Some(Converted::Parsed(Value::Array(items))) => return Ok(items),
            _ => {}
        }
        match self.raw_value(key) {
            None => Ok(default),
            Some(raw) => {
                let parsed = coerce::array_value(&raw)?;
                self.remember(key, Value::Array(parsed.clone()));
                Ok(parsed)
            }
        }
    }

    /// Objects parse from JSON (`{...}`).
    pub fn object_for_key(&self, key: &str) -> Result<Map<String, Value>, PropsError> {
        self.object_for_key_with_default(key, Map::new())
    }

    pub fn object_for_key_with_default(
        &self,
        key: &str,
        default: Map<String, Value>,
    ) -> Result<Map<String, Value>, PropsError> {
        match self.cached(key) {
            Some(Converted::Undefined) => return Ok(default),
            Some(Converted::Parsed(Value::Object(map))) => return Ok(map),
            _ => {}
        }
        match self.raw_value(key) {
            None => Ok(default),
            Some(raw) => {
                let parsed = coerce::object_value(&raw)?;
                self.remember(key, Value::Object(parsed.clone()));
                Ok(parsed)
            }
        }
    }

    /// Split a string property on a separator. Absent keys yield an empty
    /// list.
    pub fn components_separated_by_string(&self, key: &str, separator: &str) -> Vec<String> {
        match self.get(key) {
            None => Vec::new(),
            Some(raw) => raw.split(separator).map(str::to_string).collect(),
        }
    }

    /// Merge every property of `other` into this store and flush the
    /// conversion cache.
    pub fn merge_from(&self, other: &PropertyStore) {
        for entry in other.values.iter() {
            self.values.insert(entry.key().clone(), entry.value().clone());
        }
        self.flush_converted();
    }

    /// Layer `overrides` over `base` into a fresh store; neither input is
    /// touched.
    pub fn apply(base: &PropertyStore, overrides: &PropertyStore) -> PropertyStore {
        let merged = PropertyStore::new();
        merged.merge_from(base);
        merged.merge_from(overrides);
        merged
    }

    /// Drop every cached conversion. Raw values stay.
    pub fn flush_converted(&self) {
        self.converted.clear();
    }

    /// Sorted snapshot of the raw properties. With `protect_values`,
    /// values of password-bearing keys are masked.
    pub fn properties_map(&self, protect_values: bool) -> BTreeMap<String, String> {
        self.values
            .iter()
            .map(|entry| {
                let key = entry.key().clone();
                let value = if protect_values && key.to_lowercase().contains("password") {
                    "<masked>".to_string()
                } else {
                    entry.value().clone()
                };
                (key, value)
            })
            .collect()
    }

    /// Rendering suitable for logging: sorted, passwords masked.
    pub fn log_string(&self) -> String {
        let mut out = String::new();
        for (key, value) in self.properties_map(true) {
            out.push_str(&format!("  {}={}\n", key, value));
        }
        out
    }

    fn cached(&self, key: &str) -> Option<Converted> {
        self.converted.get(key).map(|entry| entry.clone())
    }

    /// Raw value as a `Value`, with absent (unset or blank) collapsing to
    /// `None` after recording the undefined marker.
    fn raw_value(&self, key: &str) -> Option<Value> {
        let raw = self.get(key).map(Value::String);
        match raw {
            Some(value) if !coerce::is_absent(&value) => Some(value),
            _ => {
                self.converted
                    .insert(key.to_string(), Converted::Undefined);
                None
            }
        }
    }

    fn remember(&self, key: &str, value: Value) {
        self.converted.insert(key.to_string(), Converted::Parsed(value));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn set_and_get() {
        let store = PropertyStore::new();
        store.set("service.name", "geo");
        assert_eq!(store.get("service.name").as_deref(), Some("geo"));
        assert_eq!(store.get("service.port"), None);
    }

    #[test]
    fn default_suffix_fallback() {
        let store = PropertyStore::new();
        store.set("pool.size.Default", "8");
        assert_eq!(store.get("pool.size").as_deref(), Some("8"));
        assert_eq!(store.int_for_key("pool.size").unwrap(), 8);

        store.set("pool.size", "32");
        assert_eq!(store.int_for_key("pool.size").unwrap(), 32);
    }

    #[test]
    fn typed_getters_with_defaults() {
        let store = PropertyStore::new();
        store.set("debug", "yes");
        store.set("retries", "4");
        store.set("ratio", "0.75");

        assert!(store.bool_for_key("debug").unwrap());
        assert_eq!(store.int_for_key("retries").unwrap(), 4);
        assert_eq!(store.float_for_key("ratio").unwrap(), 0.75);

        assert!(store.bool_for_key_with_default("missing", true).unwrap());
        assert_eq!(store.int_for_key_with_default("missing", 7).unwrap(), 7);
        assert_eq!(store.float_for_key_with_default("missing", 2.5).unwrap(), 2.5);
        assert_eq!(store.string_for_key_with_default("missing", "x"), "x");
    }

    #[test]
    fn unparsable_value_is_an_error() {
        let store = PropertyStore::new();
        store.set("retries", "several");
        assert!(store.int_for_key("retries").is_err());
        assert!(store.bool_for_key("retries").is_err());
    }

    #[test]
    fn blank_value_counts_as_absent() {
        let store = PropertyStore::new();
        store.set("retries", "   ");
        assert_eq!(store.int_for_key_with_default("retries", 3).unwrap(), 3);
    }

    #[test]
    fn conversion_cache_invalidated_by_set() {
        let store = PropertyStore::new();
        store.set("retries", "4");
        assert_eq!(store.int_for_key("retries").unwrap(), 4);

        store.set("retries", "9");
        assert_eq!(store.int_for_key("retries").unwrap(), 9);

        store.remove("retries");
        assert_eq!(store.int_for_key_with_default("retries", 1).unwrap(), 1);
    }

    #[test]
    fn arrays_from_both_forms() {
        let store = PropertyStore::new();
        store.set("hosts", "a.internal, b.internal");
        store.set("ports", "[8001, 8002]");

        assert_eq!(
            store.array_for_key("hosts").unwrap(),
            vec![json!("a.internal"), json!("b.internal")]
        );
        assert_eq!(store.array_for_key("ports").unwrap(), vec![json!(8001), json!(8002)]);
        assert!(store.array_for_key("missing").unwrap().is_empty());
    }

    #[test]
    fn objects_from_json() {
        let store = PropertyStore::new();
        store.set("limits", r#"{"max": 10}"#);
        let map = store.object_for_key("limits").unwrap();
        assert_eq!(map.get("max"), Some(&json!(10)));
    }

    #[test]
    fn components_split() {
        let store = PropertyStore::new();
        store.set("path", "a:b:c");
        assert_eq!(
            store.components_separated_by_string("path", ":"),
            vec!["a", "b", "c"]
        );
        assert!(store.components_separated_by_string("missing", ":").is_empty());
    }

    #[test]
    fn apply_layers_without_mutating_inputs() {
        let base = PropertyStore::new();
        base.set("a", "1");
        base.set("b", "2");
        let overrides = PropertyStore::new();
        overrides.set("b", "20");

        let merged = PropertyStore::apply(&base, &overrides);
        assert_eq!(merged.get("a").as_deref(), Some("1"));
        assert_eq!(merged.get("b").as_deref(), Some("20"));
        assert_eq!(base.get("b").as_deref(), Some("2"));
    }

    #[test]
    fn log_string_masks_passwords() {
        let store = PropertyStore::new();
        store.set("db.password", "hunter2");
        store.set("db.host", "localhost");

        let log = store.log_string();
        assert!(log.contains("db.host=localhost"));
        assert!(log.contains("db.password=<masked>"));
        assert!(!log.contains("hunter2"));
    }

    #[test]
    fn shared_store_is_a_singleton() {
        assert!(std::ptr::eq(shared(), shared()));
    }
}
