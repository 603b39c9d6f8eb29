//! The resolved binding artifact
//!
//! A `KeyBinding` is an immutable, reusable handle for one property of one
//! type. Field bindings carry both directions; method bindings carry one.
//! Bindings are freely shared across threads and across every instance of
//! the owning type; writes coerce into the declared type first and refuse
//! null for scalar slots.

use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::coerce;
use crate::error::{AccessorError, KeystoneError};
use crate::interner::intern;
use crate::value::ValueType;

use super::registry::{GetFn, SetFn};

/// Resolved read/write handle for a (type, key) pair.
#[derive(Clone)]
pub struct KeyBinding {
    type_name: &'static str,
    type_id: TypeId,
    key: Arc<str>,
    value_type: ValueType,
    reader: Option<GetFn>,
    writer: Option<SetFn>,
}

impl KeyBinding {
    pub(crate) fn new(
        type_name: &'static str,
        type_id: TypeId,
        key: &str,
        value_type: ValueType,
        reader: Option<GetFn>,
        writer: Option<SetFn>,
    ) -> Self {
        Self {
            type_name,
            type_id,
            key: intern(key),
            value_type,
            reader,
            writer,
        }
    }

    /// Read-only binding backed by a typed closure. Intended for hook
    /// implementations.
    pub fn reader_for<T, G>(
        type_name: &'static str,
        key: &str,
        value_type: ValueType,
        get: G,
    ) -> Self
    where
        T: Any,
        G: Fn(&T) -> Result<Value, AccessorError> + Send + Sync + 'static,
    {
        Self::new(
            type_name,
            TypeId::of::<T>(),
            key,
            value_type,
            Some(erase_get(type_name, get)),
            None,
        )
    }

    /// Write-only binding backed by a typed closure.
    pub fn writer_for<T, S>(
        type_name: &'static str,
        key: &str,
        value_type: ValueType,
        set: S,
    ) -> Self
    where
        T: Any,
        S: Fn(&mut T, Value) -> Result<(), AccessorError> + Send + Sync + 'static,
    {
        Self::new(
            type_name,
            TypeId::of::<T>(),
            key,
            value_type,
            None,
            Some(erase_set(type_name, set)),
        )
    }

    /// Two-way binding backed by typed closures.
    pub fn read_write_for<T, G, S>(
        type_name: &'static str,
        key: &str,
        value_type: ValueType,
        get: G,
        set: S,
    ) -> Self
    where
        T: Any,
        G: Fn(&T) -> Result<Value, AccessorError> + Send + Sync + 'static,
        S: Fn(&mut T, Value) -> Result<(), AccessorError> + Send + Sync + 'static,
    {
        Self::new(
            type_name,
            TypeId::of::<T>(),
            key,
            value_type,
            Some(erase_get(type_name, get)),
            Some(erase_set(type_name, set)),
        )
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Name of the owning type.
    pub fn owner(&self) -> &'static str {
        self.type_name
    }

    pub fn owner_id(&self) -> TypeId {
        self.type_id
    }

    /// Declared type of the bound slot.
    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    /// Whether the bound slot is a non-nullable primitive-like value.
    pub fn is_scalar(&self) -> bool {
        self.value_type.is_scalar()
    }

    pub fn has_reader(&self) -> bool {
        self.reader.is_some()
    }

    pub fn has_writer(&self) -> bool {
        self.writer.is_some()
    }

    /// Read the bound property from `instance`.
    pub fn read(&self, instance: &dyn Any) -> Result<Value, KeystoneError> {
        let reader = self.reader.as_ref().ok_or_else(|| self.access_failure(
            AccessorError::new("binding is write-only"),
        ))?;
        reader(instance).map_err(|e| self.access_failure(e))
    }

    /// Coerce `value` to the declared type and store it into `instance`.
    ///
    /// Null bypasses coercion: it is an error for scalar slots and stored
    /// as-is otherwise.
    pub fn write(&self, instance: &mut dyn Any, value: Value) -> Result<(), KeystoneError> {
        let writer = self.writer.as_ref().ok_or_else(|| self.access_failure(
            AccessorError::new("binding is read-only"),
        ))?;
        if value.is_null() {
            if self.is_scalar() {
                return Err(KeystoneError::NullIntoScalar {
                    type_name: self.type_name,
                    key: self.key.to_string(),
                });
            }
            return writer(instance, Value::Null).map_err(|e| self.access_failure(e));
        }
        let coerced = coerce::coerce(&value, self.value_type)?;
        writer(instance, coerced).map_err(|e| self.access_failure(e))
    }

    fn access_failure(&self, source: AccessorError) -> KeystoneError {
        KeystoneError::AccessFailure {
            type_name: self.type_name,
            key: self.key.to_string(),
            source,
        }
    }
}

impl fmt::Debug for KeyBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyBinding")
            .field("owner", &self.type_name)
            .field("key", &self.key)
            .field("value_type", &self.value_type)
            .field("reader", &self.reader.is_some())
            .field("writer", &self.writer.is_some())
            .finish()
    }
}

fn erase_get<T, G>(type_name: &'static str, get: G) -> GetFn
where
    T: Any,
    G: Fn(&T) -> Result<Value, AccessorError> + Send + Sync + 'static,
{
    Arc::new(move |obj: &dyn Any| {
        let obj = obj
            .downcast_ref::<T>()
            .ok_or_else(|| AccessorError::new(format!("instance is not a {}", type_name)))?;
        get(obj)
    })
}

fn erase_set<T, S>(type_name: &'static str, set: S) -> SetFn
where
    T: Any,
    S: Fn(&mut T, Value) -> Result<(), AccessorError> + Send + Sync + 'static,
{
    Arc::new(move |obj: &mut dyn Any, value: Value| {
        let obj = obj
            .downcast_mut::<T>()
            .ok_or_else(|| AccessorError::new(format!("instance is not a {}", type_name)))?;
        set(obj, value)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::ValueKind;
    use serde_json::json;

    struct Counter {
        hits: i64,
    }

    fn binding() -> KeyBinding {
        KeyBinding::read_write_for::<Counter, _, _>(
            "Counter",
            "hits",
            ValueType::scalar(ValueKind::Int),
            |c| Ok(json!(c.hits)),
            |c, v| {
                c.hits = crate::coerce::int_value(&v)?;
                Ok(())
            },
        )
    }

    #[test]
    fn round_trip() {
        let b = binding();
        let mut c = Counter { hits: 0 };
        b.write(&mut c, json!(3)).unwrap();
        assert_eq!(b.read(&c).unwrap(), json!(3));
    }

    #[test]
    fn write_coerces_strings() {
        let b = binding();
        let mut c = Counter { hits: 0 };
        b.write(&mut c, json!("17")).unwrap();
        assert_eq!(c.hits, 17);
    }

    #[test]
    fn null_into_scalar_is_its_own_error() {
        let b = binding();
        let mut c = Counter { hits: 5 };
        let err = b.write(&mut c, Value::Null).unwrap_err();
        assert!(matches!(err, KeystoneError::NullIntoScalar { .. }));
        assert_eq!(c.hits, 5);
    }

    #[test]
    fn unparsable_write_is_coercion_error() {
        let b = binding();
        let mut c = Counter { hits: 5 };
        let err = b.write(&mut c, json!("many")).unwrap_err();
        assert!(matches!(err, KeystoneError::Coercion(_)));
    }

    #[test]
    fn null_into_nullable_stores_null() {
        let b = KeyBinding::read_write_for::<Option<String>, _, _>(
            "OptName",
            "name",
            ValueType::nullable(ValueKind::String),
            |o| Ok(o.clone().map(Value::String).unwrap_or(Value::Null)),
            |o, v| {
                *o = v.as_str().map(str::to_string);
                Ok(())
            },
        );
        let mut slot = Some("x".to_string());
        b.write(&mut slot, Value::Null).unwrap();
        assert_eq!(slot, None);
        assert_eq!(b.read(&slot).unwrap(), Value::Null);
    }

    #[test]
    fn direction_mismatch_is_access_failure() {
        let read_only = KeyBinding::reader_for::<Counter, _>(
            "Counter",
            "hits",
            ValueType::scalar(ValueKind::Int),
            |c| Ok(json!(c.hits)),
        );
        let mut c = Counter { hits: 0 };
        assert!(matches!(
            read_only.write(&mut c, json!(1)).unwrap_err(),
            KeystoneError::AccessFailure { .. }
        ));
    }

    #[test]
    fn metadata_accessors() {
        let b = binding();
        assert_eq!(b.key(), "hits");
        assert_eq!(b.owner(), "Counter");
        assert!(b.is_scalar());
        assert!(b.has_reader());
        assert!(b.has_writer());
    }
}
