//! Convenience access layer over the resolver
//!
//! `value_for_key` and `take_value_for_key` resolve with the value order;
//! the `stored_*` variants use the stored-value order. When no binding
//! exists, the type's unbound-key handler gets the last word before a
//! no-such-key error goes back to the caller.

use std::any::Any;

use serde_json::Value;

use crate::error::KeystoneError;

use super::cache::default_cache;
use super::registry::Bindable;
use super::resolver::{
    resolve, Direction, LookupOrder, STORED_VALUE_LOOKUP_ORDER, VALUE_LOOKUP_ORDER,
};

/// Read `key` from `obj` using the value lookup order.
pub fn value_for_key(obj: &dyn Bindable, key: &str) -> Result<Value, KeystoneError> {
    read_with_order(obj, key, &VALUE_LOOKUP_ORDER)
}

/// Read `key` from `obj` using the stored-value lookup order.
pub fn stored_value_for_key(obj: &dyn Bindable, key: &str) -> Result<Value, KeystoneError> {
    read_with_order(obj, key, &STORED_VALUE_LOOKUP_ORDER)
}

/// Write `value` into `key` on `obj` using the value lookup order.
pub fn take_value_for_key(
    obj: &mut dyn Bindable,
    value: Value,
    key: &str,
) -> Result<(), KeystoneError> {
    write_with_order(obj, value, key, &VALUE_LOOKUP_ORDER)
}

/// Write `value` into `key` on `obj` using the stored-value lookup order.
pub fn take_stored_value_for_key(
    obj: &mut dyn Bindable,
    value: Value,
    key: &str,
) -> Result<(), KeystoneError> {
    write_with_order(obj, value, key, &STORED_VALUE_LOOKUP_ORDER)
}

/// Run the type's validation hook over `value`, then write the accepted
/// (possibly replaced) value.
pub fn validated_take_value_for_key(
    obj: &mut dyn Bindable,
    value: Value,
    key: &str,
) -> Result<(), KeystoneError> {
    let validated =
        obj.validate_value_for_key(value, key)
            .map_err(|source| KeystoneError::Validation {
                type_name: obj.member_table().type_name(),
                key: key.to_string(),
                source,
            })?;
    take_value_for_key(obj, validated, key)
}

fn read_with_order(
    obj: &dyn Bindable,
    key: &str,
    order: &LookupOrder,
) -> Result<Value, KeystoneError> {
    match resolve(default_cache(), obj, key, Direction::Get, order) {
        Some(binding) => {
            let instance: &dyn Any = obj;
            binding.read(instance)
        }
        None => obj
            .handle_unbound_key(key)
            .ok_or_else(|| KeystoneError::NoSuchKey {
                type_name: obj.member_table().type_name(),
                key: key.to_string(),
                direction: Direction::Get,
            }),
    }
}

fn write_with_order(
    obj: &mut dyn Bindable,
    value: Value,
    key: &str,
    order: &LookupOrder,
) -> Result<(), KeystoneError> {
    match resolve(default_cache(), &*obj, key, Direction::Set, order) {
        Some(binding) => {
            let instance: &mut dyn Any = obj;
            binding.write(instance, value)
        }
        None => {
            let type_name = obj.member_table().type_name();
            if obj.handle_take_unbound_key(value, key) {
                Ok(())
            } else {
                Err(KeystoneError::NoSuchKey {
                    type_name,
                    key: key.to_string(),
                    direction: Direction::Set,
                })
            }
        }
    }
}
