//! Keystone - key-value binding foundation
//!
//! Resolves string keys to cached, reusable accessor bindings over types
//! whose shape is only declared through registered member tables, with a
//! coercion layer, key-path traversal, bindable JSON documents and a typed
//! property store on top.

pub mod coerce;
pub mod error;
pub mod interner;
pub mod keypath;
pub mod kvc;
pub mod props;
pub mod tree;
pub mod value;

pub use error::{AccessorError, CoercionError, KeystoneError};
pub use keypath::{take_value_for_key_path, value_for_key_path};
pub use kvc::{
    flush_binding_cache, resolve_binding, stored_value_for_key, take_stored_value_for_key,
    take_value_for_key, value_for_key, Bindable, BindingCache, BindingHook, Direction, HookAnswer,
    KeyBinding, LookupOrder, MemberTable, Strategy, Visibility, STORED_VALUE_LOOKUP_ORDER,
    VALUE_LOOKUP_ORDER,
};
pub use props::{PropertyStore, PropsError};
pub use tree::ValueTree;
pub use value::{ValueKind, ValueType};
