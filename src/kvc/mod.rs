//! Key-value binding engine
//!
//! Resolves string keys to reusable accessor bindings over types whose
//! shape is only known through their registered member tables:
//! - `registry`: per-type member tables and the `Bindable` trait
//! - `binding`: the immutable `KeyBinding` artifact
//! - `introspect`: candidate-name derivation and table probes
//! - `resolver`: strategy orders and the resolution loop
//! - `cache`: process-wide memoization, negative results included
//! - `coding`: `value_for_key`-style convenience entry points

mod binding;
mod cache;
mod introspect;
mod registry;
mod resolver;

pub mod coding;

pub use binding::KeyBinding;
pub use cache::{default_cache, flush_binding_cache, BindingCache};
pub use coding::{
    stored_value_for_key, take_stored_value_for_key, take_value_for_key,
    validated_take_value_for_key, value_for_key,
};
pub use registry::{
    Bindable, BindingHook, FieldSpec, GetFn, GetterSpec, HookAnswer, MemberTable,
    MemberTableBuilder, SetFn, SetterSpec, Visibility,
};
pub use resolver::{
    resolve, resolve_binding, Direction, LookupOrder, Strategy, STORED_VALUE_LOOKUP_ORDER,
    VALUE_LOOKUP_ORDER,
};

/// Introspection probes run through the process-wide cache so far.
pub fn introspection_probe_count() -> u64 {
    default_cache().probe_count()
}
