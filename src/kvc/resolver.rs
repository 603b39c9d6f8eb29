//! Lookup strategy resolution
//!
//! Drives the introspector across a caller-chosen strategy order and
//! memoizes every per-strategy outcome in the binding cache. Order is a
//! strict priority list: the first strategy that yields any accessor wins,
//! even when a later one would also match.
//!
//! Two canonical orders exist. The value order favors public accessor
//! methods; the stored-value order favors underscored members so a caller
//! mutating internal state does not bounce through its own public getters.
//! Neither is inherent to a key; callers pick per lookup.

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::value::ValueType;

use super::binding::KeyBinding;
use super::cache::{BindingCache, Slot};
use super::introspect::Introspector;
use super::registry::Bindable;

/// One accessor naming convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Method,
    UnderbarMethod,
    Field,
    UnderbarField,
    OtherStorage,
}

impl Strategy {
    /// Cache slot for this strategy; `OtherStorage` is hook-driven and
    /// has none.
    pub(crate) fn slot_index(self) -> Option<usize> {
        match self {
            Strategy::Method => Some(0),
            Strategy::UnderbarMethod => Some(1),
            Strategy::Field => Some(2),
            Strategy::UnderbarField => Some(3),
            Strategy::OtherStorage => None,
        }
    }
}

/// Whether a binding is being resolved for reading or writing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Get,
    Set,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Get => write!(f, "get"),
            Direction::Set => write!(f, "set"),
        }
    }
}

/// A fixed permutation of all five strategies.
pub type LookupOrder = [Strategy; 5];

/// Order for ordinary property reads: public methods first.
pub const VALUE_LOOKUP_ORDER: LookupOrder = [
    Strategy::Method,
    Strategy::UnderbarMethod,
    Strategy::UnderbarField,
    Strategy::Field,
    Strategy::OtherStorage,
];

/// Order biased toward internal storage: underscored members and fields
/// before public accessor methods.
pub const STORED_VALUE_LOOKUP_ORDER: LookupOrder = [
    Strategy::UnderbarMethod,
    Strategy::UnderbarField,
    Strategy::Field,
    Strategy::OtherStorage,
    Strategy::Method,
];

/// Resolve a binding for `(type of instance, key, direction)` under the
/// given strategy order.
///
/// Returns `None` when no strategy yields an accessor — a legitimate
/// outcome, cached so the failed introspection never reruns.
pub fn resolve(
    cache: &BindingCache,
    instance: &dyn Bindable,
    key: &str,
    direction: Direction,
    order: &LookupOrder,
) -> Option<Arc<KeyBinding>> {
    if key.is_empty() {
        return None;
    }

    let table = instance.member_table();
    let storage = cache.storage(table.type_id(), key);
    let introspector = Introspector::new(table, instance.binding_hook(), cache.probe_counter());

    for &strategy in order {
        let slot = match strategy.slot_index() {
            // Hook-driven storage is authoritative on every lookup.
            None => match introspector.probe(key, strategy, direction, ValueType::any()) {
                Some(binding) => Slot::Available(Arc::new(binding)),
                None => Slot::NotAvailable,
            },
            Some(index) => match storage.cached(direction, index) {
                Some(slot) => slot,
                None => {
                    // Setter overloads need the key's natural type; learn
                    // it from the Get binding under the same order.
                    let hint = if direction == Direction::Set
                        && matches!(strategy, Strategy::Method | Strategy::UnderbarMethod)
                    {
                        resolve(cache, instance, key, Direction::Get, order)
                            .map(|b| b.value_type())
                            .unwrap_or(ValueType::any())
                    } else {
                        ValueType::any()
                    };

                    let computed = match introspector.probe(key, strategy, direction, hint) {
                        Some(binding) => Slot::Available(Arc::new(binding)),
                        None => Slot::NotAvailable,
                    };
                    if matches!(strategy, Strategy::Field | Strategy::UnderbarField) {
                        storage.fill_both(index, computed)
                    } else {
                        storage.fill(direction, index, computed)
                    }
                }
            },
        };

        if let Slot::Available(binding) = slot {
            debug!(
                type_name = table.type_name(),
                key,
                %direction,
                ?strategy,
                "resolved binding"
            );
            return Some(binding);
        }
    }

    debug!(type_name = table.type_name(), key, %direction, "no binding");
    None
}

/// [`resolve`] against the process-wide default cache.
pub fn resolve_binding(
    instance: &dyn Bindable,
    key: &str,
    direction: Direction,
    order: &LookupOrder,
) -> Option<Arc<KeyBinding>> {
    resolve(super::cache::default_cache(), instance, key, direction, order)
}
