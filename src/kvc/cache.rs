//! Process-wide binding cache
//!
//! Memoizes resolution outcomes per (type, key) with one slot per cached
//! strategy per direction. A slot holds either a resolved binding or the
//! negative "not available" outcome, so repeat lookups for keys a type
//! genuinely lacks never re-run introspection. Races between threads
//! resolving the same uncached slot are settled first-write-wins; both
//! candidates are behaviorally identical, so either is fine to serve.
//!
//! `OtherStorage` answers come from the type's hook and are not cached
//! here; the hook is authoritative on every lookup.

use std::any::TypeId;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

use dashmap::DashMap;
use once_cell::sync::Lazy;

use crate::interner::intern;

use super::binding::KeyBinding;
use super::resolver::Direction;

/// Cached outcome of one strategy for one direction.
#[derive(Clone)]
pub(crate) enum Slot {
    Available(Arc<KeyBinding>),
    NotAvailable,
}

/// Number of strategies with cache slots (Method, UnderbarMethod, Field,
/// UnderbarField). OtherStorage is hook-driven and uncached.
pub(crate) const CACHED_STRATEGIES: usize = 4;

/// Per-(type, key) slot storage, one array per direction.
#[derive(Default)]
pub(crate) struct BindingStorage {
    get: [OnceLock<Slot>; CACHED_STRATEGIES],
    set: [OnceLock<Slot>; CACHED_STRATEGIES],
}

impl BindingStorage {
    fn cells(&self, direction: Direction) -> &[OnceLock<Slot>; CACHED_STRATEGIES] {
        match direction {
            Direction::Get => &self.get,
            Direction::Set => &self.set,
        }
    }

    pub(crate) fn cached(&self, direction: Direction, index: usize) -> Option<Slot> {
        self.cells(direction)[index].get().cloned()
    }

    /// Store a computed slot; if another thread won the race, its slot is
    /// returned instead.
    pub(crate) fn fill(&self, direction: Direction, index: usize, slot: Slot) -> Slot {
        self.cells(direction)[index].get_or_init(|| slot).clone()
    }

    /// Fields have one shape: a computed field slot lands in both
    /// direction arrays at once.
    pub(crate) fn fill_both(&self, index: usize, slot: Slot) -> Slot {
        self.set[index].get_or_init(|| slot.clone());
        self.get[index].get_or_init(|| slot).clone()
    }
}

#[derive(Clone, PartialEq, Eq, Hash)]
struct StorageKey {
    type_id: TypeId,
    key: Arc<str>,
}

/// Concurrent cache of resolution outcomes.
///
/// One instance is created lazily for the whole process (see
/// [`default_cache`]); independent instances exist mainly so tests can
/// observe caching in isolation.
pub struct BindingCache {
    table: DashMap<StorageKey, Arc<BindingStorage>>,
    probes: AtomicU64,
}

impl BindingCache {
    pub fn new() -> Self {
        Self {
            table: DashMap::new(),
            probes: AtomicU64::new(0),
        }
    }

    pub(crate) fn storage(&self, type_id: TypeId, key: &str) -> Arc<BindingStorage> {
        let storage_key = StorageKey {
            type_id,
            key: intern(key),
        };
        self.table.entry(storage_key).or_default().clone()
    }

    pub(crate) fn probe_counter(&self) -> &AtomicU64 {
        &self.probes
    }

    /// Number of introspection probes run through this cache so far.
    /// Diagnostics only; a warm cache stops incrementing.
    pub fn probe_count(&self) -> u64 {
        self.probes.load(Ordering::Relaxed)
    }

    /// Number of (type, key) entries currently cached.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Drop every cached outcome. Only needed after type definitions
    /// change underneath a running process; carries no ordering guarantee
    /// with in-flight resolutions.
    pub fn flush(&self) {
        self.table.clear();
    }
}

impl Default for BindingCache {
    fn default() -> Self {
        Self::new()
    }
}

/// The process-wide cache behind the convenience access layer.
static DEFAULT_CACHE: Lazy<BindingCache> = Lazy::new(BindingCache::new);

pub fn default_cache() -> &'static BindingCache {
    &DEFAULT_CACHE
}

/// Flush the process-wide binding cache.
pub fn flush_binding_cache() {
    DEFAULT_CACHE.flush();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_is_shared_per_type_and_key() {
        let cache = BindingCache::new();
        let a = cache.storage(TypeId::of::<String>(), "name");
        let b = cache.storage(TypeId::of::<String>(), "name");
        assert!(Arc::ptr_eq(&a, &b));

        let other_key = cache.storage(TypeId::of::<String>(), "age");
        assert!(!Arc::ptr_eq(&a, &other_key));

        let other_type = cache.storage(TypeId::of::<u32>(), "name");
        assert!(!Arc::ptr_eq(&a, &other_type));
        assert_eq!(cache.len(), 3);
    }

    #[test]
    fn fill_is_first_write_wins() {
        let storage = BindingStorage::default();
        let first = storage.fill(Direction::Get, 0, Slot::NotAvailable);
        assert!(matches!(first, Slot::NotAvailable));

        // A later (racing) fill keeps the original outcome
        let binding = Arc::new(crate::kvc::KeyBinding::reader_for::<String, _>(
            "String",
            "len",
            crate::value::ValueType::scalar(crate::value::ValueKind::Int),
            |s: &String| Ok(serde_json::json!(s.len())),
        ));
        let second = storage.fill(Direction::Get, 0, Slot::Available(binding));
        assert!(matches!(second, Slot::NotAvailable));
    }

    #[test]
    fn fill_both_lands_in_both_directions() {
        let storage = BindingStorage::default();
        storage.fill_both(2, Slot::NotAvailable);
        assert!(storage.cached(Direction::Get, 2).is_some());
        assert!(storage.cached(Direction::Set, 2).is_some());
        assert!(storage.cached(Direction::Get, 0).is_none());
    }

    #[test]
    fn flush_clears_entries() {
        let cache = BindingCache::new();
        cache.storage(TypeId::of::<String>(), "name");
        assert!(!cache.is_empty());
        cache.flush();
        assert!(cache.is_empty());
    }

    #[test]
    fn default_cache_is_a_singleton() {
        let a: &BindingCache = default_cache();
        let b: &BindingCache = default_cache();
        assert!(std::ptr::eq(a, b));
    }
}
