//! String interning for recurring property keys
//!
//! Binding-cache entries and bindings themselves hold their key as an
//! `Arc<str>`; interning keeps one allocation per distinct key and makes
//! the clones stored across cache slots O(1).

use std::sync::Arc;

use dashmap::DashMap;
use once_cell::sync::Lazy;

/// Global key interner (thread-safe, lock-free)
static INTERNER: Lazy<Interner> = Lazy::new(Interner::new);

/// Thread-safe string interner using DashMap
pub struct Interner {
    strings: DashMap<Arc<str>, ()>,
}

impl Interner {
    pub fn new() -> Self {
        Self {
            strings: DashMap::new(),
        }
    }

    /// Intern a string, returning a shared `Arc<str>`.
    ///
    /// The lookup borrows the input, so an already-interned string costs
    /// no allocation.
    pub fn intern(&self, s: &str) -> Arc<str> {
        if let Some(existing) = self.strings.get(s) {
            return Arc::clone(existing.key());
        }

        let key: Arc<str> = Arc::from(s);
        self.strings.insert(Arc::clone(&key), ());
        key
    }

    /// Number of interned strings
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}

impl Default for Interner {
    fn default() -> Self {
        Self::new()
    }
}

/// Intern a key string using the global interner
#[inline]
pub fn intern(s: &str) -> Arc<str> {
    INTERNER.intern(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intern_returns_same_arc_for_same_string() {
        let interner = Interner::new();

        let a1 = interner.intern("name");
        let a2 = interner.intern("name");

        // Same pointer (not just equal content)
        assert!(Arc::ptr_eq(&a1, &a2));
    }

    #[test]
    fn intern_different_strings_different_arcs() {
        let interner = Interner::new();

        let a = interner.intern("name");
        let b = interner.intern("age");

        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(interner.len(), 2);
    }

    #[test]
    fn global_intern_works() {
        let a1 = intern("global_key");
        let a2 = intern("global_key");

        assert!(Arc::ptr_eq(&a1, &a2));
    }

    #[test]
    fn concurrent_intern_is_safe() {
        use std::thread;

        let interner = Arc::new(Interner::new());
        let mut handles = vec![];

        for i in 0..10 {
            let interner = Arc::clone(&interner);
            handles.push(thread::spawn(move || {
                for j in 0..100 {
                    interner.intern(&format!("key_{}_{}", i, j));
                }
            }));
        }

        for h in handles {
            h.join().unwrap();
        }

        // Should have 1000 unique strings
        assert_eq!(interner.len(), 1000);
    }
}
