//! Accessor introspection over member tables
//!
//! Given a key and one lookup strategy, derives the candidate member names
//! for that strategy and searches the type's member table for the first
//! usable match. At most one binding comes out of a probe; ordering across
//! strategies is the resolver's business.
//!
//! Candidate names follow the accessor conventions: `get<Key>`, bare
//! `<key>` and `is<Key>` for getter methods, `set<Key>` for setters,
//! `<key>`/`is<Key>` for fields, with underbar variants prefixing `_`.
//! The first letter of the key is uppercased after any non-underbar
//! prefix.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::value::ValueType;

use super::binding::KeyBinding;
use super::registry::{BindingHook, HookAnswer, MemberTable, SetterSpec, Visibility};
use super::resolver::{Direction, Strategy};

/// Key with its first character uppercased.
pub(crate) fn capitalized(key: &str) -> String {
    let mut chars = key.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Candidate member name for a prefix. A bare underbar prefix keeps the
/// key's own capitalization.
pub(crate) fn prefixed_key(prefix: &str, key: &str) -> String {
    if prefix == "_" {
        format!("_{}", key)
    } else {
        format!("{}{}", prefix, capitalized(key))
    }
}

/// One-shot introspection context for a (type, hook) pair.
pub(crate) struct Introspector<'a> {
    table: &'static MemberTable,
    hook: Option<&'a dyn BindingHook>,
    probes: &'a AtomicU64,
}

impl<'a> Introspector<'a> {
    pub(crate) fn new(
        table: &'static MemberTable,
        hook: Option<&'a dyn BindingHook>,
        probes: &'a AtomicU64,
    ) -> Self {
        Self {
            table,
            hook,
            probes,
        }
    }

    /// Attempt one strategy for one direction. `hint` is the natural value
    /// type of the key, used only by setter overload selection.
    pub(crate) fn probe(
        &self,
        key: &str,
        strategy: Strategy,
        direction: Direction,
        hint: ValueType,
    ) -> Option<KeyBinding> {
        match (strategy, direction) {
            (Strategy::Method, Direction::Get) => self.method_get(key, false),
            (Strategy::UnderbarMethod, Direction::Get) => self.method_get(key, true),
            (Strategy::Method, Direction::Set) => self.method_set(key, false, hint),
            (Strategy::UnderbarMethod, Direction::Set) => self.method_set(key, true, hint),
            (Strategy::Field, _) => self.field(key, false),
            (Strategy::UnderbarField, _) => self.field(key, true),
            (Strategy::OtherStorage, _) => self.other_storage(key, direction),
        }
    }

    fn usable(&self, visibility: Visibility) -> bool {
        visibility == Visibility::Public || self.table.allow_non_public()
    }

    fn method_get(&self, key: &str, underbar: bool) -> Option<KeyBinding> {
        let candidates = if underbar {
            [
                prefixed_key("_get", key),
                prefixed_key("_", key),
                prefixed_key("_is", key),
            ]
        } else {
            [
                prefixed_key("get", key),
                key.to_string(),
                prefixed_key("is", key),
            ]
        };

        for name in &candidates {
            if let Some(hook) = self.hook {
                match hook.getter_binding(key, name) {
                    HookAnswer::Bind(binding) => return Some(binding),
                    HookAnswer::Unavailable => continue,
                    HookAnswer::NoOpinion => {}
                }
            }
            if let Some(binding) = self.getter_from_table(key, name) {
                return Some(binding);
            }
        }
        None
    }

    fn getter_from_table(&self, key: &str, name: &str) -> Option<KeyBinding> {
        self.probes.fetch_add(1, Ordering::Relaxed);
        let getter = self.table.getter_named(name)?;
        if !self.usable(getter.visibility) {
            return None;
        }
        Some(KeyBinding::new(
            self.table.type_name(),
            self.table.type_id(),
            key,
            getter.value_type,
            Some(getter.call.clone()),
            None,
        ))
    }

    fn method_set(&self, key: &str, underbar: bool, hint: ValueType) -> Option<KeyBinding> {
        let name = prefixed_key(if underbar { "_set" } else { "set" }, key);

        if let Some(hook) = self.hook {
            match hook.setter_binding(key, &name) {
                HookAnswer::Bind(binding) => return Some(binding),
                HookAnswer::Unavailable => return None,
                HookAnswer::NoOpinion => {}
            }
        }

        self.probes.fetch_add(1, Ordering::Relaxed);
        let mut chosen: Option<&SetterSpec> = None;
        for setter in self.table.setters_named(&name) {
            if !self.usable(setter.visibility) {
                continue;
            }
            // Exact hint match ends the walk; a same-kind counterpart beats
            // anything weaker; otherwise the first usable overload stands.
            if setter.param_type == hint {
                chosen = Some(setter);
                break;
            }
            if setter.param_type.kind() == hint.kind() {
                chosen = Some(setter);
            } else if chosen.is_none() {
                chosen = Some(setter);
            }
        }
        let setter = chosen?;
        Some(KeyBinding::new(
            self.table.type_name(),
            self.table.type_id(),
            key,
            setter.param_type,
            None,
            Some(setter.call.clone()),
        ))
    }

    fn field(&self, key: &str, underbar: bool) -> Option<KeyBinding> {
        if !self.table.direct_field_access() {
            return None;
        }
        let candidates = if underbar {
            [prefixed_key("_", key), prefixed_key("_is", key)]
        } else {
            [key.to_string(), prefixed_key("is", key)]
        };

        for name in &candidates {
            if let Some(hook) = self.hook {
                match hook.field_binding(key, name) {
                    HookAnswer::Bind(binding) => return Some(binding),
                    HookAnswer::Unavailable => continue,
                    HookAnswer::NoOpinion => {}
                }
            }
            if let Some(binding) = self.field_from_table(key, name) {
                return Some(binding);
            }
        }
        None
    }

    fn field_from_table(&self, key: &str, name: &str) -> Option<KeyBinding> {
        self.probes.fetch_add(1, Ordering::Relaxed);
        let field = self.table.field_named(name)?;
        if !self.usable(field.visibility) {
            return None;
        }
        Some(KeyBinding::new(
            self.table.type_name(),
            self.table.type_id(),
            key,
            field.value_type,
            Some(field.get.clone()),
            Some(field.set.clone()),
        ))
    }

    fn other_storage(&self, key: &str, direction: Direction) -> Option<KeyBinding> {
        let binding = self.hook?.other_storage_binding(key)?;
        match direction {
            Direction::Get if binding.has_reader() => Some(binding),
            Direction::Set if binding.has_writer() => Some(binding),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capitalizes_first_letter_only() {
        assert_eq!(capitalized("name"), "Name");
        assert_eq!(capitalized("fullName"), "FullName");
        assert_eq!(capitalized(""), "");
    }

    #[test]
    fn prefixing_conventions() {
        assert_eq!(prefixed_key("get", "name"), "getName");
        assert_eq!(prefixed_key("set", "age"), "setAge");
        assert_eq!(prefixed_key("is", "done"), "isDone");
        assert_eq!(prefixed_key("_get", "name"), "_getName");
        assert_eq!(prefixed_key("_is", "done"), "_isDone");
        // A bare underbar keeps the key untouched
        assert_eq!(prefixed_key("_", "name"), "_name");
    }
}
