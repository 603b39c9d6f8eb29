//! Per-type member tables
//!
//! Rust has no runtime reflection, so every bindable type carries an
//! explicit table of its members: fields, zero-argument getter methods and
//! one-argument setter methods, each with a name, a declared value type and
//! a visibility. Tables are built once per type, typically behind a
//! `Lazy` static, and the introspector searches them by the same naming
//! conventions a reflective runtime would probe.
//!
//! Types that keep properties somewhere else entirely (a backing map, a
//! document tree) implement [`BindingHook`] instead and answer for the
//! strategies they want to intercept.

use std::any::{Any, TypeId};
use std::marker::PhantomData;
use std::sync::Arc;

use serde_json::Value;

use crate::error::AccessorError;
use crate::value::ValueType;

use super::binding::KeyBinding;

/// Visibility of a registered member.
///
/// Non-public members are only considered when the owning table declares
/// relaxed access; private members are never promoted by accident.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Public,
    Module,
    Private,
}

/// Type-erased reader: pulls a value out of an instance.
pub type GetFn = Arc<dyn Fn(&dyn Any) -> Result<Value, AccessorError> + Send + Sync>;

/// Type-erased writer: stores an (already coerced) value into an instance.
pub type SetFn = Arc<dyn Fn(&mut dyn Any, Value) -> Result<(), AccessorError> + Send + Sync>;

/// A registered field. Fields have one shape, so a single spec serves both
/// directions.
pub struct FieldSpec {
    pub name: &'static str,
    pub visibility: Visibility,
    pub value_type: ValueType,
    pub(crate) get: GetFn,
    pub(crate) set: SetFn,
}

/// A registered zero-argument getter method.
pub struct GetterSpec {
    pub name: &'static str,
    pub visibility: Visibility,
    pub value_type: ValueType,
    pub(crate) call: GetFn,
}

/// A registered one-argument setter method. Several setters may share a
/// name with different parameter types; overload selection picks one.
pub struct SetterSpec {
    pub name: &'static str,
    pub visibility: Visibility,
    pub param_type: ValueType,
    pub(crate) call: SetFn,
}

/// The member table of one bindable type.
pub struct MemberTable {
    type_name: &'static str,
    type_id: TypeId,
    fields: Vec<FieldSpec>,
    getters: Vec<GetterSpec>,
    setters: Vec<SetterSpec>,
    direct_field_access: bool,
    allow_non_public: bool,
}

impl MemberTable {
    /// Start a table for `T`. The name is what error messages and bindings
    /// report as the owning type.
    pub fn for_type<T: Any>(type_name: &'static str) -> MemberTableBuilder<T> {
        MemberTableBuilder {
            table: MemberTable {
                type_name,
                type_id: TypeId::of::<T>(),
                fields: Vec::new(),
                getters: Vec::new(),
                setters: Vec::new(),
                direct_field_access: true,
                allow_non_public: false,
            },
            _marker: PhantomData,
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Whether the field strategies may touch this type at all.
    pub fn direct_field_access(&self) -> bool {
        self.direct_field_access
    }

    /// Whether non-public members are fair game for this type.
    pub fn allow_non_public(&self) -> bool {
        self.allow_non_public
    }

    pub(crate) fn field_named(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub(crate) fn getter_named(&self, name: &str) -> Option<&GetterSpec> {
        self.getters.iter().find(|g| g.name == name)
    }

    pub(crate) fn setters_named<'a>(
        &'a self,
        name: &'a str,
    ) -> impl Iterator<Item = &'a SetterSpec> + 'a {
        self.setters.iter().filter(move |s| s.name == name)
    }
}

/// Fluent builder for a [`MemberTable`], typed so registration closures
/// take the concrete type without downcast noise.
pub struct MemberTableBuilder<T> {
    table: MemberTable,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Any> MemberTableBuilder<T> {
    /// Register a field: one reader, one writer, one declared type.
    pub fn field<G, S>(
        mut self,
        visibility: Visibility,
        name: &'static str,
        value_type: ValueType,
        get: G,
        set: S,
    ) -> Self
    where
        G: Fn(&T) -> Value + Send + Sync + 'static,
        S: Fn(&mut T, Value) -> Result<(), AccessorError> + Send + Sync + 'static,
    {
        let type_name = self.table.type_name;
        self.table.fields.push(FieldSpec {
            name,
            visibility,
            value_type,
            get: wrap_get(type_name, move |obj: &T| Ok(get(obj))),
            set: wrap_set(type_name, set),
        });
        self
    }

    /// Register a zero-argument getter method.
    pub fn getter<G>(
        mut self,
        visibility: Visibility,
        name: &'static str,
        value_type: ValueType,
        call: G,
    ) -> Self
    where
        G: Fn(&T) -> Result<Value, AccessorError> + Send + Sync + 'static,
    {
        let type_name = self.table.type_name;
        self.table.getters.push(GetterSpec {
            name,
            visibility,
            value_type,
            call: wrap_get(type_name, call),
        });
        self
    }

    /// Register a one-argument setter method. Call repeatedly with the
    /// same name to declare overloads.
    pub fn setter<S>(
        mut self,
        visibility: Visibility,
        name: &'static str,
        param_type: ValueType,
        call: S,
    ) -> Self
    where
        S: Fn(&mut T, Value) -> Result<(), AccessorError> + Send + Sync + 'static,
    {
        let type_name = self.table.type_name;
        self.table.setters.push(SetterSpec {
            name,
            visibility,
            param_type,
            call: wrap_set(type_name, call),
        });
        self
    }

    /// Forbid the field strategies for this type; only methods (and hooks)
    /// will resolve.
    pub fn deny_direct_field_access(mut self) -> Self {
        self.table.direct_field_access = false;
        self
    }

    /// Let non-public members resolve. This is the per-type stand-in for a
    /// runtime that can force access past visibility.
    pub fn allow_non_public(mut self) -> Self {
        self.table.allow_non_public = true;
        self
    }

    pub fn finish(self) -> MemberTable {
        self.table
    }
}

fn wrap_get<T: Any>(
    type_name: &'static str,
    call: impl Fn(&T) -> Result<Value, AccessorError> + Send + Sync + 'static,
) -> GetFn {
    Arc::new(move |obj: &dyn Any| {
        let obj = obj
            .downcast_ref::<T>()
            .ok_or_else(|| AccessorError::new(format!("instance is not a {}", type_name)))?;
        call(obj)
    })
}

fn wrap_set<T: Any>(
    type_name: &'static str,
    call: impl Fn(&mut T, Value) -> Result<(), AccessorError> + Send + Sync + 'static,
) -> SetFn {
    Arc::new(move |obj: &mut dyn Any, value: Value| {
        let obj = obj
            .downcast_mut::<T>()
            .ok_or_else(|| AccessorError::new(format!("instance is not a {}", type_name)))?;
        call(obj, value)
    })
}

/// Answer of a hook for one candidate accessor.
pub enum HookAnswer {
    /// Use this binding; introspection is skipped.
    Bind(KeyBinding),
    /// This candidate definitely does not exist; introspection is skipped.
    Unavailable,
    /// The hook has nothing to say; default introspection proceeds.
    NoOpinion,
}

/// Override hook a bindable type may implement to supply its own
/// accessors.
///
/// The field and method hooks are consulted once per candidate name, in
/// the same order introspection would try them. `other_storage_binding` is
/// the only way the `OtherStorage` strategy ever matches: a returned
/// binding may carry a reader, a writer, or both, and the resolver picks
/// it only for directions it actually supports.
pub trait BindingHook {
    fn field_binding(&self, _key: &str, _field_name: &str) -> HookAnswer {
        HookAnswer::NoOpinion
    }

    fn getter_binding(&self, _key: &str, _method_name: &str) -> HookAnswer {
        HookAnswer::NoOpinion
    }

    fn setter_binding(&self, _key: &str, _method_name: &str) -> HookAnswer {
        HookAnswer::NoOpinion
    }

    fn other_storage_binding(&self, _key: &str) -> Option<KeyBinding> {
        None
    }
}

/// A type whose properties the binding engine can reach.
///
/// `member_table` is the only required method. The rest are opt-in
/// capabilities: an override hook, a fallback for unbound keys, and a
/// validation step for writes.
pub trait Bindable: Any {
    /// The member table for this type, built once and shared.
    fn member_table(&self) -> &'static MemberTable;

    /// Optional override hook; declared explicitly, never probed by cast.
    fn binding_hook(&self) -> Option<&dyn BindingHook> {
        None
    }

    /// Last resort for a read of a key with no binding. Returning a value
    /// satisfies the read; declining yields a no-such-key error.
    fn handle_unbound_key(&self, _key: &str) -> Option<Value> {
        None
    }

    /// Last resort for a write of a key with no binding. Returning true
    /// means the value was consumed.
    fn handle_take_unbound_key(&mut self, _value: Value, _key: &str) -> bool {
        false
    }

    /// Validation step for `validated_take_value_for_key`; may replace the
    /// value or reject it.
    fn validate_value_for_key(&self, value: Value, _key: &str) -> Result<Value, AccessorError> {
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::ValueKind;
    use serde_json::json;

    struct Point {
        x: i64,
    }

    fn table() -> MemberTable {
        MemberTable::for_type::<Point>("Point")
            .field(
                Visibility::Public,
                "x",
                ValueType::scalar(ValueKind::Int),
                |p: &Point| json!(p.x),
                |p: &mut Point, v| {
                    p.x = crate::coerce::int_value(&v)?;
                    Ok(())
                },
            )
            .getter(
                Visibility::Public,
                "getX",
                ValueType::scalar(ValueKind::Int),
                |p: &Point| Ok(json!(p.x)),
            )
            .setter(
                Visibility::Module,
                "setX",
                ValueType::scalar(ValueKind::Int),
                |p: &mut Point, v| {
                    p.x = crate::coerce::int_value(&v)?;
                    Ok(())
                },
            )
            .finish()
    }

    #[test]
    fn lookups_by_name() {
        let table = table();
        assert!(table.field_named("x").is_some());
        assert!(table.field_named("y").is_none());
        assert!(table.getter_named("getX").is_some());
        assert_eq!(table.setters_named("setX").count(), 1);
        assert_eq!(table.setters_named("setY").count(), 0);
    }

    #[test]
    fn wrapped_accessors_downcast() {
        let table = table();
        let point = Point { x: 4 };
        let field = table.field_named("x").unwrap();
        assert_eq!((field.get)(&point).unwrap(), json!(4));

        let mut point = Point { x: 0 };
        (field.set)(&mut point, json!(11)).unwrap();
        assert_eq!(point.x, 11);
    }

    #[test]
    fn wrong_instance_type_is_reported() {
        let table = table();
        let not_a_point = String::from("nope");
        let field = table.field_named("x").unwrap();
        let err = (field.get)(&not_a_point).unwrap_err();
        assert!(err.to_string().contains("Point"));
    }

    #[test]
    fn defaults_on_table_flags() {
        let table = table();
        assert!(table.direct_field_access());
        assert!(!table.allow_non_public());
    }
}
