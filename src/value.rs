//! Value kinds and declared property types
//!
//! The dynamic value currency throughout the crate is `serde_json::Value`.
//! A `ValueType` describes the declared type of a bound slot: a kind plus
//! nullability. The nullable and non-nullable flavors of one kind are each
//! other's counterpart, which is what setter overload selection falls back
//! to when no exact match exists.

use std::fmt;

use serde_json::Value;

/// The kind of a declared property type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Bool,
    Int,
    Float,
    String,
    Array,
    Object,
    /// Anything goes; coercion is a no-op.
    Any,
}

impl ValueKind {
    /// Primitive-like kinds are the only ones that can be scalar slots.
    pub fn is_primitive(self) -> bool {
        matches!(self, ValueKind::Bool | ValueKind::Int | ValueKind::Float)
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::Bool => "bool",
            ValueKind::Int => "int",
            ValueKind::Float => "float",
            ValueKind::String => "string",
            ValueKind::Array => "array",
            ValueKind::Object => "object",
            ValueKind::Any => "any",
        };
        write!(f, "{}", name)
    }
}

/// Declared type of a bound slot: kind + nullability.
///
/// A slot is *scalar* exactly when it is a non-nullable primitive-like
/// kind; writing null into a scalar slot is an error, never a silent drop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValueType {
    kind: ValueKind,
    nullable: bool,
}

impl ValueType {
    /// Non-nullable slot of the given kind.
    pub const fn scalar(kind: ValueKind) -> Self {
        Self {
            kind,
            nullable: false,
        }
    }

    /// Nullable slot of the given kind.
    pub const fn nullable(kind: ValueKind) -> Self {
        Self {
            kind,
            nullable: true,
        }
    }

    /// The unconstrained type: any value, null included.
    pub const fn any() -> Self {
        Self {
            kind: ValueKind::Any,
            nullable: true,
        }
    }

    pub fn kind(&self) -> ValueKind {
        self.kind
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    pub fn is_scalar(&self) -> bool {
        !self.nullable && self.kind.is_primitive()
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.nullable {
            write!(f, "{}?", self.kind)
        } else {
            write!(f, "{}", self.kind)
        }
    }
}

/// Short rendering of a value for error messages.
pub(crate) fn describe(value: &Value) -> String {
    let text = value.to_string();
    if text.chars().count() > 64 {
        let cut: String = text.chars().take(64).collect();
        format!("{}…", cut)
    } else {
        text
    }
}
