//! Error types for the binding engine
//!
//! `Unavailable` is deliberately not here: a key a type does not support is
//! a legitimate lookup outcome (`None` from the resolver), not an error.

use thiserror::Error;

use crate::kvc::Direction;

/// Failure raised inside a registered accessor (or a hook-supplied one).
///
/// Carries an optional underlying cause so it can wrap whatever the
/// accessor itself failed on.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct AccessorError {
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
}

impl AccessorError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Wrap an underlying error, preserving it as the cause.
    pub fn with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

/// A value could not be converted into a declared target type.
#[derive(Debug, Error)]
#[error("failed to coerce {value} into {target}")]
pub struct CoercionError {
    /// Rendering of the offending value
    pub value: String,
    /// Description of the target type
    pub target: String,
}

impl CoercionError {
    pub fn new(value: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            target: target.into(),
        }
    }
}

// Accessor closures lean on `?` over the coercion helpers.
impl From<CoercionError> for AccessorError {
    fn from(err: CoercionError) -> Self {
        AccessorError::with_source("value does not fit the declared type", err)
    }
}

/// Error taxonomy of the binding engine.
#[derive(Debug, Error)]
pub enum KeystoneError {
    /// The underlying accessor failed; the cause is always preserved.
    #[error("accessor for key '{key}' on {type_name} failed: {source}")]
    AccessFailure {
        type_name: &'static str,
        key: String,
        #[source]
        source: AccessorError,
    },

    /// Attempt to store an absent value into a non-nullable slot.
    #[error("cannot store null into scalar key '{key}' on {type_name}")]
    NullIntoScalar {
        type_name: &'static str,
        key: String,
    },

    #[error(transparent)]
    Coercion(#[from] CoercionError),

    /// No accessor matched and the type's unbound-key handler declined.
    #[error("no key '{key}' to {direction} on {type_name}")]
    NoSuchKey {
        type_name: &'static str,
        key: String,
        direction: Direction,
    },

    /// A key-path segment could not be traversed.
    #[error("cannot traverse segment '{segment}' in key path '{path}'")]
    KeyPath { path: String, segment: String },

    /// The type's validation hook rejected the value.
    #[error("validation of key '{key}' on {type_name} failed: {source}")]
    Validation {
        type_name: &'static str,
        key: String,
        #[source]
        source: AccessorError,
    },
}
