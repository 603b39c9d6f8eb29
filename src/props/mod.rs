//! Property store and property-file loading
//!
//! - `store`: concurrent string properties with typed, cached getters
//! - `loader`: properties-file parsing with include directives

use std::io;

use thiserror::Error;

use crate::error::CoercionError;

mod loader;
mod store;

pub use loader::{load_into, load_path, load_path_lenient, INCLUDE_KEY};
pub use store::{shared, PropertyStore};

/// Errors of the property layer.
#[derive(Debug, Error)]
pub enum PropsError {
    #[error("io error reading properties: {0}")]
    Io(#[from] io::Error),

    #[error("properties file not found: {path}")]
    NotFound { path: String },

    /// A properties file included itself, directly or through a chain.
    #[error("recursive include of '{path}' (chain: {chain})")]
    RecursiveInclude { path: String, chain: String },

    /// A stored value could not be parsed as the requested type.
    #[error(transparent)]
    Coercion(#[from] CoercionError),
}
