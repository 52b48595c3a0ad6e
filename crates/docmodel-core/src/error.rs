//! Error types for core model operations.

use docmodel_store::StoreError;
use docmodel_types::TypeError;
use thiserror::Error;

/// Errors raised by registry, handle, conversion and collection operations.
///
/// All variants are recoverable and returned from the operation that
/// detected them.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A reference to an object URI that does not exist, with creation
    /// disabled.
    #[error("{0} does not exist")]
    IdNotFound(String),

    /// Creation requested for a URI already bound to an incompatible type.
    #[error("can not create {uri}: it is already in use with type {existing_type}, which is incompatible with type {requested_type}")]
    IdInUse {
        uri: String,
        existing_type: String,
        requested_type: String,
    },

    /// A value or collection element outside the permitted kinds.
    #[error("invalid type: {0}")]
    InvalidType(String),

    /// Unknown spec version, or a type/enum/individual no model provides.
    #[error("registry error: {0}")]
    Registry(String),

    /// A handle from another store was persisted without a copy manager.
    #[error("object not in store: {0}")]
    NotInStore(String),

    /// The operation is not valid for the handle's current configuration.
    #[error("illegal state: {0}")]
    IllegalState(String),

    /// A context default was requested before the context was initialized.
    #[error("default model store has not been initialized")]
    NotInitialized,

    #[error("invalid id: {0}")]
    InvalidId(String),

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl CoreError {
    /// Whether the error is a structural or store-access failure, as opposed
    /// to a problem with the data itself.
    pub fn is_structural(&self) -> bool {
        matches!(self, CoreError::Store(_) | CoreError::NotInitialized)
    }
}

impl From<TypeError> for CoreError {
    fn from(e: TypeError) -> Self {
        CoreError::InvalidId(e.to_string())
    }
}

/// Result alias for core operations.
pub type CoreResult<T> = Result<T, CoreError>;
