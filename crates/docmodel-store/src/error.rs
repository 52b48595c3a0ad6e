use docmodel_types::{IdType, PropertyDescriptor, TypeError};

/// Errors from store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The object does not exist in this store.
    #[error("object not found: {0}")]
    NotFound(String),

    /// An entry for this URI already exists.
    #[error("object {uri} already exists with type {type_name}")]
    AlreadyExists { uri: String, type_name: String },

    /// A collection operation was applied to a single-valued property.
    #[error("property {property} of {uri} is not a collection")]
    NotACollection {
        uri: String,
        property: PropertyDescriptor,
    },

    /// The value cannot be held by this store.
    #[error("invalid value: {0}")]
    InvalidValue(String),

    /// The store cannot generate ids of this kind.
    #[error("can not generate ids of kind {0}")]
    UnsupportedIdType(IdType),

    /// The backend does not support the operation at all.
    #[error("unsupported operation: {0}")]
    Unsupported(String),

    /// A lock guarding store state was poisoned by a panicking writer.
    #[error("lock poisoned: {0}")]
    LockPoisoned(String),

    /// Configuration could not be parsed.
    #[error("config error: {0}")]
    Config(String),

    #[error(transparent)]
    Type(#[from] TypeError),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
