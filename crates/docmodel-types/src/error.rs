use thiserror::Error;

/// Errors produced while constructing identity primitives.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid object URI: {0}")]
    InvalidId(String),

    #[error("invalid type name for {uri}: {reason}")]
    InvalidTypeName { uri: String, reason: String },

    #[error("invalid spec version: {0}")]
    InvalidSpecVersion(String),
}
