//! Values as they are held by a store.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::typed_value::TypedValue;

/// The persisted form of an individual: a URI and nothing else.
///
/// Equality and hashing derive only from the URI.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct IndividualUri(String);

impl IndividualUri {
    pub fn new(uri: impl Into<String>) -> Self {
        Self(uri.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IndividualUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Closed set of values a store can hold in a property slot.
///
/// Scalars are stored as-is. Composite objects are only ever stored as a
/// [`TypedValue`] and individuals as an [`IndividualUri`]. `List` is the
/// container form; its elements are never lists themselves.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum StoredValue {
    String(String),
    Boolean(bool),
    Integer(i64),
    Double(f64),
    Reference(TypedValue),
    Individual(IndividualUri),
    List(Vec<StoredValue>),
}

impl StoredValue {
    /// The kind of a non-container value. Lists have no single kind.
    pub fn kind(&self) -> Option<StoredKind> {
        match self {
            StoredValue::String(_) => Some(StoredKind::String),
            StoredValue::Boolean(_) => Some(StoredKind::Boolean),
            StoredValue::Integer(_) => Some(StoredKind::Integer),
            StoredValue::Double(_) => Some(StoredKind::Double),
            StoredValue::Reference(_) => Some(StoredKind::Reference),
            StoredValue::Individual(_) => Some(StoredKind::Individual),
            StoredValue::List(_) => None,
        }
    }

    /// Whether this value may appear where `kind` is expected.
    ///
    /// An individual URI is accepted where a reference is expected: external
    /// objects are persisted as individual URIs.
    pub fn is_assignable_to(&self, kind: StoredKind) -> bool {
        match (self.kind(), kind) {
            (Some(StoredKind::Individual), StoredKind::Reference) => true,
            (Some(actual), expected) => actual == expected,
            (None, _) => false,
        }
    }
}

impl From<&str> for StoredValue {
    fn from(s: &str) -> Self {
        StoredValue::String(s.to_string())
    }
}

impl From<String> for StoredValue {
    fn from(s: String) -> Self {
        StoredValue::String(s)
    }
}

impl From<bool> for StoredValue {
    fn from(b: bool) -> Self {
        StoredValue::Boolean(b)
    }
}

impl From<i64> for StoredValue {
    fn from(i: i64) -> Self {
        StoredValue::Integer(i)
    }
}

impl From<f64> for StoredValue {
    fn from(d: f64) -> Self {
        StoredValue::Double(d)
    }
}

impl From<TypedValue> for StoredValue {
    fn from(tv: TypedValue) -> Self {
        StoredValue::Reference(tv)
    }
}

impl From<IndividualUri> for StoredValue {
    fn from(uri: IndividualUri) -> Self {
        StoredValue::Individual(uri)
    }
}

/// Kind of a stored value, used for assignability checks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StoredKind {
    String,
    Boolean,
    Integer,
    Double,
    Reference,
    Individual,
}

impl fmt::Display for StoredKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StoredKind::String => "string",
            StoredKind::Boolean => "boolean",
            StoredKind::Integer => "integer",
            StoredKind::Double => "double",
            StoredKind::Reference => "reference",
            StoredKind::Individual => "individual",
        };
        f.write_str(name)
    }
}
