use std::fmt;
use std::hash::{Hash, Hasher};

use docmodel_types::IndividualUri;

/// A constant or vocabulary value addressed only by its URI.
///
/// The optional type name records which vocabulary a resolved individual
/// belongs to so collections can check element types. It is not part of the
/// value: equality and hashing derive from the URI alone, and the stored
/// form ([`IndividualUri`]) drops it.
#[derive(Clone, Debug)]
pub struct Individual {
    uri: String,
    type_name: Option<String>,
}

impl Individual {
    /// An individual of no particular vocabulary.
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            type_name: None,
        }
    }

    /// An individual belonging to the named vocabulary.
    pub fn typed(uri: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            type_name: Some(type_name.into()),
        }
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn type_name(&self) -> Option<&str> {
        self.type_name.as_deref()
    }

    /// The stored form: the URI and nothing else.
    pub fn to_uri_value(&self) -> IndividualUri {
        IndividualUri::new(self.uri.clone())
    }
}

impl PartialEq for Individual {
    fn eq(&self, other: &Self) -> bool {
        self.uri == other.uri
    }
}

impl Eq for Individual {}

impl Hash for Individual {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.uri.hash(state);
    }
}

impl From<IndividualUri> for Individual {
    fn from(uri: IndividualUri) -> Self {
        Individual::new(uri.as_str())
    }
}

impl fmt::Display for Individual {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.uri)
    }
}
