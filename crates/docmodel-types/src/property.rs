use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifies a property slot on a model object.
///
/// Two descriptors are equal only when both the name and the namespace are
/// equal.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PropertyDescriptor {
    name: String,
    namespace: String,
}

impl PropertyDescriptor {
    pub fn new(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
        }
    }

    /// Local property name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Namespace the name is scoped to.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }
}

impl fmt::Display for PropertyDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.namespace, self.name)
    }
}
