use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// The persisted form of a reference to a composite object.
///
/// A typed value names the object, its concrete type and the spec version
/// its shape complies with. Stores never inline composite values; they hold
/// typed values instead.
///
/// `TypedValue::new` only checks that the parts are non-empty. Checking the
/// type name against the registered types of the spec version is the
/// registry's job (`ModelRegistry::typed_value` in `docmodel-core`).
///
/// Equality and hashing consider the object URI and the type name; the spec
/// version is carried along but does not distinguish two references.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TypedValue {
    object_uri: String,
    type_name: String,
    spec_version: String,
}

impl TypedValue {
    pub fn new(
        object_uri: impl Into<String>,
        type_name: impl Into<String>,
        spec_version: impl Into<String>,
    ) -> Result<Self, TypeError> {
        let object_uri = object_uri.into();
        let type_name = type_name.into();
        let spec_version = spec_version.into();
        if object_uri.is_empty() {
            return Err(TypeError::InvalidId("object URI must not be empty".into()));
        }
        if type_name.is_empty() {
            return Err(TypeError::InvalidTypeName {
                uri: object_uri,
                reason: "type name must not be empty".into(),
            });
        }
        if spec_version.is_empty() {
            return Err(TypeError::InvalidSpecVersion(
                "spec version must not be empty".into(),
            ));
        }
        Ok(Self {
            object_uri,
            type_name,
            spec_version,
        })
    }

    pub fn object_uri(&self) -> &str {
        &self.object_uri
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn spec_version(&self) -> &str {
        &self.spec_version
    }
}

impl PartialEq for TypedValue {
    fn eq(&self, other: &Self) -> bool {
        self.object_uri == other.object_uri && self.type_name == other.type_name
    }
}

impl Eq for TypedValue {}

impl Hash for TypedValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.object_uri.hash(state);
        self.type_name.hash(state);
    }
}

impl fmt::Display for TypedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.type_name, self.object_uri)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_parts() {
        assert!(matches!(
            TypedValue::new("", "Widget", "3.0.0"),
            Err(TypeError::InvalidId(_))
        ));
        assert!(matches!(
            TypedValue::new("urn:w1", "", "3.0.0"),
            Err(TypeError::InvalidTypeName { .. })
        ));
        assert!(matches!(
            TypedValue::new("urn:w1", "Widget", ""),
            Err(TypeError::InvalidSpecVersion(_))
        ));
    }

    #[test]
    fn accessors() {
        let tv = TypedValue::new("urn:w1", "Widget", "3.0.0").unwrap();
        assert_eq!(tv.object_uri(), "urn:w1");
        assert_eq!(tv.type_name(), "Widget");
        assert_eq!(tv.spec_version(), "3.0.0");
        assert_eq!(tv.to_string(), "Widget:urn:w1");
    }

    #[test]
    fn equality_ignores_spec_version() {
        let a = TypedValue::new("urn:w1", "Widget", "3.0.0").unwrap();
        let b = TypedValue::new("urn:w1", "Widget", "3.0.1").unwrap();
        let c = TypedValue::new("urn:w1", "Gadget", "3.0.0").unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
