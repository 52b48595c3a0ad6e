//! Id-kind classification.
//!
//! The kind of an object URI is inferred from its shape. Identity rules
//! depend on it (anonymous ids are scoped to their store), so a store must
//! classify with the same [`IdScheme`] for its whole lifetime.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Kind of an object identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IdType {
    /// Local to one store, never portable.
    Anonymous,
    /// Reference to a document or element held elsewhere.
    ExternalRef,
    /// Member of a published list of constants (e.g. listed licenses).
    ListedConstant,
    /// Identifier following the spec-defined element id form.
    SpecDefined,
    /// Anything that fits none of the above.
    Unknown,
}

impl fmt::Display for IdType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IdType::Anonymous => "anonymous",
            IdType::ExternalRef => "external-ref",
            IdType::ListedConstant => "listed-constant",
            IdType::SpecDefined => "spec-defined",
            IdType::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// String shapes used to classify and generate identifiers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdScheme {
    /// Prefix of every anonymous id.
    pub anonymous_prefix: String,
    /// Prefix of the local part of a spec-defined id.
    pub spec_id_marker: String,
    /// Prefix of the local part of an external reference id.
    pub external_ref_marker: String,
    /// Namespaces whose members are listed constants.
    pub listed_namespaces: Vec<String>,
}

impl Default for IdScheme {
    fn default() -> Self {
        Self {
            anonymous_prefix: "__anon__".into(),
            spec_id_marker: "SpecRef-".into(),
            external_ref_marker: "ExternalRef-".into(),
            listed_namespaces: Vec::new(),
        }
    }
}

impl IdScheme {
    /// Classify an object URI by its shape.
    pub fn classify(&self, object_uri: &str) -> IdType {
        if object_uri.starts_with(&self.anonymous_prefix) {
            return IdType::Anonymous;
        }
        if self
            .listed_namespaces
            .iter()
            .any(|ns| !ns.is_empty() && object_uri.starts_with(ns.as_str()))
        {
            return IdType::ListedConstant;
        }
        let local = local_part(object_uri);
        if local.starts_with(&self.external_ref_marker) {
            IdType::ExternalRef
        } else if local.starts_with(&self.spec_id_marker) {
            IdType::SpecDefined
        } else {
            IdType::Unknown
        }
    }
}

/// The part of a URI after its last `#` or `/`.
pub fn local_part(uri: &str) -> &str {
    match uri.rfind(|c| c == '#' || c == '/') {
        Some(pos) => &uri[pos + 1..],
        None => uri,
    }
}
