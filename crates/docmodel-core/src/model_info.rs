//! Contracts a versioned type package implements to plug into the registry.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use docmodel_types::{local_part, PropertyDescriptor};

use crate::error::{CoreError, CoreResult};
use crate::individual::Individual;
use crate::object::{ModelObject, ModelObjectBuilder};

/// Type-specific behavior attached to a [`ModelObject`] handle.
///
/// A model type carries no per-object data; the handle owns the identity
/// and every value lives in the store.
pub trait ModelType: Send + Sync + fmt::Debug {
    /// Name of the type as recorded in the store.
    fn type_name(&self) -> &str;

    /// Whether objects of this type may be used where `type_name` is
    /// expected.
    fn is_assignable_to(&self, type_name: &str) -> bool {
        self.type_name() == type_name
    }

    /// Whether a property points at a related element. Comparisons that
    /// ignore related elements skip these properties and do not recurse
    /// through them.
    fn is_related_element(&self, _property: &PropertyDescriptor) -> bool {
        false
    }

    /// Whether handles of this type stand for objects held outside any
    /// store. External handles ignore writes and read as empty.
    fn is_external(&self) -> bool {
        false
    }

    /// Type-specific verification. `verified` holds the URIs already
    /// visited in this pass. Data problems are returned as warnings; an
    /// `Err` aborts the whole pass.
    fn verify(
        &self,
        _object: &ModelObject,
        _verified: &mut HashSet<String>,
        _spec_version: &str,
    ) -> CoreResult<Vec<String>> {
        Ok(Vec::new())
    }
}

/// Built-in type of handles for externally defined elements.
#[derive(Debug, Default, Clone, Copy)]
pub struct ExternalElementType;

impl ModelType for ExternalElementType {
    fn type_name(&self) -> &str {
        "ExternalElement"
    }

    fn is_assignable_to(&self, _type_name: &str) -> bool {
        true
    }

    fn is_external(&self) -> bool {
        true
    }
}

/// A type package: everything the registry needs to know about the model
/// types of one or more spec versions.
pub trait ModelInfo: Send + Sync {
    /// Spec versions this package serves.
    fn spec_versions(&self) -> Vec<String>;

    /// Enumeration constant for a URI.
    fn uri_to_enum(&self, uri: &str) -> Option<Individual>;

    /// Named individual for a URI. `type_hint` narrows the lookup to one
    /// vocabulary when given.
    fn uri_to_individual(&self, uri: &str, type_hint: Option<&str>) -> Option<Individual>;

    /// Model type registered under `type_name`.
    fn model_type(&self, type_name: &str) -> Option<Arc<dyn ModelType>>;

    /// Build a handle of the named type.
    fn create_model_object(
        &self,
        builder: ModelObjectBuilder,
        type_name: &str,
    ) -> CoreResult<ModelObject> {
        let model_type = self.model_type(type_name).ok_or_else(|| {
            CoreError::Registry(format!(
                "type {type_name} does not exist for spec version {}",
                builder.spec_version()
            ))
        })?;
        builder.build(model_type)
    }

    /// Build a handle for an element defined outside the store.
    fn create_external_element(&self, builder: ModelObjectBuilder) -> CoreResult<ModelObject> {
        Ok(builder.build_external(Arc::new(ExternalElementType)))
    }

    /// Whether an individual URI is the model's "no value asserted"
    /// sentinel. Defaults to a local name of `NoAssertion`, ignoring case.
    fn is_absent_sentinel(&self, uri: &str) -> bool {
        local_part(uri).eq_ignore_ascii_case("NoAssertion")
    }
}

/// Factory building a handle from a prepared builder.
pub type ObjectFactory = Arc<dyn Fn(ModelObjectBuilder) -> CoreResult<ModelObject> + Send + Sync>;

/// Table-driven [`ModelInfo`]: string-keyed maps of types, factories,
/// enumeration constants and individuals.
///
/// ```ignore
/// let info = StaticModelInfo::new(["3.0.0"])
///     .with_type(Arc::new(WidgetType))
///     .with_enum(Individual::typed("urn:vocab#Red", "Color"));
/// registry.register_model(Arc::new(info))?;
/// ```
#[derive(Default)]
pub struct StaticModelInfo {
    spec_versions: Vec<String>,
    types: HashMap<String, Arc<dyn ModelType>>,
    factories: HashMap<String, ObjectFactory>,
    enums: HashMap<String, Individual>,
    individuals: HashMap<String, Individual>,
    sentinels: HashSet<String>,
}

impl StaticModelInfo {
    pub fn new<I, S>(spec_versions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            spec_versions: spec_versions.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Register a model type under its own name.
    pub fn with_type(mut self, model_type: Arc<dyn ModelType>) -> Self {
        self.types
            .insert(model_type.type_name().to_string(), model_type);
        self
    }

    /// Override handle construction for a type name.
    pub fn with_factory(mut self, type_name: impl Into<String>, factory: ObjectFactory) -> Self {
        self.factories.insert(type_name.into(), factory);
        self
    }

    pub fn with_enum(mut self, constant: Individual) -> Self {
        self.enums.insert(constant.uri().to_string(), constant);
        self
    }

    pub fn with_individual(mut self, individual: Individual) -> Self {
        self.individuals
            .insert(individual.uri().to_string(), individual);
        self
    }

    /// Treat an additional URI as the absent sentinel.
    pub fn with_sentinel(mut self, uri: impl Into<String>) -> Self {
        self.sentinels.insert(uri.into());
        self
    }
}

impl ModelInfo for StaticModelInfo {
    fn spec_versions(&self) -> Vec<String> {
        self.spec_versions.clone()
    }

    fn uri_to_enum(&self, uri: &str) -> Option<Individual> {
        self.enums.get(uri).cloned()
    }

    fn uri_to_individual(&self, uri: &str, type_hint: Option<&str>) -> Option<Individual> {
        let found = self.individuals.get(uri)?;
        match (type_hint, found.type_name()) {
            (Some(hint), Some(actual)) if hint != actual => None,
            _ => Some(found.clone()),
        }
    }

    fn model_type(&self, type_name: &str) -> Option<Arc<dyn ModelType>> {
        self.types.get(type_name).cloned()
    }

    fn create_model_object(
        &self,
        builder: ModelObjectBuilder,
        type_name: &str,
    ) -> CoreResult<ModelObject> {
        if let Some(factory) = self.factories.get(type_name) {
            return factory(builder);
        }
        let model_type = self.model_type(type_name).ok_or_else(|| {
            CoreError::Registry(format!(
                "type {type_name} does not exist for spec version {}",
                builder.spec_version()
            ))
        })?;
        builder.build(model_type)
    }

    fn is_absent_sentinel(&self, uri: &str) -> bool {
        self.sentinels.contains(uri) || local_part(uri).eq_ignore_ascii_case("NoAssertion")
    }
}

impl fmt::Debug for StaticModelInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut types: Vec<&String> = self.types.keys().collect();
        types.sort();
        f.debug_struct("StaticModelInfo")
            .field("spec_versions", &self.spec_versions)
            .field("types", &types)
            .field("enums", &self.enums.len())
            .field("individuals", &self.individuals.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Plain;

    impl ModelType for Plain {
        fn type_name(&self) -> &str {
            "Plain"
        }
    }

    fn info() -> StaticModelInfo {
        StaticModelInfo::new(["1.0"])
            .with_type(Arc::new(Plain))
            .with_enum(Individual::typed("urn:v#Red", "Color"))
            .with_individual(Individual::typed("urn:i#Special", "Thing"))
            .with_sentinel("urn:v#Unset")
    }

    #[test]
    fn lookups() {
        let info = info();
        assert_eq!(info.spec_versions(), vec!["1.0".to_string()]);
        assert!(info.model_type("Plain").is_some());
        assert!(info.model_type("Other").is_none());
        assert_eq!(info.uri_to_enum("urn:v#Red").unwrap().type_name(), Some("Color"));
        assert!(info.uri_to_enum("urn:v#Green").is_none());
    }

    #[test]
    fn individual_lookup_honours_hint() {
        let info = info();
        assert!(info.uri_to_individual("urn:i#Special", None).is_some());
        assert!(info.uri_to_individual("urn:i#Special", Some("Thing")).is_some());
        assert!(info.uri_to_individual("urn:i#Special", Some("Color")).is_none());
    }

    #[test]
    fn sentinels() {
        let info = info();
        assert!(info.is_absent_sentinel("urn:v#NoAssertion"));
        assert!(info.is_absent_sentinel("urn:v/noassertion"));
        assert!(info.is_absent_sentinel("urn:v#Unset"));
        assert!(!info.is_absent_sentinel("urn:v#Red"));
    }

    #[test]
    fn external_type_is_assignable_anywhere() {
        assert!(ExternalElementType.is_external());
        assert!(ExternalElementType.is_assignable_to("Widget"));
        assert!(!Plain.is_external());
        assert!(!Plain.is_assignable_to("Widget"));
    }
}
