//! Small model used by the unit tests: spec version "3.0.0" with the
//! object types `Widget` and `Gadget`, a `Color` vocabulary and one named
//! individual.

use std::collections::HashSet;
use std::sync::Arc;

use docmodel_store::InMemoryModelStore;
use docmodel_types::PropertyDescriptor;

use crate::binding::SharedStore;
use crate::copy::{ModelCopyManager, SharedCopyManager};
use crate::error::CoreResult;
use crate::individual::Individual;
use crate::model_info::{ModelType, StaticModelInfo};
use crate::object::{ModelObject, ModelObjectBuilder};
use crate::registry::ModelRegistry;

pub(crate) const SPEC_VERSION: &str = "3.0.0";
pub(crate) const NAMESPACE: &str = "urn:test:core#";
pub(crate) const RED: &str = "urn:test:vocab#Red";
pub(crate) const NO_ASSERTION: &str = "urn:test:vocab#NoAssertion";
pub(crate) const SPECIAL: &str = "urn:test:ind#Special";

pub(crate) fn prop(name: &str) -> PropertyDescriptor {
    PropertyDescriptor::new(name, NAMESPACE)
}

#[derive(Debug)]
pub(crate) struct TestType {
    name: &'static str,
    related: &'static [&'static str],
    requires_name: bool,
}

impl ModelType for TestType {
    fn type_name(&self) -> &str {
        self.name
    }

    fn is_related_element(&self, property: &PropertyDescriptor) -> bool {
        self.related.iter().any(|r| *r == property.name())
    }

    fn verify(
        &self,
        object: &ModelObject,
        _verified: &mut HashSet<String>,
        _spec_version: &str,
    ) -> CoreResult<Vec<String>> {
        if self.requires_name && object.get_string_property_value(&prop("name"))?.is_none() {
            return Ok(vec![format!("{}: missing name", object.object_uri())]);
        }
        Ok(Vec::new())
    }
}

pub(crate) fn widget_type() -> Arc<dyn ModelType> {
    Arc::new(TestType {
        name: "Widget",
        related: &["peer"],
        requires_name: true,
    })
}

pub(crate) fn gadget_type() -> Arc<dyn ModelType> {
    Arc::new(TestType {
        name: "Gadget",
        related: &["related"],
        requires_name: false,
    })
}

pub(crate) fn model_info() -> StaticModelInfo {
    StaticModelInfo::new([SPEC_VERSION])
        .with_type(widget_type())
        .with_type(gadget_type())
        .with_enum(Individual::typed(RED, "Color"))
        .with_enum(Individual::typed("urn:test:vocab#Blue", "Color"))
        .with_individual(Individual::typed(SPECIAL, "Special"))
}

pub(crate) fn registry() -> ModelRegistry {
    let registry = ModelRegistry::new();
    registry.register_model(Arc::new(model_info())).unwrap();
    registry
}

pub(crate) fn new_store() -> SharedStore {
    Arc::new(InMemoryModelStore::new())
}

pub(crate) fn widget(registry: &ModelRegistry, store: &SharedStore, uri: &str) -> ModelObject {
    ModelObjectBuilder::new(registry.clone(), store.clone(), uri, SPEC_VERSION)
        .build(widget_type())
        .unwrap()
}

pub(crate) fn gadget(registry: &ModelRegistry, store: &SharedStore, uri: &str) -> ModelObject {
    ModelObjectBuilder::new(registry.clone(), store.clone(), uri, SPEC_VERSION)
        .build(gadget_type())
        .unwrap()
}

pub(crate) fn widget_with_copy(registry: &ModelRegistry, store: &SharedStore, uri: &str) -> ModelObject {
    let copy_manager: SharedCopyManager = Arc::new(ModelCopyManager::new(registry.clone()));
    ModelObjectBuilder::new(registry.clone(), store.clone(), uri, SPEC_VERSION)
        .copy_manager(Some(copy_manager))
        .build(widget_type())
        .unwrap()
}
