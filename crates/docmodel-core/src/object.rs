//! The stateless model-object handle.
//!
//! A [`ModelObject`] is the tuple (store, object URI, spec version, copy
//! manager, strict flag, id prefix) plus the [`ModelType`] that supplies its
//! type-specific behavior. It never caches property values: every read goes
//! to the store and every write goes straight back.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use docmodel_types::{PropertyDescriptor, TypedValue};
use parking_lot::Mutex;
use tracing::{debug, error, warn};

use crate::binding::{same_store, store_addr, SharedStore, StoreBinding};
use crate::collection::{ModelCollection, ModelSet};
use crate::convert;
use crate::copy::SharedCopyManager;
use crate::equivalence::NotEquivalentReason;
use crate::error::{CoreError, CoreResult};
use crate::individual::Individual;
use crate::model_info::ModelType;
use crate::registry::ModelRegistry;
use crate::value::{ElementType, ModelValue, PropertyValue};

/// A change captured now and applied later by calling it.
pub type ModelUpdate = Box<dyn FnOnce() -> CoreResult<()> + Send>;

/// Parameters for constructing a [`ModelObject`].
///
/// Creation of a missing store entry is enabled by default; use
/// `.create(false)` to require an existing entry.
#[derive(Clone, Debug)]
pub struct ModelObjectBuilder {
    binding: StoreBinding,
    object_uri: String,
    create: bool,
    strict: bool,
}

impl ModelObjectBuilder {
    pub fn new(
        registry: ModelRegistry,
        store: SharedStore,
        object_uri: impl Into<String>,
        spec_version: impl Into<String>,
    ) -> Self {
        Self {
            binding: StoreBinding::new(registry, store, spec_version),
            object_uri: object_uri.into(),
            create: true,
            strict: true,
        }
    }

    pub fn copy_manager(mut self, copy_manager: Option<SharedCopyManager>) -> Self {
        self.binding = self.binding.with_copy_manager(copy_manager);
        self
    }

    pub fn create(mut self, create: bool) -> Self {
        self.create = create;
        self
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn id_prefix(mut self, id_prefix: Option<String>) -> Self {
        self.binding = self.binding.with_id_prefix(id_prefix);
        self
    }

    pub fn object_uri(&self) -> &str {
        &self.object_uri
    }

    pub fn spec_version(&self) -> &str {
        self.binding.spec_version()
    }

    pub fn store(&self) -> &SharedStore {
        self.binding.store()
    }

    pub fn registry(&self) -> &ModelRegistry {
        self.binding.registry()
    }

    pub fn creates(&self) -> bool {
        self.create
    }

    /// Attach to (or create) the store entry and return the handle.
    pub fn build(self, model_type: Arc<dyn ModelType>) -> CoreResult<ModelObject> {
        ModelObject::attach(self, model_type)
    }

    /// Build a handle that stands for an element outside the store. The
    /// store is never consulted.
    pub fn build_external(self, model_type: Arc<dyn ModelType>) -> ModelObject {
        ModelObject::from_parts(self.binding, self.object_uri, model_type, self.strict)
    }
}

/// Stateless handle onto one entry of a model store.
///
/// Two handles are equal when they name the same URI. Anonymous URIs are
/// only meaningful within a store, so for those the store must match too.
#[derive(Clone)]
pub struct ModelObject {
    binding: StoreBinding,
    object_uri: String,
    model_type: Arc<dyn ModelType>,
    strict: bool,
    last_not_equivalent: Arc<Mutex<Option<NotEquivalentReason>>>,
}

impl ModelObject {
    fn from_parts(
        binding: StoreBinding,
        object_uri: String,
        model_type: Arc<dyn ModelType>,
        strict: bool,
    ) -> Self {
        Self {
            binding,
            object_uri,
            model_type,
            strict,
            last_not_equivalent: Arc::new(Mutex::new(None)),
        }
    }

    fn attach(builder: ModelObjectBuilder, model_type: Arc<dyn ModelType>) -> CoreResult<Self> {
        let ModelObjectBuilder {
            binding,
            object_uri,
            create,
            strict,
        } = builder;
        if !binding.registry().contains_spec_version(binding.spec_version()) {
            error!(uri = %object_uri, spec_version = %binding.spec_version(), "unregistered spec version");
            return Err(CoreError::Registry(format!(
                "spec version {} is not registered",
                binding.spec_version()
            )));
        }
        let object = Self::from_parts(binding, object_uri, model_type, strict);
        let store = object.store();
        match store.typed_value(&object.object_uri)? {
            Some(existing) => object.check_existing(&existing, create)?,
            None if create => {
                let _lock = store.enter_critical_section(false)?;
                // Another thread may have created it while we waited.
                match store.typed_value(&object.object_uri)? {
                    Some(existing) => object.check_existing(&existing, true)?,
                    None => {
                        store.create(&object.to_typed_value()?)?;
                        debug!(uri = %object.object_uri, type_name = %object.type_name(), "created model object");
                    }
                }
            }
            None => {
                error!(uri = %object.object_uri, "object does not exist and creation is disabled");
                return Err(CoreError::IdNotFound(object.object_uri));
            }
        }
        Ok(object)
    }

    fn check_existing(&self, existing: &TypedValue, create: bool) -> CoreResult<()> {
        if existing.type_name() == self.type_name() {
            return Ok(());
        }
        error!(
            uri = %self.object_uri,
            existing_type = %existing.type_name(),
            requested_type = %self.type_name(),
            "type mismatch on existing object"
        );
        if create {
            Err(CoreError::IdInUse {
                uri: self.object_uri.clone(),
                existing_type: existing.type_name().to_string(),
                requested_type: self.type_name().to_string(),
            })
        } else {
            Err(CoreError::InvalidType(format!(
                "{} has type {}, not {}",
                self.object_uri,
                existing.type_name(),
                self.type_name()
            )))
        }
    }

    // ---- accessors -------------------------------------------------------

    pub fn object_uri(&self) -> &str {
        &self.object_uri
    }

    pub fn type_name(&self) -> &str {
        self.model_type.type_name()
    }

    pub fn model_type(&self) -> &Arc<dyn ModelType> {
        &self.model_type
    }

    pub fn store(&self) -> &SharedStore {
        self.binding.store()
    }

    pub fn registry(&self) -> &ModelRegistry {
        self.binding.registry()
    }

    pub fn spec_version(&self) -> &str {
        self.binding.spec_version()
    }

    pub fn id_prefix(&self) -> Option<&str> {
        self.binding.id_prefix()
    }

    pub fn binding(&self) -> &StoreBinding {
        &self.binding
    }

    pub fn copy_manager(&self) -> Option<&SharedCopyManager> {
        self.binding.copy_manager()
    }

    pub fn set_copy_manager(&mut self, copy_manager: Option<SharedCopyManager>) {
        self.binding.set_copy_manager(copy_manager);
    }

    /// Whether strict input checking is enabled. Model types consult this
    /// in their own validation.
    pub fn is_strict(&self) -> bool {
        self.strict
    }

    pub fn set_strict(&mut self, strict: bool) {
        self.strict = strict;
    }

    /// Whether this handle stands for an element outside the store.
    pub fn is_external(&self) -> bool {
        self.model_type.is_external()
    }

    pub(crate) fn record_not_equivalent(&self, reason: Option<NotEquivalentReason>) {
        *self.last_not_equivalent.lock() = reason;
    }

    /// Why the last [`equivalent`](Self::equivalent) call on this handle
    /// returned `false`, if it did.
    pub fn last_not_equivalent_reason(&self) -> Option<NotEquivalentReason> {
        self.last_not_equivalent.lock().clone()
    }

    /// The stored form of a reference to this object.
    pub fn to_typed_value(&self) -> CoreResult<TypedValue> {
        self.registry()
            .typed_value(&self.object_uri, self.type_name(), self.spec_version())
    }

    /// Enter a critical section on the handle's store.
    pub fn enter_critical_section(
        &self,
        read_lock_requested: bool,
    ) -> CoreResult<docmodel_store::CriticalSection<'_>> {
        Ok(self.store().enter_critical_section(read_lock_requested)?)
    }

    pub fn leave_critical_section(&self, lock: docmodel_store::CriticalSection<'_>) {
        self.store().leave_critical_section(lock);
    }

    fn ignore_external(&self, operation: &str) -> bool {
        if self.is_external() {
            warn!(uri = %self.object_uri, operation, "ignoring mutation of an external element");
            return true;
        }
        false
    }

    // ---- property reads --------------------------------------------------

    /// Descriptors of every property currently set on the object.
    pub fn property_descriptors(&self) -> CoreResult<Vec<PropertyDescriptor>> {
        if self.is_external() {
            return Ok(Vec::new());
        }
        Ok(self.store().property_descriptors(&self.object_uri)?)
    }

    /// Read a property. Collections come back as a live view.
    ///
    /// A non-strict handle hands out non-strict handles.
    pub fn get_object_property_value(
        &self,
        property: &PropertyDescriptor,
    ) -> CoreResult<Option<PropertyValue>> {
        if self.is_external() {
            return Ok(None);
        }
        let store = self.store();
        let _lock = store.enter_critical_section(false)?;
        if !store.exists(&self.object_uri) {
            return Ok(None);
        }
        if store.is_collection_property(&self.object_uri, property)? {
            let collection = ModelCollection::new(
                self.binding.clone(),
                self.object_uri.clone(),
                property.clone(),
                None,
            )?;
            return Ok(Some(PropertyValue::Collection(collection)));
        }
        let Some(stored) = store.get_value(&self.object_uri, property)? else {
            return Ok(None);
        };
        let mut value = convert::to_model(stored, &self.binding, None)?;
        if let ModelValue::Object(object) = &mut value {
            if !self.strict {
                object.set_strict(false);
            }
        }
        Ok(Some(PropertyValue::Single(value)))
    }

    fn get_single(&self, property: &PropertyDescriptor, expected: &str) -> CoreResult<Option<ModelValue>> {
        match self.get_object_property_value(property)? {
            None => Ok(None),
            Some(PropertyValue::Single(value)) => Ok(Some(value)),
            Some(PropertyValue::Collection(_)) => Err(CoreError::InvalidType(format!(
                "property {property} holds a collection, not a {expected}"
            ))),
        }
    }

    pub fn get_string_property_value(&self, property: &PropertyDescriptor) -> CoreResult<Option<String>> {
        match self.get_single(property, "String")? {
            None => Ok(None),
            Some(ModelValue::String(s)) => Ok(Some(s)),
            Some(_) => Err(CoreError::InvalidType(format!("property {property} is not of type String"))),
        }
    }

    pub fn get_integer_property_value(&self, property: &PropertyDescriptor) -> CoreResult<Option<i64>> {
        match self.get_single(property, "Integer")? {
            None => Ok(None),
            Some(ModelValue::Integer(i)) => Ok(Some(i)),
            Some(_) => Err(CoreError::InvalidType(format!("property {property} is not of type Integer"))),
        }
    }

    pub fn get_double_property_value(&self, property: &PropertyDescriptor) -> CoreResult<Option<f64>> {
        match self.get_single(property, "Double")? {
            None => Ok(None),
            Some(ModelValue::Double(d)) => Ok(Some(d)),
            Some(_) => Err(CoreError::InvalidType(format!("property {property} is not of type Double"))),
        }
    }

    /// Boolean value of a property. The strings `true` and `false` are
    /// accepted in any case.
    pub fn get_boolean_property_value(&self, property: &PropertyDescriptor) -> CoreResult<Option<bool>> {
        match self.get_single(property, "Boolean")? {
            None => Ok(None),
            Some(ModelValue::Boolean(b)) => Ok(Some(b)),
            Some(ModelValue::String(s)) if s.eq_ignore_ascii_case("true") => Ok(Some(true)),
            Some(ModelValue::String(s)) if s.eq_ignore_ascii_case("false") => Ok(Some(false)),
            Some(_) => Err(CoreError::InvalidType(format!("property {property} is not of type Boolean"))),
        }
    }

    /// Enumeration constant held by a property.
    pub fn get_enum_property_value(&self, property: &PropertyDescriptor) -> CoreResult<Option<Individual>> {
        let uri = match self.get_single(property, "enumeration")? {
            None => return Ok(None),
            Some(ModelValue::Individual(i)) => i.uri().to_string(),
            Some(ModelValue::Object(o)) if o.is_external() => o.object_uri().to_string(),
            Some(_) => {
                return Err(CoreError::InvalidType(format!(
                    "property {property} is not of type individual value or enum"
                )))
            }
        };
        match self.registry().uri_to_enum(&uri, self.spec_version())? {
            Some(constant) => Ok(Some(constant)),
            None => {
                error!(uri = %uri, "unknown individual value for enum");
                Err(CoreError::Registry(format!("unknown individual value for enum: {uri}")))
            }
        }
    }

    /// Composite object held by a property.
    pub fn get_object_value(&self, property: &PropertyDescriptor) -> CoreResult<Option<ModelObject>> {
        match self.get_single(property, "model object")? {
            None => Ok(None),
            Some(ModelValue::Object(o)) => Ok(Some(o)),
            Some(other) => Err(CoreError::InvalidType(format!(
                "property {property} holds a {}, not a model object",
                other.kind_name()
            ))),
        }
    }

    // ---- property writes -------------------------------------------------

    /// Set a property. A [`ModelValue::List`] replaces the whole collection.
    pub fn set_property_value(
        &self,
        property: &PropertyDescriptor,
        value: impl Into<ModelValue>,
    ) -> CoreResult<()> {
        if self.ignore_external("set_property_value") {
            return Ok(());
        }
        convert::set_property(&self.binding, &self.object_uri, property, value.into())
    }

    pub fn remove_property(&self, property: &PropertyDescriptor) -> CoreResult<()> {
        if self.ignore_external("remove_property") {
            return Ok(());
        }
        Ok(self.store().remove_property(&self.object_uri, property)?)
    }

    pub fn clear_value_collection(&self, property: &PropertyDescriptor) -> CoreResult<()> {
        if self.ignore_external("clear_value_collection") {
            return Ok(());
        }
        Ok(self.store().clear_value_collection(&self.object_uri, property)?)
    }

    /// Append a value to a collection property. Handles from other stores
    /// are copied in through the copy manager.
    pub fn add_property_value_to_collection(
        &self,
        property: &PropertyDescriptor,
        value: impl Into<ModelValue>,
    ) -> CoreResult<bool> {
        if self.ignore_external("add_property_value_to_collection") {
            return Ok(false);
        }
        convert::add_to_collection(&self.binding, &self.object_uri, property, &value.into())
    }

    pub fn remove_property_value_from_collection(
        &self,
        property: &PropertyDescriptor,
        value: &ModelValue,
    ) -> CoreResult<bool> {
        if self.ignore_external("remove_property_value_from_collection") {
            return Ok(false);
        }
        convert::remove_from_collection(&self.binding, &self.object_uri, property, value)
    }

    // ---- deferred updates ------------------------------------------------

    fn deferred<F>(&self, operation: &'static str, apply: F) -> ModelUpdate
    where
        F: FnOnce(StoreBinding, String) -> CoreResult<()> + Send + 'static,
    {
        if self.is_external() {
            let uri = self.object_uri.clone();
            return Box::new(move || {
                warn!(uri = %uri, operation, "ignoring mutation of an external element");
                Ok(())
            });
        }
        let binding = self.binding.clone();
        let uri = self.object_uri.clone();
        Box::new(move || apply(binding, uri))
    }

    pub fn update_property_value(
        &self,
        property: &PropertyDescriptor,
        value: impl Into<ModelValue>,
    ) -> ModelUpdate {
        let property = property.clone();
        let value = value.into();
        self.deferred("update_property_value", move |binding, uri| {
            convert::set_property(&binding, &uri, &property, value)
        })
    }

    pub fn update_remove_property(&self, property: &PropertyDescriptor) -> ModelUpdate {
        let property = property.clone();
        self.deferred("update_remove_property", move |binding, uri| {
            Ok(binding.store().remove_property(&uri, &property)?)
        })
    }

    pub fn update_clear_value_collection(&self, property: &PropertyDescriptor) -> ModelUpdate {
        let property = property.clone();
        self.deferred("update_clear_value_collection", move |binding, uri| {
            Ok(binding.store().clear_value_collection(&uri, &property)?)
        })
    }

    pub fn update_add_property_value_to_collection(
        &self,
        property: &PropertyDescriptor,
        value: impl Into<ModelValue>,
    ) -> ModelUpdate {
        let property = property.clone();
        let value = value.into();
        self.deferred("update_add_property_value_to_collection", move |binding, uri| {
            convert::add_to_collection(&binding, &uri, &property, &value).map(|_| ())
        })
    }

    pub fn update_remove_property_value_from_collection(
        &self,
        property: &PropertyDescriptor,
        value: ModelValue,
    ) -> ModelUpdate {
        let property = property.clone();
        self.deferred("update_remove_property_value_from_collection", move |binding, uri| {
            convert::remove_from_collection(&binding, &uri, &property, &value).map(|_| ())
        })
    }

    // ---- collection views ------------------------------------------------

    pub fn get_object_property_value_collection(
        &self,
        property: &PropertyDescriptor,
        element_type: Option<ElementType>,
    ) -> CoreResult<ModelCollection> {
        if self.is_external() {
            return Ok(ModelCollection::external(
                self.binding.clone(),
                self.object_uri.clone(),
                property.clone(),
                element_type,
            ));
        }
        ModelCollection::new(
            self.binding.clone(),
            self.object_uri.clone(),
            property.clone(),
            element_type,
        )
    }

    pub fn get_object_property_value_set(
        &self,
        property: &PropertyDescriptor,
        element_type: Option<ElementType>,
    ) -> CoreResult<ModelSet> {
        if self.is_external() {
            return Ok(ModelSet::external(
                self.binding.clone(),
                self.object_uri.clone(),
                property.clone(),
                element_type,
            ));
        }
        ModelSet::new(
            self.binding.clone(),
            self.object_uri.clone(),
            property.clone(),
            element_type,
        )
    }

    /// Set view over a collection of strings.
    pub fn get_string_collection(&self, property: &PropertyDescriptor) -> CoreResult<ModelSet> {
        if !self.is_collection_members_assignable_to(property, &ElementType::String)? {
            return Err(CoreError::InvalidType(format!(
                "property {property} does not contain a collection of Strings"
            )));
        }
        self.get_object_property_value_set(property, Some(ElementType::String))
    }

    pub fn is_collection_members_assignable_to(
        &self,
        property: &PropertyDescriptor,
        element_type: &ElementType,
    ) -> CoreResult<bool> {
        if self.is_external() {
            return Ok(true);
        }
        Ok(self.store().is_collection_members_assignable_to(
            &self.object_uri,
            property,
            element_type.stored_kind(),
        )?)
    }

    // ---- copy ------------------------------------------------------------

    /// Replace this object's properties with copies of `source`'s.
    pub fn copy_from(&self, source: &ModelObject) -> CoreResult<()> {
        if self.ignore_external("copy_from") {
            return Ok(());
        }
        let copy_manager = self.copy_manager().ok_or_else(|| {
            CoreError::IllegalState(format!("copying is not enabled for {}", self.object_uri))
        })?;
        copy_manager.copy_into(
            self.store(),
            &self.object_uri,
            source.store(),
            source.object_uri(),
            self.type_name(),
            self.spec_version(),
            None,
        )
    }

    /// Copy this object, under the same URI, into another store.
    pub fn clone_into(&self, store: SharedStore) -> CoreResult<ModelObject> {
        let copy_manager = self.copy_manager().cloned().ok_or_else(|| {
            CoreError::IllegalState("a copy manager must be provided to clone".into())
        })?;
        if same_store(self.store(), &store) {
            return Err(CoreError::IllegalState(
                "can not clone to the same model store".into(),
            ));
        }
        if store.exists(&self.object_uri) {
            return Err(CoreError::IllegalState(format!(
                "can not clone {}: it already exists",
                self.object_uri
            )));
        }
        let target = self.registry().inflate(
            store,
            &self.object_uri,
            self.type_name(),
            Some(copy_manager),
            self.spec_version(),
            true,
            self.id_prefix(),
        )?;
        target.copy_from(self)?;
        Ok(target)
    }
}

impl PartialEq for ModelObject {
    fn eq(&self, other: &Self) -> bool {
        if self.store().is_anon(&self.object_uri) {
            same_store(self.store(), other.store()) && self.object_uri == other.object_uri
        } else {
            self.object_uri == other.object_uri
        }
    }
}

impl Eq for ModelObject {}

impl Hash for ModelObject {
    fn hash<H: Hasher>(&self, state: &mut H) {
        if self.store().is_anon(&self.object_uri) {
            store_addr(self.store()).hash(state);
        }
        self.object_uri.hash(state);
    }
}

impl fmt::Display for ModelObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.type_name(), self.object_uri)
    }
}

impl fmt::Debug for ModelObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelObject")
            .field("type_name", &self.type_name())
            .field("object_uri", &self.object_uri)
            .field("spec_version", &self.spec_version())
            .field("strict", &self.strict)
            .field("external", &self.is_external())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{self, prop, SPEC_VERSION};
    use std::collections::HashSet;
    use std::thread;

    // ---------------------------------------------------------------
    // Construction
    // ---------------------------------------------------------------

    #[test]
    fn create_then_attach() {
        let registry = testing::registry();
        let store = testing::new_store();
        let w1 = testing::widget(&registry, &store, "urn:w1");
        assert_eq!(w1.type_name(), "Widget");
        assert!(store.exists("urn:w1"));

        let again = ModelObjectBuilder::new(registry.clone(), store.clone(), "urn:w1", SPEC_VERSION)
            .create(false)
            .build(testing::widget_type())
            .unwrap();
        assert_eq!(again, w1);
    }

    #[test]
    fn missing_object_without_create_is_id_not_found() {
        let registry = testing::registry();
        let store = testing::new_store();
        let err = ModelObjectBuilder::new(registry, store.clone(), "urn:w2", SPEC_VERSION)
            .create(false)
            .build(testing::widget_type())
            .unwrap_err();
        assert!(matches!(err, CoreError::IdNotFound(ref uri) if uri == "urn:w2"));
        assert!(!store.exists("urn:w2"));
    }

    #[test]
    fn type_mismatch_on_create_is_id_in_use() {
        let registry = testing::registry();
        let store = testing::new_store();
        testing::widget(&registry, &store, "urn:w1");
        let err = ModelObjectBuilder::new(registry, store, "urn:w1", SPEC_VERSION)
            .build(testing::gadget_type())
            .unwrap_err();
        assert!(matches!(err, CoreError::IdInUse { .. }));
    }

    #[test]
    fn type_mismatch_on_attach_is_invalid_type() {
        let registry = testing::registry();
        let store = testing::new_store();
        testing::widget(&registry, &store, "urn:w1");
        let err = ModelObjectBuilder::new(registry, store, "urn:w1", SPEC_VERSION)
            .create(false)
            .build(testing::gadget_type())
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidType(_)));
    }

    #[test]
    fn unregistered_spec_version_is_rejected() {
        let registry = testing::registry();
        let store = testing::new_store();
        let err = ModelObjectBuilder::new(registry, store.clone(), "urn:w1", "0.1")
            .build(testing::widget_type())
            .unwrap_err();
        assert!(matches!(err, CoreError::Registry(_)));
        assert!(!store.exists("urn:w1"));
    }

    #[test]
    fn concurrent_construction_creates_once() {
        let registry = testing::registry();
        let store = testing::new_store();
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = registry.clone();
                let store = store.clone();
                thread::spawn(move || testing::widget(&registry, &store, "urn:shared"))
            })
            .collect();
        let objects: Vec<ModelObject> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(objects.iter().all(|o| o == &objects[0]));
        assert_eq!(store.all_items(None, None).unwrap().len(), 1);
    }

    // ---------------------------------------------------------------
    // Property access
    // ---------------------------------------------------------------

    #[test]
    fn scalar_properties_round_trip() {
        let registry = testing::registry();
        let store = testing::new_store();
        let w = testing::widget(&registry, &store, "urn:w1");
        w.set_property_value(&prop("name"), "first").unwrap();
        w.set_property_value(&prop("count"), 3i64).unwrap();
        w.set_property_value(&prop("ratio"), 0.5f64).unwrap();
        w.set_property_value(&prop("enabled"), true).unwrap();

        assert_eq!(w.get_string_property_value(&prop("name")).unwrap().as_deref(), Some("first"));
        assert_eq!(w.get_integer_property_value(&prop("count")).unwrap(), Some(3));
        assert_eq!(w.get_double_property_value(&prop("ratio")).unwrap(), Some(0.5));
        assert_eq!(w.get_boolean_property_value(&prop("enabled")).unwrap(), Some(true));
        assert_eq!(w.get_string_property_value(&prop("missing")).unwrap(), None);
    }

    #[test]
    fn typed_accessor_rejects_other_kinds() {
        let registry = testing::registry();
        let store = testing::new_store();
        let w = testing::widget(&registry, &store, "urn:w1");
        w.set_property_value(&prop("count"), 3i64).unwrap();
        let err = w.get_string_property_value(&prop("count")).unwrap_err();
        assert!(matches!(err, CoreError::InvalidType(_)));
    }

    #[test]
    fn boolean_accepts_strings() {
        let registry = testing::registry();
        let store = testing::new_store();
        let w = testing::widget(&registry, &store, "urn:w1");
        w.set_property_value(&prop("flag"), "TRUE").unwrap();
        assert_eq!(w.get_boolean_property_value(&prop("flag")).unwrap(), Some(true));
        w.set_property_value(&prop("flag"), "False").unwrap();
        assert_eq!(w.get_boolean_property_value(&prop("flag")).unwrap(), Some(false));
        w.set_property_value(&prop("flag"), "maybe").unwrap();
        assert!(w.get_boolean_property_value(&prop("flag")).is_err());
    }

    #[test]
    fn enum_property() {
        let registry = testing::registry();
        let store = testing::new_store();
        let w = testing::widget(&registry, &store, "urn:w1");
        w.set_property_value(&prop("color"), Individual::new(testing::RED)).unwrap();
        let color = w.get_enum_property_value(&prop("color")).unwrap().unwrap();
        assert_eq!(color.uri(), testing::RED);
        assert_eq!(color.type_name(), Some("Color"));

        w.set_property_value(&prop("color"), Individual::new("urn:test:vocab#Mauve")).unwrap();
        assert!(w.get_enum_property_value(&prop("color")).is_err());
    }

    #[test]
    fn object_property_stored_as_reference() {
        let registry = testing::registry();
        let store = testing::new_store();
        let w = testing::widget(&registry, &store, "urn:w1");
        let g = testing::gadget(&registry, &store, "urn:g1");
        w.set_property_value(&prop("part"), g.clone()).unwrap();

        let stored = store.get_value("urn:w1", &prop("part")).unwrap().unwrap();
        assert!(matches!(stored, docmodel_types::StoredValue::Reference(ref tv) if tv.object_uri() == "urn:g1"));

        let read = w.get_object_value(&prop("part")).unwrap().unwrap();
        assert_eq!(read, g);
        assert_eq!(read.type_name(), "Gadget");
    }

    #[test]
    fn list_value_replaces_collection() {
        let registry = testing::registry();
        let store = testing::new_store();
        let w = testing::widget(&registry, &store, "urn:w1");
        w.add_property_value_to_collection(&prop("tags"), "old").unwrap();
        w.set_property_value(&prop("tags"), vec![ModelValue::from("a"), ModelValue::from("b")])
            .unwrap();
        let tags = w.get_object_property_value(&prop("tags")).unwrap().unwrap();
        let collection = tags.as_collection().unwrap();
        assert_eq!(collection.to_vec().unwrap(), vec![ModelValue::from("a"), ModelValue::from("b")]);
    }

    #[test]
    fn collection_mutations() {
        let registry = testing::registry();
        let store = testing::new_store();
        let w = testing::widget(&registry, &store, "urn:w1");
        assert!(w.add_property_value_to_collection(&prop("tags"), "a").unwrap());
        assert!(w.add_property_value_to_collection(&prop("tags"), "b").unwrap());
        assert!(w.remove_property_value_from_collection(&prop("tags"), &"a".into()).unwrap());
        assert!(!w.remove_property_value_from_collection(&prop("tags"), &"zzz".into()).unwrap());
        assert_eq!(store.collection_size("urn:w1", &prop("tags")).unwrap(), 1);
        w.clear_value_collection(&prop("tags")).unwrap();
        assert_eq!(store.collection_size("urn:w1", &prop("tags")).unwrap(), 0);
    }

    #[test]
    fn nested_list_is_invalid_type() {
        let registry = testing::registry();
        let store = testing::new_store();
        let w = testing::widget(&registry, &store, "urn:w1");
        let nested = ModelValue::List(vec![ModelValue::List(vec!["x".into()])]);
        let err = w.set_property_value(&prop("tags"), nested).unwrap_err();
        assert!(matches!(err, CoreError::InvalidType(_)));
    }

    #[test]
    fn string_collection_requires_strings() {
        let registry = testing::registry();
        let store = testing::new_store();
        let w = testing::widget(&registry, &store, "urn:w1");
        w.add_property_value_to_collection(&prop("tags"), "a").unwrap();
        assert_eq!(w.get_string_collection(&prop("tags")).unwrap().len().unwrap(), 1);
        w.add_property_value_to_collection(&prop("mixed"), 1i64).unwrap();
        assert!(matches!(
            w.get_string_collection(&prop("mixed")).unwrap_err(),
            CoreError::InvalidType(_)
        ));
    }

    #[test]
    fn non_strict_propagates_to_read_handles() {
        let registry = testing::registry();
        let store = testing::new_store();
        let mut w = testing::widget(&registry, &store, "urn:w1");
        let g = testing::gadget(&registry, &store, "urn:g1");
        w.set_property_value(&prop("part"), g).unwrap();

        assert!(w.get_object_value(&prop("part")).unwrap().unwrap().is_strict());
        w.set_strict(false);
        assert!(!w.get_object_value(&prop("part")).unwrap().unwrap().is_strict());
    }

    #[test]
    fn foreign_handle_without_copy_manager_is_not_in_store() {
        let registry = testing::registry();
        let store_a = testing::new_store();
        let store_b = testing::new_store();
        let w = testing::widget(&registry, &store_a, "urn:w1");
        let g = testing::gadget(&registry, &store_b, "urn:g1");
        let err = w.set_property_value(&prop("part"), g).unwrap_err();
        assert!(matches!(err, CoreError::NotInStore(_)));
        assert!(w.get_object_value(&prop("part")).unwrap().is_none());
    }

    #[test]
    fn foreign_handle_with_copy_manager_is_copied() {
        let registry = testing::registry();
        let store_a = testing::new_store();
        let store_b = testing::new_store();
        let w = testing::widget_with_copy(&registry, &store_a, "urn:w1");
        let g = testing::gadget(&registry, &store_b, "urn:g1");
        g.set_property_value(&prop("name"), "gizmo").unwrap();

        w.set_property_value(&prop("part"), g).unwrap();
        assert!(store_a.exists("urn:g1"));
        let copied = w.get_object_value(&prop("part")).unwrap().unwrap();
        assert!(same_store(copied.store(), &store_a));
        assert_eq!(
            copied.get_string_property_value(&prop("name")).unwrap().as_deref(),
            Some("gizmo")
        );
    }

    // ---------------------------------------------------------------
    // Deferred updates
    // ---------------------------------------------------------------

    #[test]
    fn updates_apply_only_when_called() {
        let registry = testing::registry();
        let store = testing::new_store();
        let w = testing::widget(&registry, &store, "urn:w1");
        let set = w.update_property_value(&prop("name"), "later");
        let add = w.update_add_property_value_to_collection(&prop("tags"), "t");
        assert_eq!(w.get_string_property_value(&prop("name")).unwrap(), None);

        set().unwrap();
        add().unwrap();
        assert_eq!(w.get_string_property_value(&prop("name")).unwrap().as_deref(), Some("later"));
        assert_eq!(store.collection_size("urn:w1", &prop("tags")).unwrap(), 1);

        w.update_remove_property_value_from_collection(&prop("tags"), "t".into())().unwrap();
        assert_eq!(store.collection_size("urn:w1", &prop("tags")).unwrap(), 0);
        w.update_add_property_value_to_collection(&prop("tags"), "u")().unwrap();
        w.update_clear_value_collection(&prop("tags"))().unwrap();
        assert_eq!(store.collection_size("urn:w1", &prop("tags")).unwrap(), 0);
        w.update_remove_property(&prop("name"))().unwrap();
        assert_eq!(w.get_string_property_value(&prop("name")).unwrap(), None);
    }

    #[test]
    fn updates_can_cross_threads() {
        let registry = testing::registry();
        let store = testing::new_store();
        let w = testing::widget(&registry, &store, "urn:w1");
        let update = w.update_property_value(&prop("name"), "threaded");
        thread::spawn(move || update()).join().unwrap().unwrap();
        assert_eq!(w.get_string_property_value(&prop("name")).unwrap().as_deref(), Some("threaded"));
    }

    // ---------------------------------------------------------------
    // External elements
    // ---------------------------------------------------------------

    #[test]
    fn external_handles_ignore_writes() {
        let registry = testing::registry();
        let store = testing::new_store();
        let ext = registry
            .external_element(store.clone(), "https://other.example/doc#e1", None, SPEC_VERSION)
            .unwrap();
        ext.set_property_value(&prop("name"), "x").unwrap();
        assert!(!ext.add_property_value_to_collection(&prop("tags"), "x").unwrap());
        ext.update_property_value(&prop("name"), "y")().unwrap();
        assert!(ext.property_descriptors().unwrap().is_empty());
        assert!(ext.get_object_property_value(&prop("name")).unwrap().is_none());
        assert!(!store.exists("https://other.example/doc#e1"));
    }

    #[test]
    fn external_handles_read_empty_collections() {
        let registry = testing::registry();
        let store = testing::new_store();
        let ext = registry
            .external_element(store.clone(), "https://other.example/doc#e1", None, SPEC_VERSION)
            .unwrap();

        let tags = ext.get_object_property_value_collection(&prop("tags"), None).unwrap();
        assert!(tags.is_external());
        assert_eq!(tags.len().unwrap(), 0);
        assert!(tags.iter().unwrap().next().is_none());
        assert!(!tags.contains(&ModelValue::from("x")).unwrap());
        assert!(!tags.add(ModelValue::from("x")).unwrap());
        tags.clear().unwrap();

        let set = ext.get_object_property_value_set(&prop("tags"), None).unwrap();
        assert!(set.is_empty().unwrap());
        assert!(!set.add(ModelValue::from("x")).unwrap());

        let strings = ext.get_string_collection(&prop("tags")).unwrap();
        assert!(strings.to_vec().unwrap().is_empty());
        assert!(ext
            .is_collection_members_assignable_to(&prop("tags"), &ElementType::Integer)
            .unwrap());
        assert!(!store.exists("https://other.example/doc#e1"));
    }

    // ---------------------------------------------------------------
    // Identity
    // ---------------------------------------------------------------

    #[test]
    fn named_identity_ignores_store() {
        let registry = testing::registry();
        let store_a = testing::new_store();
        let store_b = testing::new_store();
        let a = testing::widget(&registry, &store_a, "urn:w1");
        let b = testing::widget(&registry, &store_b, "urn:w1");
        assert_eq!(a, b);
        let set: HashSet<ModelObject> = [a, b].into_iter().collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn anonymous_identity_includes_store() {
        let registry = testing::registry();
        let store_a = testing::new_store();
        let store_b = testing::new_store();
        let id = store_a.next_id(docmodel_types::IdType::Anonymous, None).unwrap();
        let a = testing::widget(&registry, &store_a, &id);
        let b = testing::widget(&registry, &store_b, &id);
        let a2 = testing::widget(&registry, &store_a, &id);
        assert_ne!(a, b);
        assert_eq!(a, a2);
    }

    #[test]
    fn display_is_type_and_uri() {
        let registry = testing::registry();
        let store = testing::new_store();
        let w = testing::widget(&registry, &store, "urn:w1");
        assert_eq!(w.to_string(), "Widget:urn:w1");
        let tv = w.to_typed_value().unwrap();
        assert_eq!(tv.object_uri(), "urn:w1");
        assert_eq!(tv.spec_version(), SPEC_VERSION);
    }

    // ---------------------------------------------------------------
    // Clone and copy
    // ---------------------------------------------------------------

    #[test]
    fn clone_into_requires_copy_manager() {
        let registry = testing::registry();
        let w = testing::widget(&registry, &testing::new_store(), "urn:w1");
        let err = w.clone_into(testing::new_store()).unwrap_err();
        assert!(matches!(err, CoreError::IllegalState(_)));
    }

    #[test]
    fn clone_into_same_store_is_rejected() {
        let registry = testing::registry();
        let store = testing::new_store();
        let w = testing::widget_with_copy(&registry, &store, "urn:w1");
        let err = w.clone_into(store.clone()).unwrap_err();
        assert!(matches!(err, CoreError::IllegalState(_)));
    }

    #[test]
    fn clone_into_existing_uri_is_rejected() {
        let registry = testing::registry();
        let target = testing::new_store();
        testing::widget(&registry, &target, "urn:w1");
        let w = testing::widget_with_copy(&registry, &testing::new_store(), "urn:w1");
        let err = w.clone_into(target).unwrap_err();
        assert!(matches!(err, CoreError::IllegalState(_)));
    }

    #[test]
    fn clone_into_copies_properties() {
        let registry = testing::registry();
        let source_store = testing::new_store();
        let target = testing::new_store();
        let w = testing::widget_with_copy(&registry, &source_store, "urn:w1");
        w.set_property_value(&prop("name"), "original").unwrap();
        w.add_property_value_to_collection(&prop("tags"), "t1").unwrap();

        let clone = w.clone_into(target.clone()).unwrap();
        assert!(same_store(clone.store(), &target));
        assert_eq!(
            clone.get_string_property_value(&prop("name")).unwrap().as_deref(),
            Some("original")
        );
        assert!(clone.equivalent(&w).unwrap());
    }

    #[test]
    fn copy_from_requires_copy_manager() {
        let registry = testing::registry();
        let store = testing::new_store();
        let a = testing::widget(&registry, &store, "urn:w1");
        let b = testing::widget(&registry, &store, "urn:w2");
        assert!(matches!(a.copy_from(&b).unwrap_err(), CoreError::IllegalState(_)));
    }
}
