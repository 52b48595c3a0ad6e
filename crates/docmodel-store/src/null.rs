//! A store that holds nothing.
//!
//! Handles over a [`NullModelStore`] can only represent constants and
//! individuals: reads find nothing and every write fails.

use docmodel_types::{IdType, PropertyDescriptor, StoredKind, StoredValue, TypedValue};

use crate::error::{StoreError, StoreResult};
use crate::lock::CriticalSection;
use crate::traits::ModelStore;

const NULL_STORE_MSG: &str = "null model store can only be used with constants and individuals";

/// The no-op reference backend. Provides no real exclusion.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullModelStore;

impl NullModelStore {
    pub fn new() -> Self {
        Self
    }
}

fn unsupported<T>() -> StoreResult<T> {
    Err(StoreError::Unsupported(NULL_STORE_MSG.into()))
}

impl ModelStore for NullModelStore {
    fn exists(&self, _object_uri: &str) -> bool {
        false
    }

    fn create(&self, _typed_value: &TypedValue) -> StoreResult<()> {
        unsupported()
    }

    fn property_descriptors(&self, _object_uri: &str) -> StoreResult<Vec<PropertyDescriptor>> {
        Ok(Vec::new())
    }

    fn set_value(
        &self,
        _object_uri: &str,
        _property: &PropertyDescriptor,
        _value: StoredValue,
    ) -> StoreResult<()> {
        unsupported()
    }

    fn get_value(
        &self,
        _object_uri: &str,
        _property: &PropertyDescriptor,
    ) -> StoreResult<Option<StoredValue>> {
        Ok(None)
    }

    fn next_id(&self, _id_type: IdType, _namespace: Option<&str>) -> StoreResult<String> {
        unsupported()
    }

    fn remove_property(&self, _object_uri: &str, _property: &PropertyDescriptor) -> StoreResult<()> {
        unsupported()
    }

    fn all_items(
        &self,
        _namespace: Option<&str>,
        _type_filter: Option<&str>,
    ) -> StoreResult<Vec<TypedValue>> {
        Ok(Vec::new())
    }

    fn enter_critical_section(&self, read_lock_requested: bool) -> StoreResult<CriticalSection<'_>> {
        Ok(CriticalSection::noop(read_lock_requested))
    }

    fn remove_value_from_collection(
        &self,
        _object_uri: &str,
        _property: &PropertyDescriptor,
        _value: &StoredValue,
    ) -> StoreResult<bool> {
        unsupported()
    }

    fn collection_size(&self, _object_uri: &str, _property: &PropertyDescriptor) -> StoreResult<usize> {
        unsupported()
    }

    fn collection_contains(
        &self,
        _object_uri: &str,
        _property: &PropertyDescriptor,
        _value: &StoredValue,
    ) -> StoreResult<bool> {
        unsupported()
    }

    fn clear_value_collection(
        &self,
        _object_uri: &str,
        _property: &PropertyDescriptor,
    ) -> StoreResult<()> {
        unsupported()
    }

    fn add_value_to_collection(
        &self,
        _object_uri: &str,
        _property: &PropertyDescriptor,
        _value: StoredValue,
    ) -> StoreResult<bool> {
        unsupported()
    }

    fn list_values(
        &self,
        _object_uri: &str,
        _property: &PropertyDescriptor,
    ) -> StoreResult<Vec<StoredValue>> {
        Ok(Vec::new())
    }

    fn is_collection_members_assignable_to(
        &self,
        _object_uri: &str,
        _property: &PropertyDescriptor,
        _kind: StoredKind,
    ) -> StoreResult<bool> {
        unsupported()
    }

    fn is_property_value_assignable_to(
        &self,
        _object_uri: &str,
        _property: &PropertyDescriptor,
        _kind: StoredKind,
        _spec_version: &str,
    ) -> StoreResult<bool> {
        unsupported()
    }

    fn is_collection_property(
        &self,
        _object_uri: &str,
        _property: &PropertyDescriptor,
    ) -> StoreResult<bool> {
        unsupported()
    }

    fn id_type(&self, _object_uri: &str) -> IdType {
        IdType::Unknown
    }

    fn case_sensitive_id(&self, _namespace: &str, _case_insensitive_id: &str) -> Option<String> {
        None
    }

    fn typed_value(&self, _object_uri: &str) -> StoreResult<Option<TypedValue>> {
        Ok(None)
    }

    fn delete(&self, _object_uri: &str) -> StoreResult<()> {
        unsupported()
    }

    fn is_anon(&self, _object_uri: &str) -> bool {
        false
    }
}
