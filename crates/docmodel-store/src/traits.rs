use docmodel_types::{IdType, PropertyDescriptor, StoredKind, StoredValue, TypedValue};

use crate::error::StoreResult;
use crate::lock::CriticalSection;

/// Storage backend for a graph of model objects.
///
/// All implementations must satisfy these invariants:
/// - Operations on an object URI that does not exist fail with
///   `StoreError::NotFound`; nothing is created implicitly.
/// - An entry keeps the type it was created with until it is deleted.
/// - Composite values are only ever held as [`StoredValue::Reference`].
/// - A property holding a collection reports `is_collection_property` and
///   answers `get_value` with a [`StoredValue::List`].
/// - Id classification (`id_type`) is stable for the store's lifetime.
pub trait ModelStore: Send + Sync {
    /// Whether an entry exists for the URI.
    fn exists(&self, object_uri: &str) -> bool;

    /// Create a new entry. Fails if the URI is already in use.
    fn create(&self, typed_value: &TypedValue) -> StoreResult<()>;

    /// Descriptors of every property currently present on the object.
    fn property_descriptors(&self, object_uri: &str) -> StoreResult<Vec<PropertyDescriptor>>;

    /// Replace a property value. A [`StoredValue::List`] replaces the
    /// property with a collection holding its elements.
    fn set_value(
        &self,
        object_uri: &str,
        property: &PropertyDescriptor,
        value: StoredValue,
    ) -> StoreResult<()>;

    /// Read a property value. Returns `Ok(None)` if the property is absent.
    fn get_value(
        &self,
        object_uri: &str,
        property: &PropertyDescriptor,
    ) -> StoreResult<Option<StoredValue>>;

    /// Generate a fresh identifier of the given kind.
    ///
    /// `namespace` scopes spec-defined and external reference ids; it is
    /// ignored for anonymous ids.
    fn next_id(&self, id_type: IdType, namespace: Option<&str>) -> StoreResult<String>;

    /// Remove a property, single-valued or collection.
    fn remove_property(&self, object_uri: &str, property: &PropertyDescriptor) -> StoreResult<()>;

    /// Typed values of all entries, optionally filtered by URI namespace
    /// prefix and by type name.
    fn all_items(
        &self,
        namespace: Option<&str>,
        type_filter: Option<&str>,
    ) -> StoreResult<Vec<TypedValue>>;

    /// Enter a critical section.
    ///
    /// `read_lock_requested` asks for shared intent; otherwise the section
    /// is exclusive. Sections are re-entrant for the thread holding them.
    fn enter_critical_section(&self, read_lock_requested: bool) -> StoreResult<CriticalSection<'_>>;

    /// Leave a critical section obtained from this store.
    fn leave_critical_section(&self, lock: CriticalSection<'_>) {
        lock.unlock();
    }

    /// Remove one element equal to `value`. Returns `true` if one was removed.
    fn remove_value_from_collection(
        &self,
        object_uri: &str,
        property: &PropertyDescriptor,
        value: &StoredValue,
    ) -> StoreResult<bool>;

    /// Number of elements in a collection property (0 if absent).
    fn collection_size(&self, object_uri: &str, property: &PropertyDescriptor) -> StoreResult<usize>;

    /// Whether a collection property holds an element equal to `value`.
    fn collection_contains(
        &self,
        object_uri: &str,
        property: &PropertyDescriptor,
        value: &StoredValue,
    ) -> StoreResult<bool>;

    /// Remove every element of a collection property.
    fn clear_value_collection(
        &self,
        object_uri: &str,
        property: &PropertyDescriptor,
    ) -> StoreResult<()>;

    /// Append an element, creating the collection if absent.
    fn add_value_to_collection(
        &self,
        object_uri: &str,
        property: &PropertyDescriptor,
        value: StoredValue,
    ) -> StoreResult<bool>;

    /// Elements of a collection property in insertion order.
    fn list_values(
        &self,
        object_uri: &str,
        property: &PropertyDescriptor,
    ) -> StoreResult<Vec<StoredValue>>;

    /// Whether every element of a collection property may appear where
    /// `kind` is expected. An absent property is trivially assignable.
    fn is_collection_members_assignable_to(
        &self,
        object_uri: &str,
        property: &PropertyDescriptor,
        kind: StoredKind,
    ) -> StoreResult<bool>;

    /// Whether a single-valued property may appear where `kind` is expected.
    fn is_property_value_assignable_to(
        &self,
        object_uri: &str,
        property: &PropertyDescriptor,
        kind: StoredKind,
        spec_version: &str,
    ) -> StoreResult<bool>;

    /// Whether the property currently holds a collection.
    fn is_collection_property(
        &self,
        object_uri: &str,
        property: &PropertyDescriptor,
    ) -> StoreResult<bool>;

    /// Kind of an object URI, inferred from its shape.
    fn id_type(&self, object_uri: &str) -> IdType;

    /// Resolve an id within a namespace ignoring case. Returns the id as it
    /// is actually stored.
    fn case_sensitive_id(&self, namespace: &str, case_insensitive_id: &str) -> Option<String>;

    /// The typed value of an entry, if it exists.
    fn typed_value(&self, object_uri: &str) -> StoreResult<Option<TypedValue>>;

    /// Delete an entry and all of its properties.
    fn delete(&self, object_uri: &str) -> StoreResult<()>;

    /// Whether the URI is an anonymous id.
    fn is_anon(&self, object_uri: &str) -> bool {
        self.id_type(object_uri) == IdType::Anonymous
    }
}
