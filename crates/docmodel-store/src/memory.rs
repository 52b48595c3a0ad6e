//! In-memory store for tests and embedding.
//!
//! [`InMemoryModelStore`] keeps every entry in a `HashMap` behind a
//! `RwLock`. Critical sections are served by a separate re-entrant mutex, so
//! a thread inside a section can keep calling the store.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use docmodel_types::{
    local_part, IdScheme, IdType, PropertyDescriptor, StoredKind, StoredValue, TypedValue,
};
use parking_lot::ReentrantMutex;
use tracing::debug;

use crate::config::StoreConfig;
use crate::error::{StoreError, StoreResult};
use crate::lock::CriticalSection;
use crate::traits::ModelStore;

/// A property slot.
#[derive(Clone, Debug)]
enum Slot {
    Single(StoredValue),
    Collection(Vec<StoredValue>),
}

#[derive(Clone, Debug)]
struct StoredItem {
    typed_value: TypedValue,
    properties: BTreeMap<PropertyDescriptor, Slot>,
}

/// An in-memory implementation of [`ModelStore`].
///
/// Shared and exclusive critical sections are both served by one re-entrant
/// mutex: concurrent readers inside a section are serialized, which is
/// stricter than required but never weaker.
pub struct InMemoryModelStore {
    items: RwLock<HashMap<String, StoredItem>>,
    critical: ReentrantMutex<()>,
    next_id: AtomicU64,
    id_scheme: IdScheme,
}

impl InMemoryModelStore {
    /// Create a new empty store with the default id scheme.
    pub fn new() -> Self {
        Self::with_config(StoreConfig::default())
    }

    pub fn with_config(config: StoreConfig) -> Self {
        Self {
            items: RwLock::new(HashMap::new()),
            critical: ReentrantMutex::new(()),
            next_id: AtomicU64::new(0),
            id_scheme: config.id_scheme,
        }
    }

    /// Number of entries currently stored.
    pub fn len(&self) -> usize {
        self.read_items().map(|items| items.len()).unwrap_or(0)
    }

    /// Returns `true` if the store has no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn id_scheme(&self) -> &IdScheme {
        &self.id_scheme
    }

    fn read_items(&self) -> StoreResult<RwLockReadGuard<'_, HashMap<String, StoredItem>>> {
        self.items
            .read()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))
    }

    fn write_items(&self) -> StoreResult<RwLockWriteGuard<'_, HashMap<String, StoredItem>>> {
        self.items
            .write()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))
    }

    /// Run `f` against an existing item.
    fn with_item<T>(
        &self,
        object_uri: &str,
        f: impl FnOnce(&StoredItem) -> StoreResult<T>,
    ) -> StoreResult<T> {
        let items = self.read_items()?;
        let item = items
            .get(object_uri)
            .ok_or_else(|| StoreError::NotFound(object_uri.to_string()))?;
        f(item)
    }

    /// Run `f` against an existing item with write access.
    fn with_item_mut<T>(
        &self,
        object_uri: &str,
        f: impl FnOnce(&mut StoredItem) -> StoreResult<T>,
    ) -> StoreResult<T> {
        let mut items = self.write_items()?;
        let item = items
            .get_mut(object_uri)
            .ok_or_else(|| StoreError::NotFound(object_uri.to_string()))?;
        f(item)
    }

    /// Borrow the elements of a collection slot. Absent means empty.
    fn collection<'a>(
        item: &'a StoredItem,
        object_uri: &str,
        property: &PropertyDescriptor,
    ) -> StoreResult<&'a [StoredValue]> {
        match item.properties.get(property) {
            None => Ok(&[]),
            Some(Slot::Collection(values)) => Ok(values),
            Some(Slot::Single(_)) => Err(StoreError::NotACollection {
                uri: object_uri.to_string(),
                property: property.clone(),
            }),
        }
    }

    fn generate_id(&self, id_type: IdType, namespace: Option<&str>) -> StoreResult<String> {
        let n = self.next_id.fetch_add(1, Ordering::Relaxed);
        let local = match id_type {
            IdType::Anonymous => return Ok(format!("{}{n}", self.id_scheme.anonymous_prefix)),
            IdType::SpecDefined => format!("{}gnrtd{n}", self.id_scheme.spec_id_marker),
            IdType::ExternalRef => format!("{}gnrtd{n}", self.id_scheme.external_ref_marker),
            IdType::ListedConstant | IdType::Unknown => {
                return Err(StoreError::UnsupportedIdType(id_type))
            }
        };
        Ok(match namespace {
            Some(ns) if ns.ends_with('#') || ns.ends_with('/') => format!("{ns}{local}"),
            Some(ns) => format!("{ns}#{local}"),
            None => local,
        })
    }
}

fn reject_nested(value: &StoredValue) -> StoreResult<()> {
    if matches!(value, StoredValue::List(_)) {
        return Err(StoreError::InvalidValue(
            "collections can not contain collections".into(),
        ));
    }
    Ok(())
}

impl Default for InMemoryModelStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ModelStore for InMemoryModelStore {
    fn exists(&self, object_uri: &str) -> bool {
        self.read_items()
            .map(|items| items.contains_key(object_uri))
            .unwrap_or(false)
    }

    fn create(&self, typed_value: &TypedValue) -> StoreResult<()> {
        let mut items = self.write_items()?;
        if let Some(existing) = items.get(typed_value.object_uri()) {
            return Err(StoreError::AlreadyExists {
                uri: typed_value.object_uri().to_string(),
                type_name: existing.typed_value.type_name().to_string(),
            });
        }
        debug!(uri = %typed_value.object_uri(), ty = %typed_value.type_name(), "created store entry");
        items.insert(
            typed_value.object_uri().to_string(),
            StoredItem {
                typed_value: typed_value.clone(),
                properties: BTreeMap::new(),
            },
        );
        Ok(())
    }

    fn property_descriptors(&self, object_uri: &str) -> StoreResult<Vec<PropertyDescriptor>> {
        self.with_item(object_uri, |item| Ok(item.properties.keys().cloned().collect()))
    }

    fn set_value(
        &self,
        object_uri: &str,
        property: &PropertyDescriptor,
        value: StoredValue,
    ) -> StoreResult<()> {
        let slot = match value {
            StoredValue::List(values) => {
                values.iter().try_for_each(reject_nested)?;
                Slot::Collection(values)
            }
            single => Slot::Single(single),
        };
        self.with_item_mut(object_uri, |item| {
            item.properties.insert(property.clone(), slot);
            Ok(())
        })
    }

    fn get_value(
        &self,
        object_uri: &str,
        property: &PropertyDescriptor,
    ) -> StoreResult<Option<StoredValue>> {
        self.with_item(object_uri, |item| {
            Ok(item.properties.get(property).map(|slot| match slot {
                Slot::Single(v) => v.clone(),
                Slot::Collection(values) => StoredValue::List(values.clone()),
            }))
        })
    }

    fn next_id(&self, id_type: IdType, namespace: Option<&str>) -> StoreResult<String> {
        loop {
            let id = self.generate_id(id_type, namespace)?;
            if !self.exists(&id) {
                return Ok(id);
            }
        }
    }

    fn remove_property(&self, object_uri: &str, property: &PropertyDescriptor) -> StoreResult<()> {
        self.with_item_mut(object_uri, |item| {
            item.properties.remove(property);
            Ok(())
        })
    }

    fn all_items(
        &self,
        namespace: Option<&str>,
        type_filter: Option<&str>,
    ) -> StoreResult<Vec<TypedValue>> {
        let items = self.read_items()?;
        let mut result: Vec<TypedValue> = items
            .values()
            .filter(|item| namespace.map_or(true, |ns| item.typed_value.object_uri().starts_with(ns)))
            .filter(|item| type_filter.map_or(true, |ty| item.typed_value.type_name() == ty))
            .map(|item| item.typed_value.clone())
            .collect();
        result.sort_by(|a, b| a.object_uri().cmp(b.object_uri()));
        Ok(result)
    }

    fn enter_critical_section(&self, read_lock_requested: bool) -> StoreResult<CriticalSection<'_>> {
        Ok(CriticalSection::new(self.critical.lock(), read_lock_requested))
    }

    fn remove_value_from_collection(
        &self,
        object_uri: &str,
        property: &PropertyDescriptor,
        value: &StoredValue,
    ) -> StoreResult<bool> {
        self.with_item_mut(object_uri, |item| match item.properties.get_mut(property) {
            None => Ok(false),
            Some(Slot::Collection(values)) => match values.iter().position(|v| v == value) {
                Some(pos) => {
                    values.remove(pos);
                    Ok(true)
                }
                None => Ok(false),
            },
            Some(Slot::Single(_)) => Err(StoreError::NotACollection {
                uri: object_uri.to_string(),
                property: property.clone(),
            }),
        })
    }

    fn collection_size(&self, object_uri: &str, property: &PropertyDescriptor) -> StoreResult<usize> {
        self.with_item(object_uri, |item| {
            Ok(Self::collection(item, object_uri, property)?.len())
        })
    }

    fn collection_contains(
        &self,
        object_uri: &str,
        property: &PropertyDescriptor,
        value: &StoredValue,
    ) -> StoreResult<bool> {
        self.with_item(object_uri, |item| {
            Ok(Self::collection(item, object_uri, property)?.contains(value))
        })
    }

    fn clear_value_collection(
        &self,
        object_uri: &str,
        property: &PropertyDescriptor,
    ) -> StoreResult<()> {
        self.with_item_mut(object_uri, |item| match item.properties.get_mut(property) {
            None => Ok(()),
            Some(Slot::Collection(values)) => {
                values.clear();
                Ok(())
            }
            Some(Slot::Single(_)) => Err(StoreError::NotACollection {
                uri: object_uri.to_string(),
                property: property.clone(),
            }),
        })
    }

    fn add_value_to_collection(
        &self,
        object_uri: &str,
        property: &PropertyDescriptor,
        value: StoredValue,
    ) -> StoreResult<bool> {
        reject_nested(&value)?;
        self.with_item_mut(object_uri, |item| {
            match item
                .properties
                .entry(property.clone())
                .or_insert_with(|| Slot::Collection(Vec::new()))
            {
                Slot::Collection(values) => {
                    values.push(value);
                    Ok(true)
                }
                Slot::Single(_) => Err(StoreError::NotACollection {
                    uri: object_uri.to_string(),
                    property: property.clone(),
                }),
            }
        })
    }

    fn list_values(
        &self,
        object_uri: &str,
        property: &PropertyDescriptor,
    ) -> StoreResult<Vec<StoredValue>> {
        self.with_item(object_uri, |item| {
            Ok(Self::collection(item, object_uri, property)?.to_vec())
        })
    }

    fn is_collection_members_assignable_to(
        &self,
        object_uri: &str,
        property: &PropertyDescriptor,
        kind: StoredKind,
    ) -> StoreResult<bool> {
        self.with_item(object_uri, |item| match item.properties.get(property) {
            None => Ok(true),
            Some(Slot::Collection(values)) => Ok(values.iter().all(|v| v.is_assignable_to(kind))),
            Some(Slot::Single(_)) => Ok(false),
        })
    }

    fn is_property_value_assignable_to(
        &self,
        object_uri: &str,
        property: &PropertyDescriptor,
        kind: StoredKind,
        spec_version: &str,
    ) -> StoreResult<bool> {
        self.with_item(object_uri, |item| match item.properties.get(property) {
            None => Ok(true),
            Some(Slot::Single(StoredValue::Reference(tv))) => {
                Ok(kind == StoredKind::Reference && tv.spec_version() == spec_version)
            }
            Some(Slot::Single(v)) => Ok(v.is_assignable_to(kind)),
            Some(Slot::Collection(_)) => Ok(false),
        })
    }

    fn is_collection_property(
        &self,
        object_uri: &str,
        property: &PropertyDescriptor,
    ) -> StoreResult<bool> {
        self.with_item(object_uri, |item| {
            Ok(matches!(item.properties.get(property), Some(Slot::Collection(_))))
        })
    }

    fn id_type(&self, object_uri: &str) -> IdType {
        self.id_scheme.classify(object_uri)
    }

    fn case_sensitive_id(&self, namespace: &str, case_insensitive_id: &str) -> Option<String> {
        let items = self.read_items().ok()?;
        let mut matches: Vec<&str> = items
            .keys()
            .filter_map(|uri| uri.strip_prefix(namespace))
            .map(|rest| rest.strip_prefix('#').unwrap_or(rest))
            .filter(|id| local_part(id) == *id && id.eq_ignore_ascii_case(case_insensitive_id))
            .collect();
        matches.sort_unstable();
        matches.first().map(|id| id.to_string())
    }

    fn typed_value(&self, object_uri: &str) -> StoreResult<Option<TypedValue>> {
        let items = self.read_items()?;
        Ok(items.get(object_uri).map(|item| item.typed_value.clone()))
    }

    fn delete(&self, object_uri: &str) -> StoreResult<()> {
        let mut items = self.write_items()?;
        if items.remove(object_uri).is_none() {
            return Err(StoreError::NotFound(object_uri.to_string()));
        }
        debug!(uri = %object_uri, "deleted store entry");
        Ok(())
    }
}

impl std::fmt::Debug for InMemoryModelStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryModelStore")
            .field("object_count", &self.len())
            .finish()
    }
}
