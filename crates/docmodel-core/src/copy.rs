//! Copying objects between stores.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Weak};

use docmodel_store::ModelStore;
use docmodel_types::{IdType, StoredValue, TypedValue};
use parking_lot::Mutex;
use tracing::debug;

use crate::binding::{same_store, store_addr, SharedStore};
use crate::error::{CoreError, CoreResult};
use crate::registry::ModelRegistry;

/// Shared, thread-safe copy manager handle.
pub type SharedCopyManager = Arc<dyn CopyManager>;

/// Copies objects, and everything they reference, from one store to
/// another.
pub trait CopyManager: Send + Sync {
    /// Copy `source_uri` into `to_store` and return a reference to the
    /// copy. The source URI is reused unless it is anonymous. Copying the
    /// same source into the same target again returns the earlier copy.
    fn copy(
        &self,
        to_store: &SharedStore,
        from_store: &SharedStore,
        source_uri: &str,
        type_name: &str,
        to_spec_version: &str,
        to_namespace: Option<&str>,
    ) -> CoreResult<TypedValue>;

    /// Copy the properties of `from_uri` onto `to_uri`, creating the target
    /// entry if needed.
    #[allow(clippy::too_many_arguments)]
    fn copy_into(
        &self,
        to_store: &SharedStore,
        to_uri: &str,
        from_store: &SharedStore,
        from_uri: &str,
        type_name: &str,
        to_spec_version: &str,
        to_namespace: Option<&str>,
    ) -> CoreResult<()>;

    /// URI of an earlier copy of `from_uri` in `to_store`.
    fn copied_object_uri(
        &self,
        from_store: &SharedStore,
        from_uri: &str,
        to_store: &SharedStore,
    ) -> Option<String>;

    /// Record that `from_uri` was copied to `to_uri`. Returns the URI
    /// previously recorded for the pair, if any.
    fn put_copied_id(
        &self,
        from_store: &SharedStore,
        from_uri: &str,
        to_store: &SharedStore,
        to_uri: &str,
    ) -> Option<String>;
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CopyKey {
    from_store: usize,
    from_uri: String,
    to_store: usize,
}

impl CopyKey {
    fn new(from_store: &SharedStore, from_uri: &str, to_store: &SharedStore) -> Self {
        Self {
            from_store: store_addr(from_store),
            from_uri: from_uri.to_string(),
            to_store: store_addr(to_store),
        }
    }
}

/// A recorded copy. The weak store handles pin both allocations, so a key's
/// addresses can not be reused by another store while the entry exists.
struct CopyEntry {
    from_store: Weak<dyn ModelStore>,
    to_store: Weak<dyn ModelStore>,
    to_uri: String,
}

impl CopyEntry {
    fn is_live(&self) -> bool {
        self.from_store.strong_count() > 0 && self.to_store.strong_count() > 0
    }
}

type CopyMap = HashMap<CopyKey, CopyEntry>;

/// Target URI recorded for `key`, dropping the entry once either store is
/// gone.
fn live_copy(copied: &mut CopyMap, key: &CopyKey) -> Option<String> {
    let recorded = copied
        .get(key)
        .map(|entry| entry.is_live().then(|| entry.to_uri.clone()));
    match recorded {
        Some(Some(to_uri)) => Some(to_uri),
        Some(None) => {
            copied.remove(key);
            None
        }
        None => None,
    }
}

fn record_copy(
    copied: &mut CopyMap,
    key: CopyKey,
    from_store: &SharedStore,
    to_store: &SharedStore,
    to_uri: &str,
) -> Option<String> {
    copied.retain(|_, entry| entry.is_live());
    let entry = CopyEntry {
        from_store: Arc::downgrade(from_store),
        to_store: Arc::downgrade(to_store),
        to_uri: to_uri.to_string(),
    };
    copied.insert(key, entry).map(|previous| previous.to_uri)
}

/// Reference [`CopyManager`] keyed by store identity.
///
/// The copied id is recorded before any property is copied, so reference
/// cycles terminate and shared targets are copied once. A copy that fails
/// is forgotten again.
pub struct ModelCopyManager {
    registry: ModelRegistry,
    copied: Mutex<CopyMap>,
}

impl ModelCopyManager {
    pub fn new(registry: ModelRegistry) -> Self {
        Self {
            registry,
            copied: Mutex::new(HashMap::new()),
        }
    }

    /// Number of recorded copies whose stores are both alive.
    pub fn len(&self) -> usize {
        self.copied.lock().values().filter(|entry| entry.is_live()).count()
    }

    /// Drop the record for `key` if it still points at `to_uri`.
    fn forget(&self, key: &CopyKey, to_uri: &str) {
        let mut copied = self.copied.lock();
        if copied.get(key).is_some_and(|entry| entry.to_uri == to_uri) {
            copied.remove(key);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn copy_value(
        &self,
        value: StoredValue,
        to_store: &SharedStore,
        from_store: &SharedStore,
        to_spec_version: &str,
        to_namespace: Option<&str>,
    ) -> CoreResult<StoredValue> {
        match value {
            StoredValue::Reference(typed) => {
                let copied = self.copy(
                    to_store,
                    from_store,
                    typed.object_uri(),
                    typed.type_name(),
                    to_spec_version,
                    to_namespace,
                )?;
                Ok(StoredValue::Reference(copied))
            }
            StoredValue::List(items) => items
                .into_iter()
                .map(|item| self.copy_value(item, to_store, from_store, to_spec_version, to_namespace))
                .collect::<CoreResult<Vec<_>>>()
                .map(StoredValue::List),
            other => Ok(other),
        }
    }
}

impl CopyManager for ModelCopyManager {
    fn copy(
        &self,
        to_store: &SharedStore,
        from_store: &SharedStore,
        source_uri: &str,
        type_name: &str,
        to_spec_version: &str,
        to_namespace: Option<&str>,
    ) -> CoreResult<TypedValue> {
        if same_store(to_store, from_store) {
            return self.registry.typed_value(source_uri, type_name, to_spec_version);
        }
        let key = CopyKey::new(from_store, source_uri, to_store);
        let to_uri = {
            let mut copied = self.copied.lock();
            if let Some(existing) = live_copy(&mut copied, &key) {
                return self.registry.typed_value(&existing, type_name, to_spec_version);
            }
            let to_uri = if from_store.is_anon(source_uri) {
                to_store.next_id(IdType::Anonymous, to_namespace)?
            } else {
                source_uri.to_string()
            };
            record_copy(&mut copied, key.clone(), from_store, to_store, &to_uri);
            to_uri
        };
        if let Err(e) = self.copy_into(
            to_store,
            &to_uri,
            from_store,
            source_uri,
            type_name,
            to_spec_version,
            to_namespace,
        ) {
            self.forget(&key, &to_uri);
            return Err(e);
        }
        self.registry.typed_value(&to_uri, type_name, to_spec_version)
    }

    fn copy_into(
        &self,
        to_store: &SharedStore,
        to_uri: &str,
        from_store: &SharedStore,
        from_uri: &str,
        type_name: &str,
        to_spec_version: &str,
        to_namespace: Option<&str>,
    ) -> CoreResult<()> {
        if same_store(to_store, from_store) && to_uri == from_uri {
            return Ok(());
        }
        match to_store.typed_value(to_uri)? {
            None => to_store.create(&self.registry.typed_value(to_uri, type_name, to_spec_version)?)?,
            Some(existing) if existing.type_name() != type_name => {
                return Err(CoreError::IdInUse {
                    uri: to_uri.to_string(),
                    existing_type: existing.type_name().to_string(),
                    requested_type: type_name.to_string(),
                });
            }
            Some(_) => {}
        }
        self.put_copied_id(from_store, from_uri, to_store, to_uri);
        for property in from_store.property_descriptors(from_uri)? {
            let Some(value) = from_store.get_value(from_uri, &property)? else {
                continue;
            };
            let value = self.copy_value(value, to_store, from_store, to_spec_version, to_namespace)?;
            to_store.set_value(to_uri, &property, value)?;
        }
        debug!(from_uri, to_uri, type_name, "copied model object");
        Ok(())
    }

    fn copied_object_uri(
        &self,
        from_store: &SharedStore,
        from_uri: &str,
        to_store: &SharedStore,
    ) -> Option<String> {
        live_copy(
            &mut self.copied.lock(),
            &CopyKey::new(from_store, from_uri, to_store),
        )
    }

    fn put_copied_id(
        &self,
        from_store: &SharedStore,
        from_uri: &str,
        to_store: &SharedStore,
        to_uri: &str,
    ) -> Option<String> {
        record_copy(
            &mut self.copied.lock(),
            CopyKey::new(from_store, from_uri, to_store),
            from_store,
            to_store,
            to_uri,
        )
    }
}

impl fmt::Debug for ModelCopyManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelCopyManager")
            .field("copied", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{self, prop, SPEC_VERSION};
    use crate::value::ModelValue;

    #[test]
    fn named_objects_keep_their_uri() {
        let registry = testing::registry();
        let from = testing::new_store();
        let to = testing::new_store();
        let g = testing::gadget(&registry, &from, "urn:g1");
        g.set_property_value(&prop("name"), "gizmo").unwrap();

        let cm = ModelCopyManager::new(registry.clone());
        let tv = cm.copy(&to, &from, "urn:g1", "Gadget", SPEC_VERSION, None).unwrap();
        assert_eq!(tv.object_uri(), "urn:g1");
        assert_eq!(
            to.get_value("urn:g1", &prop("name")).unwrap(),
            Some(StoredValue::String("gizmo".into()))
        );
        assert_eq!(cm.copied_object_uri(&from, "urn:g1", &to).as_deref(), Some("urn:g1"));
    }

    #[test]
    fn anonymous_objects_get_fresh_ids() {
        let registry = testing::registry();
        let from = testing::new_store();
        let to = testing::new_store();
        to.next_id(IdType::Anonymous, None).unwrap();
        let id = from.next_id(IdType::Anonymous, None).unwrap();
        testing::gadget(&registry, &from, &id);

        let cm = ModelCopyManager::new(registry);
        let tv = cm.copy(&to, &from, &id, "Gadget", SPEC_VERSION, None).unwrap();
        assert!(to.is_anon(tv.object_uri()));
        assert!(to.exists(tv.object_uri()));
    }

    #[test]
    fn copying_twice_is_idempotent() {
        let registry = testing::registry();
        let from = testing::new_store();
        let to = testing::new_store();
        let id = from.next_id(IdType::Anonymous, None).unwrap();
        testing::gadget(&registry, &from, &id);

        let cm = ModelCopyManager::new(registry);
        let first = cm.copy(&to, &from, &id, "Gadget", SPEC_VERSION, None).unwrap();
        let second = cm.copy(&to, &from, &id, "Gadget", SPEC_VERSION, None).unwrap();
        assert_eq!(first, second);
        assert_eq!(to.all_items(None, None).unwrap().len(), 1);
    }

    #[test]
    fn references_are_copied_and_cycles_terminate() {
        let registry = testing::registry();
        let from = testing::new_store();
        let to = testing::new_store();
        let a = testing::widget(&registry, &from, "urn:w1");
        let b = testing::widget(&registry, &from, "urn:w2");
        a.set_property_value(&prop("peer"), b.clone()).unwrap();
        b.set_property_value(&prop("peer"), a.clone()).unwrap();
        b.add_property_value_to_collection(&prop("tags"), "x").unwrap();

        let cm = ModelCopyManager::new(registry.clone());
        cm.copy(&to, &from, "urn:w1", "Widget", SPEC_VERSION, None).unwrap();
        assert!(to.exists("urn:w1"));
        assert!(to.exists("urn:w2"));
        assert_eq!(to.collection_size("urn:w2", &prop("tags")).unwrap(), 1);

        let copied = testing::widget(&registry, &to, "urn:w1");
        assert!(copied.equivalent(&a).unwrap());
    }

    #[test]
    fn same_store_copy_is_a_reference() {
        let registry = testing::registry();
        let store = testing::new_store();
        testing::gadget(&registry, &store, "urn:g1");
        let cm = ModelCopyManager::new(registry);
        let tv = cm.copy(&store, &store, "urn:g1", "Gadget", SPEC_VERSION, None).unwrap();
        assert_eq!(tv.object_uri(), "urn:g1");
        assert!(cm.is_empty());
    }

    #[test]
    fn copy_into_type_conflict_is_id_in_use() {
        let registry = testing::registry();
        let from = testing::new_store();
        let to = testing::new_store();
        testing::gadget(&registry, &from, "urn:x");
        testing::widget(&registry, &to, "urn:x");
        let cm = ModelCopyManager::new(registry);
        let err = cm
            .copy_into(&to, "urn:x", &from, "urn:x", "Gadget", SPEC_VERSION, None)
            .unwrap_err();
        assert!(matches!(err, CoreError::IdInUse { .. }));
        assert_eq!(cm.copied_object_uri(&from, "urn:x", &to), None);
    }

    #[test]
    fn failed_copy_is_not_remembered() {
        let registry = testing::registry();
        let from = testing::new_store();
        let to = testing::new_store();
        testing::gadget(&registry, &from, "urn:x");
        testing::widget(&registry, &to, "urn:x");
        let cm = ModelCopyManager::new(registry);

        for _ in 0..2 {
            let err = cm.copy(&to, &from, "urn:x", "Gadget", SPEC_VERSION, None).unwrap_err();
            assert!(matches!(err, CoreError::IdInUse { .. }));
        }
        assert!(cm.is_empty());
        assert_eq!(to.typed_value("urn:x").unwrap().unwrap().type_name(), "Widget");
    }

    #[test]
    fn recreated_target_store_gets_a_fresh_copy() {
        let registry = testing::registry();
        let from = testing::new_store();
        testing::gadget(&registry, &from, "urn:g1");
        let cm = ModelCopyManager::new(registry);

        for _ in 0..8 {
            let to = testing::new_store();
            let tv = cm.copy(&to, &from, "urn:g1", "Gadget", SPEC_VERSION, None).unwrap();
            assert!(to.exists(tv.object_uri()));
            assert_eq!(cm.len(), 1);
        }
        assert!(cm.is_empty());
    }

    #[test]
    fn put_copied_id_returns_previous() {
        let registry = testing::registry();
        let from = testing::new_store();
        let to = testing::new_store();
        let cm = ModelCopyManager::new(registry);
        assert_eq!(cm.put_copied_id(&from, "urn:a", &to, "urn:b"), None);
        assert_eq!(cm.put_copied_id(&from, "urn:a", &to, "urn:c").as_deref(), Some("urn:b"));
        assert_eq!(cm.copied_object_uri(&from, "urn:a", &to).as_deref(), Some("urn:c"));
        assert_eq!(cm.copied_object_uri(&to, "urn:a", &from), None);
    }

    #[test]
    fn handles_copy_on_collection_add() {
        let registry = testing::registry();
        let from = testing::new_store();
        let to = testing::new_store();
        let w = testing::widget_with_copy(&registry, &to, "urn:w1");
        let g = testing::gadget(&registry, &from, "urn:g1");
        assert!(w.add_property_value_to_collection(&prop("parts"), g.clone()).unwrap());
        assert!(to.exists("urn:g1"));
        let parts = w.get_object_property_value_collection(&prop("parts"), None).unwrap();
        assert!(parts.contains(&ModelValue::Object(g)).unwrap());
    }
}
