//! The environment a handle or collection view operates in.

use std::fmt;
use std::sync::Arc;

use docmodel_store::ModelStore;

use crate::copy::SharedCopyManager;
use crate::registry::ModelRegistry;

/// Shared, thread-safe store handle.
pub type SharedStore = Arc<dyn ModelStore>;

/// Whether two store handles denote the same store instance.
pub fn same_store(a: &SharedStore, b: &SharedStore) -> bool {
    store_addr(a) == store_addr(b)
}

/// Identity of a store instance, ignoring vtable metadata.
pub(crate) fn store_addr(store: &SharedStore) -> usize {
    Arc::as_ptr(store) as *const () as usize
}

/// Registry, store, copy manager, spec version and id prefix shared by a
/// handle and every value it converts.
#[derive(Clone)]
pub struct StoreBinding {
    registry: ModelRegistry,
    store: SharedStore,
    copy_manager: Option<SharedCopyManager>,
    spec_version: String,
    id_prefix: Option<String>,
}

impl StoreBinding {
    pub fn new(registry: ModelRegistry, store: SharedStore, spec_version: impl Into<String>) -> Self {
        Self {
            registry,
            store,
            copy_manager: None,
            spec_version: spec_version.into(),
            id_prefix: None,
        }
    }

    pub fn with_copy_manager(mut self, copy_manager: Option<SharedCopyManager>) -> Self {
        self.copy_manager = copy_manager;
        self
    }

    pub fn with_id_prefix(mut self, id_prefix: Option<String>) -> Self {
        self.id_prefix = id_prefix;
        self
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    pub fn copy_manager(&self) -> Option<&SharedCopyManager> {
        self.copy_manager.as_ref()
    }

    pub fn spec_version(&self) -> &str {
        &self.spec_version
    }

    pub fn id_prefix(&self) -> Option<&str> {
        self.id_prefix.as_deref()
    }

    pub(crate) fn set_copy_manager(&mut self, copy_manager: Option<SharedCopyManager>) {
        self.copy_manager = copy_manager;
    }
}

impl fmt::Debug for StoreBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreBinding")
            .field("store", &format_args!("{:#x}", store_addr(&self.store)))
            .field("spec_version", &self.spec_version)
            .field("copy_manager", &self.copy_manager.is_some())
            .field("id_prefix", &self.id_prefix)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docmodel_store::InMemoryModelStore;

    #[test]
    fn store_identity() {
        let a: SharedStore = Arc::new(InMemoryModelStore::new());
        let b: SharedStore = Arc::new(InMemoryModelStore::new());
        let a2 = Arc::clone(&a);
        assert!(same_store(&a, &a2));
        assert!(!same_store(&a, &b));
    }
}
