//! Explicit default store, document URI and copy manager.

use std::sync::{Arc, RwLock};

use docmodel_store::{InMemoryModelStore, StoreConfig};
use docmodel_types::IdType;
use tracing::debug;

use crate::binding::SharedStore;
use crate::copy::{ModelCopyManager, SharedCopyManager};
use crate::error::{CoreError, CoreResult};
use crate::object::ModelObjectBuilder;
use crate::registry::ModelRegistry;

#[derive(Clone)]
struct Defaults {
    store: SharedStore,
    document_uri: String,
    copy_manager: SharedCopyManager,
}

/// Registry plus the defaults used when a caller does not name a store.
///
/// A context starts uninitialized; every default accessor fails with
/// [`CoreError::NotInitialized`] until [`initialize`](Self::initialize) is
/// called. Re-initializing replaces all three defaults at once.
pub struct ModelContext {
    registry: ModelRegistry,
    defaults: RwLock<Option<Defaults>>,
}

impl ModelContext {
    pub fn new(registry: ModelRegistry) -> Self {
        Self {
            registry,
            defaults: RwLock::new(None),
        }
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    pub fn initialize(
        &self,
        store: SharedStore,
        document_uri: impl Into<String>,
        copy_manager: SharedCopyManager,
    ) -> CoreResult<()> {
        let document_uri = document_uri.into();
        let mut defaults = self.defaults.write().map_err(|e| {
            CoreError::IllegalState(format!("lock poisoned: {e}"))
        })?;
        debug!(document_uri = %document_uri, "initializing model context");
        *defaults = Some(Defaults {
            store,
            document_uri,
            copy_manager,
        });
        Ok(())
    }

    /// Initialize with a fresh in-memory store built from `config` and a
    /// [`ModelCopyManager`] over this context's registry.
    pub fn initialize_in_memory(
        &self,
        config: StoreConfig,
        document_uri: impl Into<String>,
    ) -> CoreResult<()> {
        let store: SharedStore = Arc::new(InMemoryModelStore::with_config(config));
        let copy_manager: SharedCopyManager =
            Arc::new(ModelCopyManager::new(self.registry.clone()));
        self.initialize(store, document_uri, copy_manager)
    }

    pub fn is_initialized(&self) -> bool {
        self.defaults
            .read()
            .map(|d| d.is_some())
            .unwrap_or(false)
    }

    fn defaults(&self) -> CoreResult<Defaults> {
        let defaults = self.defaults.read().map_err(|e| {
            CoreError::IllegalState(format!("lock poisoned: {e}"))
        })?;
        defaults.clone().ok_or(CoreError::NotInitialized)
    }

    pub fn default_store(&self) -> CoreResult<SharedStore> {
        Ok(self.defaults()?.store)
    }

    pub fn default_document_uri(&self) -> CoreResult<String> {
        Ok(self.defaults()?.document_uri)
    }

    pub fn default_copy_manager(&self) -> CoreResult<SharedCopyManager> {
        Ok(self.defaults()?.copy_manager)
    }

    /// Builder on the default store, with the default copy manager.
    pub fn builder(
        &self,
        object_uri: impl Into<String>,
        spec_version: impl Into<String>,
    ) -> CoreResult<ModelObjectBuilder> {
        let defaults = self.defaults()?;
        Ok(
            ModelObjectBuilder::new(self.registry.clone(), defaults.store, object_uri, spec_version)
                .copy_manager(Some(defaults.copy_manager)),
        )
    }

    /// Builder for a new anonymous object on the default store.
    pub fn anonymous_builder(&self, spec_version: impl Into<String>) -> CoreResult<ModelObjectBuilder> {
        let defaults = self.defaults()?;
        let id = defaults
            .store
            .next_id(IdType::Anonymous, Some(&defaults.document_uri))?;
        Ok(
            ModelObjectBuilder::new(self.registry.clone(), defaults.store, id, spec_version)
                .copy_manager(Some(defaults.copy_manager)),
        )
    }
}

impl std::fmt::Debug for ModelContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelContext")
            .field("registry", &self.registry)
            .field("initialized", &self.is_initialized())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{self, prop, SPEC_VERSION};

    #[test]
    fn defaults_fail_before_initialize() {
        let ctx = ModelContext::new(testing::registry());
        assert!(!ctx.is_initialized());
        assert!(matches!(ctx.default_store(), Err(CoreError::NotInitialized)));
        assert!(matches!(ctx.default_document_uri(), Err(CoreError::NotInitialized)));
        assert!(matches!(ctx.default_copy_manager(), Err(CoreError::NotInitialized)));
        assert!(matches!(ctx.builder("urn:w1", SPEC_VERSION), Err(CoreError::NotInitialized)));
        assert!(matches!(ctx.anonymous_builder(SPEC_VERSION), Err(CoreError::NotInitialized)));
    }

    #[test]
    fn builder_uses_defaults() {
        let ctx = ModelContext::new(testing::registry());
        let store = testing::new_store();
        let cm: SharedCopyManager = Arc::new(ModelCopyManager::new(ctx.registry().clone()));
        ctx.initialize(store.clone(), "urn:doc", cm).unwrap();
        assert_eq!(ctx.default_document_uri().unwrap(), "urn:doc");

        let w = ctx
            .builder("urn:w1", SPEC_VERSION)
            .unwrap()
            .build(testing::widget_type())
            .unwrap();
        assert!(store.exists("urn:w1"));
        assert!(w.copy_manager().is_some());
    }

    #[test]
    fn anonymous_builder_generates_ids() {
        let ctx = ModelContext::new(testing::registry());
        ctx.initialize_in_memory(StoreConfig::default(), "urn:doc").unwrap();
        let a = ctx.anonymous_builder(SPEC_VERSION).unwrap();
        let b = ctx.anonymous_builder(SPEC_VERSION).unwrap();
        assert_ne!(a.object_uri(), b.object_uri());
        let store = ctx.default_store().unwrap();
        assert!(store.is_anon(a.object_uri()));
        let obj = a.build(testing::gadget_type()).unwrap();
        obj.set_property_value(&prop("name"), "anon").unwrap();
        assert!(store.exists(obj.object_uri()));
    }

    #[test]
    fn configured_id_scheme_is_used() {
        let config = StoreConfig::from_toml_str(
            r#"
            [id_scheme]
            anonymous_prefix = "_:b"
            "#,
        )
        .unwrap();
        let ctx = ModelContext::new(testing::registry());
        ctx.initialize_in_memory(config, "urn:doc").unwrap();
        let builder = ctx.anonymous_builder(SPEC_VERSION).unwrap();
        assert!(builder.object_uri().starts_with("_:b"));
    }
}
