//! Spec version → type package dispatch table.
//!
//! [`ModelRegistry`] is an explicitly constructed, cheaply cloneable handle:
//! every [`ModelObject`] and builder keeps a clone, and all clones share the
//! same table. Lookups take a read lock only long enough to clone the
//! package out of the map; calls into the package run unlocked.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use docmodel_types::TypedValue;
use tracing::{debug, warn};

use crate::binding::SharedStore;
use crate::copy::SharedCopyManager;
use crate::error::{CoreError, CoreResult};
use crate::individual::Individual;
use crate::model_info::{ModelInfo, ModelType};
use crate::object::{ModelObject, ModelObjectBuilder};

/// Shared table of registered type packages keyed by spec version.
#[derive(Clone, Default)]
pub struct ModelRegistry {
    models: Arc<RwLock<HashMap<String, Arc<dyn ModelInfo>>>>,
}

impl ModelRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a package under every spec version it declares. A later
    /// registration of the same version replaces the earlier one.
    pub fn register_model(&self, info: Arc<dyn ModelInfo>) -> CoreResult<()> {
        let versions = info.spec_versions();
        let mut models = self.models.write().map_err(|e| {
            CoreError::Registry(format!("lock poisoned: {e}"))
        })?;
        for version in versions {
            debug!(spec_version = %version, "registering model");
            models.insert(version, Arc::clone(&info));
        }
        Ok(())
    }

    /// Whether a package is registered for the version. A poisoned table
    /// is still read; membership is never left half-updated.
    pub fn contains_spec_version(&self, spec_version: &str) -> bool {
        let models = self.models.read().unwrap_or_else(|e| {
            warn!(spec_version, "reading poisoned model registry");
            PoisonError::into_inner(e)
        });
        models.contains_key(spec_version)
    }

    /// All registered spec versions, sorted.
    pub fn supported_versions(&self) -> CoreResult<Vec<String>> {
        let models = self.models.read().map_err(|e| {
            CoreError::Registry(format!("lock poisoned: {e}"))
        })?;
        let mut versions: Vec<String> = models.keys().cloned().collect();
        versions.sort();
        Ok(versions)
    }

    /// Remove every registered package.
    pub fn clear_all(&self) -> CoreResult<()> {
        let mut models = self.models.write().map_err(|e| {
            CoreError::Registry(format!("lock poisoned: {e}"))
        })?;
        models.clear();
        Ok(())
    }

    fn model(&self, spec_version: &str) -> CoreResult<Arc<dyn ModelInfo>> {
        let models = self.models.read().map_err(|e| {
            CoreError::Registry(format!("lock poisoned: {e}"))
        })?;
        models.get(spec_version).cloned().ok_or_else(|| {
            CoreError::Registry(format!("spec version {spec_version} is not registered"))
        })
    }

    pub fn uri_to_enum(&self, uri: &str, spec_version: &str) -> CoreResult<Option<Individual>> {
        Ok(self.model(spec_version)?.uri_to_enum(uri))
    }

    pub fn uri_to_individual(
        &self,
        uri: &str,
        spec_version: &str,
        type_hint: Option<&str>,
    ) -> CoreResult<Option<Individual>> {
        Ok(self.model(spec_version)?.uri_to_individual(uri, type_hint))
    }

    /// Model type registered under `type_name` for the version.
    pub fn model_type(
        &self,
        type_name: &str,
        spec_version: &str,
    ) -> CoreResult<Option<Arc<dyn ModelType>>> {
        Ok(self.model(spec_version)?.model_type(type_name))
    }

    /// Whether `uri` is the version's "no value asserted" sentinel.
    /// Unregistered versions have no sentinel.
    pub fn is_absent_sentinel(&self, uri: &str, spec_version: &str) -> bool {
        self.model(spec_version)
            .map(|model| model.is_absent_sentinel(uri))
            .unwrap_or(false)
    }

    /// Build a handle for an element defined outside `store`.
    pub fn external_element(
        &self,
        store: SharedStore,
        uri: &str,
        copy_manager: Option<SharedCopyManager>,
        spec_version: &str,
    ) -> CoreResult<ModelObject> {
        let model = self.model(spec_version)?;
        let builder = ModelObjectBuilder::new(self.clone(), store, uri, spec_version)
            .copy_manager(copy_manager)
            .create(false);
        model.create_external_element(builder)
    }

    /// Build a typed handle for `uri`, creating the store entry when
    /// `create` is set and it does not yet exist.
    #[allow(clippy::too_many_arguments)]
    pub fn inflate(
        &self,
        store: SharedStore,
        uri: &str,
        type_name: &str,
        copy_manager: Option<SharedCopyManager>,
        spec_version: &str,
        create: bool,
        id_prefix: Option<&str>,
    ) -> CoreResult<ModelObject> {
        let model = self.model(spec_version)?;
        let builder = ModelObjectBuilder::new(self.clone(), store, uri, spec_version)
            .copy_manager(copy_manager)
            .create(create)
            .id_prefix(id_prefix.map(str::to_string));
        model.create_model_object(builder, type_name)
    }

    /// A typed value whose type name is registered for the version.
    pub fn typed_value(
        &self,
        object_uri: &str,
        type_name: &str,
        spec_version: &str,
    ) -> CoreResult<TypedValue> {
        if self.model(spec_version)?.model_type(type_name).is_none() {
            return Err(CoreError::InvalidType(format!(
                "{type_name} is not a model type of spec version {spec_version}"
            )));
        }
        Ok(TypedValue::new(object_uri, type_name, spec_version)?)
    }
}

impl fmt::Debug for ModelRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let versions = self.supported_versions().unwrap_or_default();
        f.debug_struct("ModelRegistry")
            .field("spec_versions", &versions)
            .finish()
    }
}
