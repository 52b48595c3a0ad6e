use docmodel_types::IdScheme;
use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};

/// Configuration shared by the reference backends.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// How ids are classified and generated. Must not change while a store
    /// holds data.
    pub id_scheme: IdScheme,
}

impl StoreConfig {
    /// Parse a config from TOML text. Missing keys take their defaults.
    pub fn from_toml_str(content: &str) -> StoreResult<Self> {
        toml::from_str(content)
            .map_err(|e| StoreError::Config(format!("failed to parse store config: {e}")))
    }
}
