use serde::{Deserialize, Serialize};

use crate::check::FetchPolicy;
use crate::gc::DEFAULT_GC_BUFFER_SIZE;
use crate::normalize::DEFAULT_ID_FIELD;

/// Settings of one [`Environment`](super::Environment).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvironmentConfig {
    /// Response field that carries an entity's own identifier.
    pub id_field: String,
    /// How many released queries stay protected from collection.
    pub gc_buffer_size: usize,
    /// Collect garbage when a released query falls out of the buffer.
    pub collect_on_release: bool,
    pub default_fetch_policy: FetchPolicy,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            id_field: DEFAULT_ID_FIELD.to_string(),
            gc_buffer_size: DEFAULT_GC_BUFFER_SIZE,
            collect_on_release: false,
            default_fetch_policy: FetchPolicy::IfNecessary,
        }
    }
}

impl EnvironmentConfig {
    /// Parse from JSON. Missing keys keep their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
