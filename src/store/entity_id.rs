use std::fmt;

use serde::{Deserialize, Serialize};

use super::FieldKey;

/// Id of the record every query starts reading from.
pub const ROOT_ID: &str = "__ROOT";

/// Opaque identifier of one normalized entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    pub fn new(id: impl Into<String>) -> Self {
        EntityId(id.into())
    }

    pub fn root() -> Self {
        EntityId(ROOT_ID.to_string())
    }

    pub fn is_root(&self) -> bool {
        self.0 == ROOT_ID
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Synthesize the id of an object that carries no identifier of its own,
    /// from the path taken to reach it: parent id, field key and list index.
    ///
    /// Distinct positions always get distinct ids, so two id-less objects in
    /// different places never share a record.
    pub fn child(&self, key: &FieldKey, index: Option<usize>) -> EntityId {
        match index {
            Some(index) => EntityId(format!("{}.{}.{}", self.0, key, index)),
            None => EntityId(format!("{}.{}", self.0, key)),
        }
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityId {
    fn from(id: &str) -> Self {
        EntityId::new(id)
    }
}

impl From<String> for EntityId {
    fn from(id: String) -> Self {
        EntityId(id)
    }
}
