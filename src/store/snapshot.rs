//! Store snapshots - seed a store with data produced elsewhere.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};

use super::{EntityId, EntityRecord, RecordMap, Store, StoreError};

/// Point-in-time copy of every record in a store, ordered by id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreSnapshot {
    records: Vec<(EntityId, EntityRecord)>,
}

impl StoreSnapshot {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Encode with bitcode.
    pub fn encode(&self) -> Result<Vec<u8>, StoreError> {
        bitcode::serialize(self).map_err(|e| StoreError::Snapshot(e.to_string()))
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, StoreError> {
        bitcode::deserialize(bytes).map_err(|e| StoreError::Snapshot(e.to_string()))
    }

    /// Text form, suitable for embedding in a served page.
    pub fn to_base64(&self) -> Result<String, StoreError> {
        Ok(STANDARD.encode(self.encode()?))
    }

    pub fn from_base64(text: &str) -> Result<Self, StoreError> {
        let bytes = STANDARD
            .decode(text)
            .map_err(|e| StoreError::Snapshot(e.to_string()))?;
        Self::decode(&bytes)
    }
}

impl Store {
    pub fn snapshot(&self) -> Result<StoreSnapshot, StoreError> {
        self.view(|records| {
            let mut records: Vec<(EntityId, EntityRecord)> = records
                .iter()
                .map(|(id, record)| (id.clone(), record.clone()))
                .collect();
            records.sort_by(|a, b| a.0.cmp(&b.0));
            StoreSnapshot { records }
        })
    }

    pub fn from_snapshot(snapshot: StoreSnapshot) -> Self {
        let records: RecordMap = snapshot.records.into_iter().collect();
        Store::with_records(records)
    }
}
