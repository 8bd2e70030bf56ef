//! Store - the single source of truth for fetched data.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use super::{EntityId, EntityRecord, FieldKey, FieldValue, StoreError};

/// Flat map from entity id to its record.
pub type RecordMap = HashMap<EntityId, EntityRecord>;

/// In-memory normalized store backed by a HashMap.
///
/// Clone-friendly via Arc: clones share the same records. Create one per
/// independent cache (per session, per test).
#[derive(Clone, Default)]
pub struct Store {
    records: Arc<RwLock<RecordMap>>,
}

impl Store {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with records.
    pub fn with_records(records: RecordMap) -> Self {
        Store {
            records: Arc::new(RwLock::new(records)),
        }
    }

    /// Set one field of one entity, creating the record if absent.
    /// Returns whether the stored value changed.
    pub fn write(
        &self,
        id: &EntityId,
        key: FieldKey,
        value: FieldValue,
    ) -> Result<bool, StoreError> {
        self.update(|records| records.entry(id.clone()).or_default().set(key, value))
    }

    pub fn get_record(&self, id: &EntityId) -> Result<Option<EntityRecord>, StoreError> {
        self.view(|records| records.get(id).cloned())
    }

    /// `None` when the record is absent, `Some(None)` when only the field is.
    pub fn get_field(
        &self,
        id: &EntityId,
        key: &FieldKey,
    ) -> Result<Option<Option<FieldValue>>, StoreError> {
        self.view(|records| records.get(id).map(|record| record.get(key).cloned()))
    }

    pub fn contains(&self, id: &EntityId) -> Result<bool, StoreError> {
        self.view(|records| records.contains_key(id))
    }

    pub fn len(&self) -> Result<usize, StoreError> {
        self.view(|records| records.len())
    }

    pub fn is_empty(&self) -> Result<bool, StoreError> {
        self.view(|records| records.is_empty())
    }

    /// Sorted ids of every record.
    pub fn ids(&self) -> Result<Vec<EntityId>, StoreError> {
        self.view(|records| {
            let mut ids: Vec<EntityId> = records.keys().cloned().collect();
            ids.sort();
            ids
        })
    }

    /// Run `f` against a consistent view of all records.
    ///
    /// No write is visible halfway through `f`.
    pub fn view<R>(&self, f: impl FnOnce(&RecordMap) -> R) -> Result<R, StoreError> {
        let records = self
            .records
            .read()
            .map_err(|_| StoreError::LockPoisoned("read"))?;
        Ok(f(&records))
    }

    /// Run `f` with exclusive access to all records.
    pub(crate) fn update<R>(&self, f: impl FnOnce(&mut RecordMap) -> R) -> Result<R, StoreError> {
        let mut records = self
            .records
            .write()
            .map_err(|_| StoreError::LockPoisoned("write"))?;
        Ok(f(&mut records))
    }
}
