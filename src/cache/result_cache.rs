use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde_json::Value;
use tracing::{debug, trace};

use super::CacheError;
use crate::pointer::{RefCounter, ReferenceCountedPointer, Teardown};
use crate::selection::Variables;
use crate::store::canonical_json;

/// Canonical signature of a request: operation text, a newline, then its
/// variables as key-sorted JSON.
pub fn stable_signature(query: &str, variables: &Variables) -> String {
    format!("{}\n{}", query, canonical_json(&Value::Object(variables.clone())))
}

/// A handle obtained from the cache.
#[derive(Debug)]
pub struct CacheLookup<T> {
    pub pointer: ReferenceCountedPointer<T>,
    /// Whether the result was already cached rather than produced now.
    pub hit: bool,
}

// One slot per signature. Requesters of the same signature serialize on the
// slot while its result is produced; other signatures are not blocked.
type Slot<T> = Arc<Mutex<Option<Arc<RefCounter<T>>>>>;

/// Deduplicates results by signature, guarding each with a
/// [`ReferenceCountedPointer`].
///
/// Clones share the same entries.
pub struct ResultCache<T> {
    entries: Arc<Mutex<HashMap<String, Slot<T>>>>,
}

impl<T> Clone for ResultCache<T> {
    fn clone(&self) -> Self {
        ResultCache {
            entries: Arc::clone(&self.entries),
        }
    }
}

impl<T> Default for ResultCache<T> {
    fn default() -> Self {
        ResultCache {
            entries: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

impl<T: Send + Sync + 'static> ResultCache<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// A new handle onto the result cached under `signature`, producing it
    /// with `factory` first if no live result is cached.
    ///
    /// The teardown returned by `factory` runs once every handle onto the
    /// result has been disposed, after the entry has left the cache. A failed
    /// `factory` caches nothing.
    pub fn get_or_insert_with<F, E>(&self, signature: &str, factory: F) -> Result<CacheLookup<T>, E>
    where
        F: FnOnce() -> Result<(T, Teardown), E>,
        E: From<CacheError>,
    {
        let slot = {
            let mut entries = self
                .entries
                .lock()
                .map_err(|_| CacheError::LockPoisoned("lookup"))?;
            Arc::clone(entries.entry(signature.to_string()).or_default())
        };

        let mut cached = slot.lock().map_err(|_| CacheError::LockPoisoned("slot"))?;
        if let Some(pointer) = cached.as_ref().and_then(|counter| counter.retain_if_not_disposed()) {
            trace!(signature, "cache.hit");
            return Ok(CacheLookup { pointer, hit: true });
        }

        let (item, teardown) = match factory() {
            Ok(produced) => produced,
            Err(err) => {
                if cached.is_none() {
                    self.remove_slot(signature, &slot)?;
                }
                return Err(err);
            }
        };

        let entries = Arc::downgrade(&self.entries);
        let weak_slot = Arc::downgrade(&slot);
        let owned_signature = signature.to_string();
        let (counter, pointer) = RefCounter::new(
            item,
            Box::new(move || {
                if let (Some(entries), Some(slot)) = (entries.upgrade(), weak_slot.upgrade()) {
                    if let Ok(mut entries) = entries.lock() {
                        if entries
                            .get(&owned_signature)
                            .is_some_and(|current| Arc::ptr_eq(current, &slot))
                        {
                            entries.remove(&owned_signature);
                        }
                    }
                }
                debug!(signature = %owned_signature, "cache.evict");
                teardown();
            }),
        );
        *cached = Some(counter);

        debug!(signature, "cache.insert");
        Ok(CacheLookup { pointer, hit: false })
    }

    /// Number of signatures with a cached or in-progress result.
    pub fn len(&self) -> Result<usize, CacheError> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| CacheError::LockPoisoned("len"))?;
        Ok(entries.len())
    }

    pub fn is_empty(&self) -> Result<bool, CacheError> {
        Ok(self.len()? == 0)
    }

    pub fn contains(&self, signature: &str) -> Result<bool, CacheError> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| CacheError::LockPoisoned("contains"))?;
        Ok(entries.contains_key(signature))
    }

    fn remove_slot(&self, signature: &str, slot: &Slot<T>) -> Result<(), CacheError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| CacheError::LockPoisoned("remove"))?;
        if entries
            .get(signature)
            .is_some_and(|current| Arc::ptr_eq(current, slot))
        {
            entries.remove(signature);
        }
        Ok(())
    }
}
