use std::collections::{HashMap, VecDeque};

use tracing::trace;

use crate::selection::{SelectionNode, SelectionSet, Variables};
use crate::store::EntityId;

/// Default number of released queries kept in the recency buffer.
pub const DEFAULT_GC_BUFFER_SIZE: usize = 10;

/// A query whose data must survive garbage collection.
#[derive(Debug, Clone, PartialEq)]
pub struct RetainedQuery {
    pub root: EntityId,
    pub selections: SelectionSet,
    pub variables: Variables,
}

impl RetainedQuery {
    pub fn new(root: EntityId, selections: Vec<SelectionNode>, variables: Variables) -> Self {
        RetainedQuery {
            root,
            selections: selections.into(),
            variables,
        }
    }
}

pub type RetentionId = u64;

/// Which queries keep their data alive.
///
/// A query is retained while something uses it. Once released it moves into
/// a bounded buffer of recently released queries, so that data a user just
/// navigated away from survives a few collections.
#[derive(Debug)]
pub struct Retention {
    next_id: RetentionId,
    retained: HashMap<RetentionId, RetainedQuery>,
    buffer: VecDeque<RetainedQuery>,
    buffer_size: usize,
}

impl Default for Retention {
    fn default() -> Self {
        Self::new(DEFAULT_GC_BUFFER_SIZE)
    }
}

impl Retention {
    pub fn new(buffer_size: usize) -> Self {
        Retention {
            next_id: 0,
            retained: HashMap::new(),
            buffer: VecDeque::new(),
            buffer_size,
        }
    }

    pub fn retain(&mut self, query: RetainedQuery) -> RetentionId {
        let id = self.next_id;
        self.next_id += 1;
        self.retained.insert(id, query);
        trace!(retention = id, retained = self.retained.len(), "gc.retain");
        id
    }

    /// Move a retained query into the recency buffer.
    ///
    /// Returns whether that pushed an older query out of the buffer, which is
    /// when collecting can free something.
    pub fn release(&mut self, id: RetentionId) -> bool {
        let Some(query) = self.retained.remove(&id) else {
            return false;
        };
        self.buffer.push_back(query);
        let overflowed = self.buffer.len() > self.buffer_size;
        if overflowed {
            self.buffer.pop_front();
        }
        trace!(retention = id, buffered = self.buffer.len(), overflowed, "gc.release");
        overflowed
    }

    pub fn retained_len(&self) -> usize {
        self.retained.len()
    }

    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    /// Every query whose data must be kept: retained ones and buffered ones.
    pub fn live_queries(&self) -> impl Iterator<Item = &RetainedQuery> {
        self.retained.values().chain(self.buffer.iter())
    }
}
