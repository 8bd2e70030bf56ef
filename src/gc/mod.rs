//! Garbage collection - explicit, opt-in removal of unreachable records.
//!
//! The store never evicts on its own. A [`Retention`] tracks which queries
//! are in use and which were recently released; [`garbage_collect`] deletes
//! every record none of them reaches.

mod collect;
mod retention;

pub use collect::garbage_collect;
pub use retention::{RetainedQuery, Retention, RetentionId, DEFAULT_GC_BUFFER_SIZE};
