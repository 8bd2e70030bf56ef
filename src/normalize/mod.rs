//! Normalizer - the write path.
//!
//! Walks a server response alongside the selections that produced it and
//! merges every object into its own record in the [`Store`](crate::Store).
//! Objects carrying an identifier field are keyed by it. Objects without one
//! get an id built from the path used to reach them.
//!
//! ## Example
//!
//! ```
//! use normalized_cache::{normalize, EntityId, SelectionNode, SelectionRegistry, Store, Variables};
//! use serde_json::json;
//!
//! let store = Store::new();
//! let selections = vec![SelectionNode::linked(
//!     "pets",
//!     vec![SelectionNode::scalar("id"), SelectionNode::scalar("name")],
//! )];
//! let response = json!({"pets": [{"id": "0", "name": "Rex"}]});
//!
//! let changed = normalize(
//!     &store,
//!     &SelectionRegistry::new(),
//!     &selections,
//!     response.as_object().unwrap(),
//!     &Variables::new(),
//!     &EntityId::root(),
//! )?;
//! assert!(changed.contains(&EntityId::new("0")));
//! # Ok::<(), normalized_cache::NormalizeError>(())
//! ```

mod error;
mod normalizer;

pub use error::NormalizeError;
pub use normalizer::{normalize, EncounteredIds, Normalizer, DEFAULT_ID_FIELD};
