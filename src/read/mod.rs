//! Reader - the read path.
//!
//! Walks a [`FragmentReference`]'s selections against the store, starting at
//! its root record, and rebuilds the requested shape as a [`ReadValue`].
//! Absent records or fields make the whole read report
//! [`ReadDataResult::MissingData`]: the caller gets either a complete value or
//! nothing, never a partially filled one.
//!
//! ## Example
//!
//! ```
//! use normalized_cache::{
//!     read_data, EntityId, FieldKey, FragmentReference, ReadDataResult, Scalar, SelectionNode,
//!     SelectionRegistry, Store, Variables,
//! };
//!
//! let store = Store::new();
//! let fragment = FragmentReference::new(
//!     EntityId::root(),
//!     vec![SelectionNode::scalar("greeting")],
//!     Variables::new(),
//! );
//! let registry = SelectionRegistry::new();
//!
//! assert!(matches!(read_data(&store, &registry, &fragment)?, ReadDataResult::MissingData(_)));
//!
//! store.write(&EntityId::root(), FieldKey::new("greeting"), Scalar::from("hi").into())?;
//! assert!(read_data(&store, &registry, &fragment)?.is_success());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod error;
mod reader;
mod value;

pub use error::ReadError;
pub use reader::{read_data, read_data_tracked, MissingData, ReadDataResult, TrackedRead};
pub use value::{DeferredComponent, FragmentReference, ReadValue};
