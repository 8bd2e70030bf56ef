//! Reference-counted pointers - share one disposable item between many owners.
//!
//! A pointer group is created with one live handle. Each handle can be cloned
//! while it is undisposed; each clone must be disposed exactly once. When the
//! last live handle of a group is disposed, the teardown runs, exactly once.
//!
//! ## Structural sharing
//!
//! To move from application state 1 to state 2 while reusing an item, clone
//! the handle held by state 1, hand the clone to state 2, then dispose of
//! state 1's handle. The count never reaches zero during the transition, so
//! the item survives.
//!
//! ```
//! use normalized_cache::create_reference_counted_pointer;
//!
//! let mut first = create_reference_counted_pointer("response", || {});
//! let mut second = first.clone_if_not_disposed().unwrap();
//!
//! first.dispose().unwrap();
//! assert_eq!(second.get_item().as_deref(), Some(&"response"));
//! second.dispose().unwrap();
//! ```

mod error;
mod ref_counted;

pub use error::DisposeError;
pub(crate) use ref_counted::RefCounter;
pub use ref_counted::{create_reference_counted_pointer, ReferenceCountedPointer, Teardown};
