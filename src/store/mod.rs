//! Normalized store - flat, keyed storage of every fetched entity.
//!
//! Nested server responses are flattened into one [`EntityRecord`] per
//! [`EntityId`]. Fields are addressed by a structured [`FieldKey`] (name plus
//! sorted argument bindings), and relationships are stored as
//! [`FieldValue::Link`]s to other records.
//!
//! ## Example
//!
//! ```
//! use normalized_cache::{EntityId, FieldKey, FieldValue, Scalar, Store};
//!
//! let store = Store::new();
//! let pet = EntityId::new("0");
//! store.write(&pet, FieldKey::new("name"), Scalar::from("Rex").into())?;
//! store.write(&EntityId::root(), FieldKey::new("pet"), FieldValue::link("0"))?;
//!
//! assert_eq!(store.len()?, 2);
//! # Ok::<(), normalized_cache::StoreError>(())
//! ```

mod entity_id;
mod error;
mod field_key;
mod in_memory;
#[cfg(feature = "snapshot")]
mod snapshot;
mod value;

pub use entity_id::{EntityId, ROOT_ID};
pub use error::StoreError;
pub use field_key::{canonical_json, FieldKey};
pub use in_memory::{RecordMap, Store};
#[cfg(feature = "snapshot")]
pub use snapshot::StoreSnapshot;
pub use value::{EntityRecord, FieldValue, Scalar};
