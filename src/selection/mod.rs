//! Selections - descriptions of what to write into and read out of the store.
//!
//! A selection is a tree of [`SelectionNode`]s: scalar leaves, linked fields
//! with nested selections, and computed fields that refer by name to a
//! [`ComputedDefinition`] in a [`SelectionRegistry`].
//!
//! ## Example
//!
//! ```
//! use normalized_cache::{ArgumentValue, SelectionNode};
//! use serde_json::json;
//!
//! let selections = vec![SelectionNode::linked(
//!     "pets",
//!     vec![SelectionNode::scalar("id"), SelectionNode::scalar("name")],
//! )
//! .with_argument("first", ArgumentValue::Literal(json!(5)))];
//! assert_eq!(selections[0].response_key(), "pets");
//! ```

mod arguments;
mod node;
mod registry;

pub use arguments::{
    child_variables, field_key, resolve_arguments, Argument, ArgumentValue, UnboundVariable,
    Variables,
};
pub use node::{ComputedField, LinkedField, ScalarField, SelectionNode, SelectionSet};
pub use registry::{ComputedDefinition, ComputedKind, SelectionRegistry, Transform};
