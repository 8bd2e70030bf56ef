use std::fmt;
use std::sync::Arc;

use crate::read::{FragmentReference, ReadValue};
use crate::selection::{SelectionNode, SelectionSet, Transform, Variables};
use crate::store::EntityId;

/// A query the application can fetch: the document sent over the network,
/// the selections its response is normalized with, and the selections the
/// result is read back with.
#[derive(Clone)]
pub struct Entrypoint {
    pub name: String,
    pub query_text: String,
    pub normalization: SelectionSet,
    pub reader: SelectionSet,
    pub transform: Option<Transform>,
}

impl Entrypoint {
    /// An entrypoint that reads back exactly what it writes.
    pub fn new(
        name: impl Into<String>,
        query_text: impl Into<String>,
        selections: Vec<SelectionNode>,
    ) -> Self {
        let selections: SelectionSet = selections.into();
        Entrypoint {
            name: name.into(),
            query_text: query_text.into(),
            normalization: Arc::clone(&selections),
            reader: selections,
            transform: None,
        }
    }

    /// Read the result with different selections, e.g. ones that go through
    /// computed fields.
    pub fn with_reader(mut self, reader: Vec<SelectionNode>) -> Self {
        self.reader = reader.into();
        self
    }

    pub fn with_transform<F>(mut self, transform: F) -> Self
    where
        F: Fn(ReadValue, &Variables) -> ReadValue + Send + Sync + 'static,
    {
        self.transform = Some(Arc::new(transform));
        self
    }

    /// Reference to this entrypoint's result under `variables`.
    pub fn fragment(&self, variables: Variables) -> FragmentReference {
        FragmentReference {
            root: EntityId::root(),
            selections: Arc::clone(&self.reader),
            variables,
            transform: self.transform.clone(),
        }
    }
}

impl fmt::Debug for Entrypoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entrypoint")
            .field("name", &self.name)
            .field("query_text", &self.query_text)
            .finish()
    }
}
