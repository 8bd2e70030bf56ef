use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

use super::{SelectionNode, SelectionSet, Variables};
use crate::read::ReadValue;

/// Turns the data read for a computation into its output value.
pub type Transform = Arc<dyn Fn(ReadValue, &Variables) -> ReadValue + Send + Sync>;

/// How a computed field's transform is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComputedKind {
    /// The transform runs during the read and its result is inlined.
    Eager,
    /// The transform is not run; the read yields a
    /// [`DeferredComponent`](crate::read::DeferredComponent) to be
    /// materialized later.
    Component,
}

/// A named, client-defined computation over a selection.
#[derive(Clone)]
pub struct ComputedDefinition {
    pub name: String,
    pub kind: ComputedKind,
    pub selections: SelectionSet,
    pub transform: Transform,
}

impl ComputedDefinition {
    pub fn eager<F>(name: impl Into<String>, selections: Vec<SelectionNode>, transform: F) -> Self
    where
        F: Fn(ReadValue, &Variables) -> ReadValue + Send + Sync + 'static,
    {
        ComputedDefinition {
            name: name.into(),
            kind: ComputedKind::Eager,
            selections: Arc::from(selections),
            transform: Arc::new(transform),
        }
    }

    pub fn component<F>(name: impl Into<String>, selections: Vec<SelectionNode>, render: F) -> Self
    where
        F: Fn(ReadValue, &Variables) -> ReadValue + Send + Sync + 'static,
    {
        ComputedDefinition {
            name: name.into(),
            kind: ComputedKind::Component,
            selections: Arc::from(selections),
            transform: Arc::new(render),
        }
    }
}

impl fmt::Debug for ComputedDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComputedDefinition")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("selections", &self.selections)
            .finish()
    }
}

type Loader = Box<dyn Fn() -> ComputedDefinition + Send + Sync>;

enum Entry {
    Loaded(Arc<ComputedDefinition>),
    Lazy {
        loader: Loader,
        loaded: OnceLock<Arc<ComputedDefinition>>,
    },
}

/// Named computed definitions, resolved by lookup at read and write time.
///
/// Definitions may reference each other by name, so they form a DAG rather
/// than being inlined into one another.
#[derive(Default)]
pub struct SelectionRegistry {
    definitions: HashMap<String, Entry>,
}

impl SelectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, definition: ComputedDefinition) -> &mut Self {
        self.definitions
            .insert(definition.name.clone(), Entry::Loaded(Arc::new(definition)));
        self
    }

    /// Register a definition that is only built on first lookup.
    pub fn register_lazy<F>(&mut self, name: impl Into<String>, loader: F) -> &mut Self
    where
        F: Fn() -> ComputedDefinition + Send + Sync + 'static,
    {
        self.definitions.insert(
            name.into(),
            Entry::Lazy {
                loader: Box::new(loader),
                loaded: OnceLock::new(),
            },
        );
        self
    }

    pub fn get(&self, name: &str) -> Option<Arc<ComputedDefinition>> {
        match self.definitions.get(name)? {
            Entry::Loaded(definition) => Some(Arc::clone(definition)),
            Entry::Lazy { loader, loaded } => {
                Some(Arc::clone(loaded.get_or_init(|| {
                    tracing::debug!(definition = name, "registry.load_lazy");
                    Arc::new(loader())
                })))
            }
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.definitions.contains_key(name)
    }

    /// Whether a lazy definition has been built yet. Eager ones always are.
    pub fn is_loaded(&self, name: &str) -> bool {
        match self.definitions.get(name) {
            Some(Entry::Loaded(_)) => true,
            Some(Entry::Lazy { loaded, .. }) => loaded.get().is_some(),
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

impl fmt::Debug for SelectionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.definitions.keys().collect();
        names.sort();
        f.debug_struct("SelectionRegistry")
            .field("definitions", &names)
            .finish()
    }
}
