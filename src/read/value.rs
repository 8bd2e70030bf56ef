use std::collections::BTreeMap;
use std::fmt;

use serde_json::Value;

use crate::selection::{SelectionNode, SelectionSet, Transform, Variables};
use crate::store::{EntityId, Scalar};

/// A value reconstructed from the store.
#[derive(Debug, Clone, PartialEq)]
pub enum ReadValue {
    Scalar(Scalar),
    List(Vec<ReadValue>),
    /// Selected fields, keyed by alias or field name.
    Object(BTreeMap<String, ReadValue>),
    /// A component computation, packaged to be materialized later.
    Deferred(DeferredComponent),
}

impl ReadValue {
    pub fn null() -> Self {
        ReadValue::Scalar(Scalar::Null)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, ReadValue::Scalar(Scalar::Null))
    }

    /// Field of an object value.
    pub fn get(&self, key: &str) -> Option<&ReadValue> {
        match self {
            ReadValue::Object(fields) => fields.get(key),
            _ => None,
        }
    }

    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            ReadValue::Scalar(scalar) => Some(scalar),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ReadValue::Scalar(Scalar::String(s)) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[ReadValue]> {
        match self {
            ReadValue::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_deferred(&self) -> Option<&DeferredComponent> {
        match self {
            ReadValue::Deferred(component) => Some(component),
            _ => None,
        }
    }

    /// JSON form of the value. `None` if it still holds a deferred component.
    pub fn to_json(&self) -> Option<Value> {
        match self {
            ReadValue::Scalar(scalar) => Some(scalar.to_json()),
            ReadValue::List(items) => items
                .iter()
                .map(ReadValue::to_json)
                .collect::<Option<Vec<_>>>()
                .map(Value::Array),
            ReadValue::Object(fields) => {
                let mut object = serde_json::Map::new();
                for (key, value) in fields {
                    object.insert(key.clone(), value.to_json()?);
                }
                Some(Value::Object(object))
            }
            ReadValue::Deferred(_) => None,
        }
    }
}

impl From<Scalar> for ReadValue {
    fn from(scalar: Scalar) -> Self {
        ReadValue::Scalar(scalar)
    }
}

/// Where to read from, what to read and under which variables.
///
/// Cheap to clone: selections are shared.
#[derive(Clone)]
pub struct FragmentReference {
    pub root: EntityId,
    pub selections: SelectionSet,
    pub variables: Variables,
    /// Applied to the value once the whole fragment has been read.
    pub transform: Option<Transform>,
}

impl FragmentReference {
    pub fn new(root: EntityId, selections: Vec<SelectionNode>, variables: Variables) -> Self {
        FragmentReference {
            root,
            selections: selections.into(),
            variables,
            transform: None,
        }
    }

    pub fn with_transform<F>(mut self, transform: F) -> Self
    where
        F: Fn(ReadValue, &Variables) -> ReadValue + Send + Sync + 'static,
    {
        self.transform = Some(std::sync::Arc::new(transform));
        self
    }
}

// Transforms are opaque, so two references are equal when they read the same
// data the same way.
impl PartialEq for FragmentReference {
    fn eq(&self, other: &Self) -> bool {
        self.root == other.root
            && self.variables == other.variables
            && self.selections == other.selections
    }
}

impl fmt::Debug for FragmentReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FragmentReference")
            .field("root", &self.root)
            .field("selections", &self.selections)
            .field("variables", &self.variables)
            .field("transform", &self.transform.is_some())
            .finish()
    }
}

/// A component computation whose transform has not run yet.
#[derive(Debug, Clone, PartialEq)]
pub struct DeferredComponent {
    /// Name of the computed definition.
    pub name: String,
    pub fragment: FragmentReference,
}
