use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

use super::{EntityId, FieldKey};

/// A leaf value as received from the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Scalar {
    Null,
    Bool(bool),
    Int(i64),
    /// Integers above `i64::MAX`.
    UInt(u64),
    Float(f64),
    String(String),
}

impl Scalar {
    /// Convert a JSON leaf. Arrays and objects are not scalars.
    pub fn from_json(value: &Value) -> Option<Scalar> {
        match value {
            Value::Null => Some(Scalar::Null),
            Value::Bool(b) => Some(Scalar::Bool(*b)),
            Value::Number(n) => Some(if let Some(i) = n.as_i64() {
                Scalar::Int(i)
            } else if let Some(u) = n.as_u64() {
                Scalar::UInt(u)
            } else {
                Scalar::Float(n.as_f64().unwrap_or(f64::NAN))
            }),
            Value::String(s) => Some(Scalar::String(s.clone())),
            Value::Array(_) | Value::Object(_) => None,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            Scalar::Null => Value::Null,
            Scalar::Bool(b) => Value::Bool(*b),
            Scalar::Int(i) => Value::Number((*i).into()),
            Scalar::UInt(u) => Value::Number((*u).into()),
            Scalar::Float(f) => Number::from_f64(*f).map(Value::Number).unwrap_or(Value::Null),
            Scalar::String(s) => Value::String(s.clone()),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Scalar::Null)
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Scalar::String(s.to_string())
    }
}

impl From<String> for Scalar {
    fn from(s: String) -> Self {
        Scalar::String(s)
    }
}

impl From<i64> for Scalar {
    fn from(i: i64) -> Self {
        Scalar::Int(i)
    }
}

impl From<bool> for Scalar {
    fn from(b: bool) -> Self {
        Scalar::Bool(b)
    }
}

/// What a record holds under one field key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldValue {
    Scalar(Scalar),
    /// Points at another record instead of holding data inline.
    Link(EntityId),
    /// Ordered values of a list-typed field (links or scalars).
    List(Vec<FieldValue>),
}

impl FieldValue {
    pub fn null() -> Self {
        FieldValue::Scalar(Scalar::Null)
    }

    pub fn link(id: impl Into<EntityId>) -> Self {
        FieldValue::Link(id.into())
    }

    pub fn as_link(&self) -> Option<&EntityId> {
        match self {
            FieldValue::Link(id) => Some(id),
            _ => None,
        }
    }

    /// Every link held directly by this value.
    pub fn links(&self) -> Vec<&EntityId> {
        match self {
            FieldValue::Link(id) => vec![id],
            FieldValue::List(items) => items.iter().filter_map(FieldValue::as_link).collect(),
            FieldValue::Scalar(_) => Vec::new(),
        }
    }

    pub(crate) fn kind(&self) -> &'static str {
        match self {
            FieldValue::Scalar(Scalar::Null) => "null",
            FieldValue::Scalar(_) => "scalar",
            FieldValue::Link(_) => "link",
            FieldValue::List(_) => "list",
        }
    }
}

impl From<Scalar> for FieldValue {
    fn from(scalar: Scalar) -> Self {
        FieldValue::Scalar(scalar)
    }
}

/// All known fields of one entity. Writes merge into it, never replace it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityRecord {
    fields: BTreeMap<FieldKey, FieldValue>,
}

impl EntityRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &FieldKey) -> Option<&FieldValue> {
        self.fields.get(key)
    }

    /// Set a field, last write wins. Returns whether the stored value changed.
    pub fn set(&mut self, key: FieldKey, value: FieldValue) -> bool {
        match self.fields.get(&key) {
            Some(existing) if *existing == value => false,
            _ => {
                self.fields.insert(key, value);
                true
            }
        }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&FieldKey, &FieldValue)> {
        self.fields.iter()
    }
}
