use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Structured lookup key of one field inside an entity record.
///
/// A key is the field name plus its bound argument values, sorted by argument
/// name. Argument values are kept as canonical JSON text so that equal values
/// compare and hash identically regardless of how they were supplied.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FieldKey {
    name: String,
    arguments: Vec<(String, String)>,
}

impl FieldKey {
    /// Key of a field without arguments.
    pub fn new(name: impl Into<String>) -> Self {
        FieldKey {
            name: name.into(),
            arguments: Vec::new(),
        }
    }

    /// Key of a field with concrete argument values, in any order.
    pub fn with_arguments<I>(name: impl Into<String>, arguments: I) -> Self
    where
        I: IntoIterator<Item = (String, Value)>,
    {
        let mut arguments: Vec<(String, String)> = arguments
            .into_iter()
            .map(|(name, value)| (name, canonical_json(&value)))
            .collect();
        arguments.sort_by(|a, b| a.0.cmp(&b.0));

        FieldKey {
            name: name.into(),
            arguments,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Sorted `(argument name, canonical JSON value)` pairs.
    pub fn arguments(&self) -> &[(String, String)] {
        &self.arguments
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if self.arguments.is_empty() {
            return Ok(());
        }
        f.write_str("(")?;
        for (i, (name, value)) in self.arguments.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}: {}", name, value)?;
        }
        f.write_str(")")
    }
}

/// Serialize a JSON value with object keys sorted at every depth.
///
/// Two values that are equal as JSON produce byte-identical output.
pub fn canonical_json(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String(key.clone()).to_string());
                out.push(':');
                write_canonical(&map[key], out);
            }
            out.push('}');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}
