use std::fmt;

use serde_json::Value;

use crate::store::FieldKey;

/// Bound variable values of one query or fragment.
pub type Variables = serde_json::Map<String, Value>;

/// The value bound to one field argument.
#[derive(Debug, Clone, PartialEq)]
pub enum ArgumentValue {
    /// A constant written in the query text (numbers, strings, enums).
    Literal(Value),
    /// Resolved against the variables in effect at read or write time.
    Variable(String),
    /// An input object whose members are themselves arguments.
    Object(Vec<Argument>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Argument {
    pub name: String,
    pub value: ArgumentValue,
}

impl Argument {
    pub fn new(name: impl Into<String>, value: ArgumentValue) -> Self {
        Argument {
            name: name.into(),
            value,
        }
    }

    pub fn literal(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(name, ArgumentValue::Literal(value.into()))
    }

    pub fn variable(name: impl Into<String>, variable: impl Into<String>) -> Self {
        Self::new(name, ArgumentValue::Variable(variable.into()))
    }
}

/// A selection bound a variable that the supplied variables do not contain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnboundVariable {
    pub variable: String,
}

impl fmt::Display for UnboundVariable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "variable ${} is not bound", self.variable)
    }
}

impl std::error::Error for UnboundVariable {}

fn resolve_value(value: &ArgumentValue, variables: &Variables) -> Result<Value, UnboundVariable> {
    match value {
        ArgumentValue::Literal(value) => Ok(value.clone()),
        ArgumentValue::Variable(name) => {
            variables.get(name).cloned().ok_or_else(|| UnboundVariable {
                variable: name.clone(),
            })
        }
        ArgumentValue::Object(members) => {
            let mut object = serde_json::Map::new();
            for member in members {
                object.insert(member.name.clone(), resolve_value(&member.value, variables)?);
            }
            Ok(Value::Object(object))
        }
    }
}

/// Resolve every argument to its concrete runtime value.
pub fn resolve_arguments(
    arguments: &[Argument],
    variables: &Variables,
) -> Result<Vec<(String, Value)>, UnboundVariable> {
    arguments
        .iter()
        .map(|argument| Ok((argument.name.clone(), resolve_value(&argument.value, variables)?)))
        .collect()
}

/// Store key of a field under the given variables.
pub fn field_key(
    field_name: &str,
    arguments: &[Argument],
    variables: &Variables,
) -> Result<FieldKey, UnboundVariable> {
    if arguments.is_empty() {
        return Ok(FieldKey::new(field_name));
    }
    Ok(FieldKey::with_arguments(
        field_name,
        resolve_arguments(arguments, variables)?,
    ))
}

/// Variables seen by a nested computation that binds `arguments`.
///
/// Unbound variables are skipped rather than reported: the nested selection
/// may declare a default for them.
pub fn child_variables(arguments: &[Argument], variables: &Variables) -> Variables {
    let mut child = Variables::new();
    for argument in arguments {
        match &argument.value {
            ArgumentValue::Variable(name) => {
                if let Some(value) = variables.get(name) {
                    child.insert(argument.name.clone(), value.clone());
                }
            }
            ArgumentValue::Object(members) => {
                child.insert(
                    argument.name.clone(),
                    Value::Object(child_variables(members, variables)),
                );
            }
            ArgumentValue::Literal(value) => {
                child.insert(argument.name.clone(), value.clone());
            }
        }
    }
    child
}
