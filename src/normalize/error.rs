use std::fmt;

use crate::store::StoreError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NormalizeError {
    /// A field argument references a variable that was not supplied.
    MissingVariable { field: String, variable: String },
    /// The response value does not have the shape the selection expects.
    UnexpectedShape {
        field: String,
        expected: &'static str,
        found: &'static str,
    },
    /// The identifier field holds something that cannot be an id.
    InvalidId { field: String, value: String },
    /// A computed selection names a definition the registry does not know.
    UnknownComputedField(String),
    Store(StoreError),
}

impl fmt::Display for NormalizeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NormalizeError::MissingVariable { field, variable } => write!(
                f,
                "cannot normalize field {}: variable ${} is not bound",
                field, variable
            ),
            NormalizeError::UnexpectedShape {
                field,
                expected,
                found,
            } => write!(
                f,
                "cannot normalize field {}: expected {}, found {}",
                field, expected, found
            ),
            NormalizeError::InvalidId { field, value } => {
                write!(f, "invalid id {} in field {}", value, field)
            }
            NormalizeError::UnknownComputedField(name) => {
                write!(f, "unknown computed field: {}", name)
            }
            NormalizeError::Store(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for NormalizeError {}

impl From<StoreError> for NormalizeError {
    fn from(err: StoreError) -> Self {
        NormalizeError::Store(err)
    }
}
