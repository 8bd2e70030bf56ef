use std::fmt;

use crate::store::{EntityId, StoreError};

/// A read that cannot proceed because the store or selections are inconsistent.
///
/// Missing data is not an error. It is reported as
/// [`ReadDataResult::MissingData`](super::ReadDataResult::MissingData).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadError {
    /// A linked field holds something other than a link, a null or a list of them.
    MalformedLink {
        record: EntityId,
        field: String,
        found: &'static str,
    },
    /// A scalar field holds a link.
    MalformedScalar {
        record: EntityId,
        field: String,
        found: &'static str,
    },
    MissingVariable { field: String, variable: String },
    UnknownComputedField(String),
    Store(StoreError),
}

impl fmt::Display for ReadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReadError::MalformedLink {
                record,
                field,
                found,
            } => write!(
                f,
                "malformed link at {}.{}: expected a link, found {}",
                record, field, found
            ),
            ReadError::MalformedScalar {
                record,
                field,
                found,
            } => write!(
                f,
                "malformed scalar at {}.{}: expected a scalar, found {}",
                record, field, found
            ),
            ReadError::MissingVariable { field, variable } => {
                write!(f, "cannot read field {}: variable ${} is not bound", field, variable)
            }
            ReadError::UnknownComputedField(name) => write!(f, "unknown computed field: {}", name),
            ReadError::Store(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for ReadError {}

impl From<StoreError> for ReadError {
    fn from(err: StoreError) -> Self {
        ReadError::Store(err)
    }
}
