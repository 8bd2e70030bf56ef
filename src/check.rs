//! Presence check - does the store already hold everything a query writes?
//!
//! Used by fetch policies to decide whether a network round trip is needed.
//! Unlike a read, a check only looks at what the write path would populate,
//! so explicit nulls count as present.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::read::ReadError;
use crate::selection::{child_variables, SelectionNode, SelectionRegistry, Variables};
use crate::store::{EntityId, RecordMap, Store};

/// Whether to go to the network when fetching a query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FetchPolicy {
    /// Only when [`check`] reports missing data.
    #[default]
    IfNecessary,
    Always,
    /// Never; rely on whatever the store holds.
    Never,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckResult {
    EnoughData,
    /// The first record found lacking data.
    MissingData { record: EntityId },
}

impl CheckResult {
    pub fn is_enough(&self) -> bool {
        matches!(self, CheckResult::EnoughData)
    }
}

pub fn check(
    store: &Store,
    registry: &SelectionRegistry,
    selections: &[SelectionNode],
    variables: &Variables,
    root: &EntityId,
) -> Result<CheckResult, ReadError> {
    let result = store.view(|records| check_record(records, registry, selections, variables, root))??;
    debug!(root = %root, enough = result.is_enough(), "check.done");
    Ok(result)
}

fn check_record(
    records: &RecordMap,
    registry: &SelectionRegistry,
    selections: &[SelectionNode],
    variables: &Variables,
    id: &EntityId,
) -> Result<CheckResult, ReadError> {
    let Some(record) = records.get(id) else {
        return Ok(CheckResult::MissingData { record: id.clone() });
    };
    let missing = || -> Result<CheckResult, ReadError> { Ok(CheckResult::MissingData { record: id.clone() }) };

    for node in selections {
        match node {
            SelectionNode::Scalar(field) => {
                let key = field.field_key(variables).map_err(|err| ReadError::MissingVariable {
                    field: field.field_name.clone(),
                    variable: err.variable,
                })?;
                if record.get(&key).is_none() {
                    return missing();
                }
            }
            SelectionNode::Linked(field) => {
                let key = field.field_key(variables).map_err(|err| ReadError::MissingVariable {
                    field: field.field_name.clone(),
                    variable: err.variable,
                })?;
                let Some(value) = record.get(&key) else {
                    return missing();
                };
                for target in value.links() {
                    let result = check_record(records, registry, &field.selections, variables, target)?;
                    if !result.is_enough() {
                        return Ok(result);
                    }
                }
            }
            SelectionNode::Computed(field) => {
                let definition = registry
                    .get(&field.definition)
                    .ok_or_else(|| ReadError::UnknownComputedField(field.definition.clone()))?;
                let nested_variables = child_variables(&field.arguments, variables);
                let result =
                    check_record(records, registry, &definition.selections, &nested_variables, id)?;
                if !result.is_enough() {
                    return Ok(result);
                }
            }
        }
    }

    Ok(CheckResult::EnoughData)
}
