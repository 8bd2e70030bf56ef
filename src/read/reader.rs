use std::collections::BTreeMap;

use tracing::{debug, trace};

use super::{DeferredComponent, FragmentReference, ReadError, ReadValue};
use crate::normalize::EncounteredIds;
use crate::selection::{
    child_variables, ComputedField, ComputedKind, LinkedField, ScalarField, SelectionNode,
    SelectionRegistry, UnboundVariable, Variables,
};
use crate::store::{EntityId, FieldValue, RecordMap, Store};

/// The data a read needed but the store does not hold yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingData {
    pub reason: String,
    /// Record that is absent, or that lacks the field.
    pub record: EntityId,
}

/// Outcome of a read that did not fail.
#[derive(Debug, Clone, PartialEq)]
pub enum ReadDataResult {
    Success(ReadValue),
    MissingData(MissingData),
}

impl ReadDataResult {
    pub fn is_success(&self) -> bool {
        matches!(self, ReadDataResult::Success(_))
    }

    pub fn success(self) -> Option<ReadValue> {
        match self {
            ReadDataResult::Success(value) => Some(value),
            ReadDataResult::MissingData(_) => None,
        }
    }
}

/// A read result together with every record the read looked at.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackedRead {
    pub result: ReadDataResult,
    pub encountered: EncounteredIds,
}

/// Reconstruct the value `fragment` describes from the store.
///
/// Runs under the store's read lock and never writes.
pub fn read_data(
    store: &Store,
    registry: &SelectionRegistry,
    fragment: &FragmentReference,
) -> Result<ReadDataResult, ReadError> {
    Ok(read_data_tracked(store, registry, fragment)?.result)
}

/// Like [`read_data`], also reporting the ids of the records it visited,
/// including ones it expected but did not find.
pub fn read_data_tracked(
    store: &Store,
    registry: &SelectionRegistry,
    fragment: &FragmentReference,
) -> Result<TrackedRead, ReadError> {
    let mut reader = Reader {
        registry,
        encountered: EncounteredIds::new(),
    };
    let value = store.view(|records| {
        reader.read_record(records, &fragment.selections, &fragment.root, &fragment.variables)
    })?;

    let result = match value {
        Ok(value) => ReadDataResult::Success(match &fragment.transform {
            Some(transform) => transform(value, &fragment.variables),
            None => value,
        }),
        Err(Halt::Missing(missing)) => {
            debug!(root = %fragment.root, record = %missing.record, reason = %missing.reason, "read.missing_data");
            ReadDataResult::MissingData(missing)
        }
        Err(Halt::Error(err)) => return Err(err),
    };

    Ok(TrackedRead {
        result,
        encountered: reader.encountered,
    })
}

/// Why a read stopped before producing a value.
enum Halt {
    Missing(MissingData),
    Error(ReadError),
}

impl From<ReadError> for Halt {
    fn from(err: ReadError) -> Self {
        Halt::Error(err)
    }
}

fn missing(record: &EntityId, reason: String) -> Halt {
    Halt::Missing(MissingData {
        reason,
        record: record.clone(),
    })
}

fn unbound(field: &str, err: UnboundVariable) -> Halt {
    Halt::Error(ReadError::MissingVariable {
        field: field.to_string(),
        variable: err.variable,
    })
}

struct Reader<'a> {
    registry: &'a SelectionRegistry,
    encountered: EncounteredIds,
}

impl Reader<'_> {
    fn read_record(
        &mut self,
        records: &RecordMap,
        selections: &[SelectionNode],
        id: &EntityId,
        variables: &Variables,
    ) -> Result<ReadValue, Halt> {
        self.encountered.insert(id.clone());
        if !records.contains_key(id) {
            return Err(missing(id, format!("record {} is not in the store", id)));
        }

        let mut fields = BTreeMap::new();
        self.read_into(records, selections, id, variables, &mut fields)?;
        Ok(ReadValue::Object(fields))
    }

    fn read_into(
        &mut self,
        records: &RecordMap,
        selections: &[SelectionNode],
        id: &EntityId,
        variables: &Variables,
        fields: &mut BTreeMap<String, ReadValue>,
    ) -> Result<(), Halt> {
        for node in selections {
            let value = match node {
                SelectionNode::Scalar(field) => self.read_scalar(records, field, id, variables)?,
                SelectionNode::Linked(field) => self.read_linked(records, field, id, variables)?,
                SelectionNode::Computed(field) => self.read_computed(records, field, id, variables)?,
            };
            fields.insert(node.response_key().to_string(), value);
        }
        Ok(())
    }

    fn read_scalar(
        &mut self,
        records: &RecordMap,
        field: &ScalarField,
        id: &EntityId,
        variables: &Variables,
    ) -> Result<ReadValue, Halt> {
        let key = field
            .field_key(variables)
            .map_err(|err| unbound(&field.field_name, err))?;
        let value = records
            .get(id)
            .and_then(|record| record.get(&key))
            .ok_or_else(|| missing(id, format!("field {} is missing on {}", key, id)))?;

        scalar_value(value).ok_or_else(|| {
            Halt::Error(ReadError::MalformedScalar {
                record: id.clone(),
                field: key.to_string(),
                found: value.kind(),
            })
        })
    }

    fn read_linked(
        &mut self,
        records: &RecordMap,
        field: &LinkedField,
        id: &EntityId,
        variables: &Variables,
    ) -> Result<ReadValue, Halt> {
        let key = field
            .field_key(variables)
            .map_err(|err| unbound(&field.field_name, err))?;
        let value = records
            .get(id)
            .and_then(|record| record.get(&key))
            .ok_or_else(|| missing(id, format!("field {} is missing on {}", key, id)))?;

        let malformed = |found: &'static str| {
            Halt::Error(ReadError::MalformedLink {
                record: id.clone(),
                field: key.to_string(),
                found,
            })
        };

        match value {
            FieldValue::Scalar(scalar) if scalar.is_null() => Ok(ReadValue::null()),
            FieldValue::Link(target) => self.read_record(records, &field.selections, target, variables),
            FieldValue::List(items) => {
                let mut values = Vec::with_capacity(items.len());
                for item in items {
                    match item {
                        FieldValue::Link(target) => values.push(self.read_record(
                            records,
                            &field.selections,
                            target,
                            variables,
                        )?),
                        FieldValue::Scalar(scalar) if scalar.is_null() => values.push(ReadValue::null()),
                        other => return Err(malformed(other.kind())),
                    }
                }
                Ok(ReadValue::List(values))
            }
            other => Err(malformed(other.kind())),
        }
    }

    fn read_computed(
        &mut self,
        records: &RecordMap,
        field: &ComputedField,
        id: &EntityId,
        variables: &Variables,
    ) -> Result<ReadValue, Halt> {
        let definition = self
            .registry
            .get(&field.definition)
            .ok_or_else(|| ReadError::UnknownComputedField(field.definition.clone()))?;
        let nested_variables = child_variables(&field.arguments, variables);

        match definition.kind {
            ComputedKind::Eager => {
                let mut fields = BTreeMap::new();
                self.read_into(records, &definition.selections, id, &nested_variables, &mut fields)?;
                trace!(record = %id, computed = %definition.name, "read.eager_transform");
                Ok((definition.transform)(ReadValue::Object(fields), &nested_variables))
            }
            ComputedKind::Component => Ok(ReadValue::Deferred(DeferredComponent {
                name: definition.name.clone(),
                fragment: FragmentReference {
                    root: id.clone(),
                    selections: definition.selections.clone(),
                    variables: nested_variables,
                    transform: Some(definition.transform.clone()),
                },
            })),
        }
    }
}

fn scalar_value(value: &FieldValue) -> Option<ReadValue> {
    match value {
        FieldValue::Scalar(scalar) => Some(ReadValue::Scalar(scalar.clone())),
        FieldValue::List(items) => items
            .iter()
            .map(scalar_value)
            .collect::<Option<Vec<_>>>()
            .map(ReadValue::List),
        FieldValue::Link(_) => None,
    }
}
