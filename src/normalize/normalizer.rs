use std::collections::HashSet;

use serde_json::{Map, Value};
use tracing::{debug, trace};

use super::NormalizeError;
use crate::selection::{
    child_variables, LinkedField, ScalarField, SelectionNode, SelectionRegistry, UnboundVariable,
    Variables,
};
use crate::store::{EntityId, FieldKey, FieldValue, RecordMap, Scalar, Store};

/// Ids of the records a write actually changed.
pub type EncounteredIds = HashSet<EntityId>;

/// Response field that carries an entity's own identifier, unless configured.
pub const DEFAULT_ID_FIELD: &str = "id";

/// Merge `response` into the store, starting at the record `root`.
///
/// The whole write happens under one exclusive lock, so readers never see
/// half of it. Returns the ids of every record whose contents changed.
pub fn normalize(
    store: &Store,
    registry: &SelectionRegistry,
    selections: &[SelectionNode],
    response: &Map<String, Value>,
    variables: &Variables,
    root: &EntityId,
) -> Result<EncounteredIds, NormalizeError> {
    Normalizer::new(registry, DEFAULT_ID_FIELD).normalize(store, selections, response, variables, root)
}

/// Write-path interpreter: walks a response together with its selections.
pub struct Normalizer<'a> {
    registry: &'a SelectionRegistry,
    id_field: &'a str,
}

impl<'a> Normalizer<'a> {
    pub fn new(registry: &'a SelectionRegistry, id_field: &'a str) -> Self {
        Normalizer { registry, id_field }
    }

    pub fn normalize(
        &self,
        store: &Store,
        selections: &[SelectionNode],
        response: &Map<String, Value>,
        variables: &Variables,
        root: &EntityId,
    ) -> Result<EncounteredIds, NormalizeError> {
        let mut encountered = EncounteredIds::new();
        store.update(|records| {
            records.entry(root.clone()).or_default();
            self.normalize_into_record(records, selections, response, root, variables, &mut encountered)
        })??;

        debug!(root = %root, changed = encountered.len(), "normalize.done");
        Ok(encountered)
    }

    fn normalize_into_record(
        &self,
        records: &mut RecordMap,
        selections: &[SelectionNode],
        response: &Map<String, Value>,
        record_id: &EntityId,
        variables: &Variables,
        encountered: &mut EncounteredIds,
    ) -> Result<(), NormalizeError> {
        let mut changed = false;
        for node in selections {
            match node {
                SelectionNode::Scalar(field) => {
                    changed |= self.normalize_scalar(records, field, response, record_id, variables)?;
                }
                SelectionNode::Linked(field) => {
                    changed |= self.normalize_linked(
                        records,
                        field,
                        response,
                        record_id,
                        variables,
                        encountered,
                    )?;
                }
                SelectionNode::Computed(field) => {
                    let definition = self
                        .registry
                        .get(&field.definition)
                        .ok_or_else(|| NormalizeError::UnknownComputedField(field.definition.clone()))?;
                    let nested_variables = child_variables(&field.arguments, variables);
                    self.normalize_into_record(
                        records,
                        &definition.selections,
                        response,
                        record_id,
                        &nested_variables,
                        encountered,
                    )?;
                }
            }
        }

        if changed {
            encountered.insert(record_id.clone());
        }
        Ok(())
    }

    fn normalize_scalar(
        &self,
        records: &mut RecordMap,
        field: &ScalarField,
        response: &Map<String, Value>,
        record_id: &EntityId,
        variables: &Variables,
    ) -> Result<bool, NormalizeError> {
        let key = field
            .field_key(variables)
            .map_err(|err| missing_variable(&field.field_name, err))?;
        let Some(data) = response.get(field.response_key()) else {
            trace!(record = %record_id, field = %key, "normalize.absent_in_response");
            return Ok(false);
        };

        let value = scalar_value(data).ok_or_else(|| NormalizeError::UnexpectedShape {
            field: key.to_string(),
            expected: "scalar",
            found: json_kind(data),
        })?;
        Ok(set_field(records, record_id, key, value))
    }

    fn normalize_linked(
        &self,
        records: &mut RecordMap,
        field: &LinkedField,
        response: &Map<String, Value>,
        record_id: &EntityId,
        variables: &Variables,
        encountered: &mut EncounteredIds,
    ) -> Result<bool, NormalizeError> {
        let key = field
            .field_key(variables)
            .map_err(|err| missing_variable(&field.field_name, err))?;
        let Some(data) = response.get(field.response_key()) else {
            trace!(record = %record_id, field = %key, "normalize.absent_in_response");
            return Ok(false);
        };

        let value = match data {
            Value::Null => FieldValue::null(),
            Value::Object(object) => {
                let child_id =
                    self.normalize_object(records, field, &key, object, record_id, None, variables, encountered)?;
                FieldValue::Link(child_id)
            }
            Value::Array(items) => {
                let mut links = Vec::with_capacity(items.len());
                for (index, item) in items.iter().enumerate() {
                    match item {
                        Value::Null => links.push(FieldValue::null()),
                        Value::Object(object) => {
                            let child_id = self.normalize_object(
                                records,
                                field,
                                &key,
                                object,
                                record_id,
                                Some(index),
                                variables,
                                encountered,
                            )?;
                            links.push(FieldValue::Link(child_id));
                        }
                        other => {
                            return Err(NormalizeError::UnexpectedShape {
                                field: key.to_string(),
                                expected: "object",
                                found: json_kind(other),
                            })
                        }
                    }
                }
                FieldValue::List(links)
            }
            other => {
                return Err(NormalizeError::UnexpectedShape {
                    field: key.to_string(),
                    expected: "object",
                    found: json_kind(other),
                })
            }
        };

        Ok(set_field(records, record_id, key, value))
    }

    #[allow(clippy::too_many_arguments)]
    fn normalize_object(
        &self,
        records: &mut RecordMap,
        field: &LinkedField,
        key: &FieldKey,
        object: &Map<String, Value>,
        parent_id: &EntityId,
        index: Option<usize>,
        variables: &Variables,
        encountered: &mut EncounteredIds,
    ) -> Result<EntityId, NormalizeError> {
        let child_id = self.entity_id_of(object, parent_id, key, index)?;
        if !records.contains_key(&child_id) {
            records.insert(child_id.clone(), Default::default());
            encountered.insert(child_id.clone());
        }
        self.normalize_into_record(records, &field.selections, object, &child_id, variables, encountered)?;
        Ok(child_id)
    }

    /// The object's own identifier when present, otherwise its path.
    fn entity_id_of(
        &self,
        object: &Map<String, Value>,
        parent_id: &EntityId,
        key: &FieldKey,
        index: Option<usize>,
    ) -> Result<EntityId, NormalizeError> {
        match object.get(self.id_field) {
            None | Some(Value::Null) => Ok(parent_id.child(key, index)),
            Some(Value::String(id)) => Ok(EntityId::new(id.as_str())),
            Some(Value::Number(id)) => Ok(EntityId::new(id.to_string())),
            Some(other) => Err(NormalizeError::InvalidId {
                field: key.to_string(),
                value: other.to_string(),
            }),
        }
    }
}

fn set_field(records: &mut RecordMap, id: &EntityId, key: FieldKey, value: FieldValue) -> bool {
    records.entry(id.clone()).or_default().set(key, value)
}

/// Scalars and lists of scalars are stored inline. An empty list counts as a
/// list of scalars.
fn scalar_value(data: &Value) -> Option<FieldValue> {
    match data {
        Value::Array(items) => items
            .iter()
            .map(scalar_value)
            .collect::<Option<Vec<_>>>()
            .map(FieldValue::List),
        other => Scalar::from_json(other).map(FieldValue::Scalar),
    }
}

fn missing_variable(field: &str, err: UnboundVariable) -> NormalizeError {
    NormalizeError::MissingVariable {
        field: field.to_string(),
        variable: err.variable,
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selection::{Argument, ArgumentValue};
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    fn write(store: &Store, selections: &[SelectionNode], response: Value, variables: Value) -> EncounteredIds {
        normalize(
            store,
            &SelectionRegistry::new(),
            selections,
            &object(response),
            &object(variables),
            &EntityId::root(),
        )
        .unwrap()
    }

    fn field(store: &Store, id: &str, key: FieldKey) -> Option<FieldValue> {
        store.get_field(&EntityId::new(id), &key).unwrap().flatten()
    }

    #[test]
    fn list_of_entities_normalizes_to_links() {
        let store = Store::new();
        let selections = [SelectionNode::linked(
            "pets",
            vec![SelectionNode::scalar("id"), SelectionNode::scalar("name")],
        )];
        write(
            &store,
            &selections,
            json!({"pets": [{"id": "0", "name": "A"}, {"id": "1", "name": "B"}]}),
            json!({}),
        );

        assert_eq!(
            field(&store, "__ROOT", FieldKey::new("pets")),
            Some(FieldValue::List(vec![FieldValue::link("0"), FieldValue::link("1")]))
        );
        assert_eq!(field(&store, "0", FieldKey::new("name")), Some(Scalar::from("A").into()));
        assert_eq!(field(&store, "1", FieldKey::new("name")), Some(Scalar::from("B").into()));
    }

    #[test]
    fn parameterized_fields_do_not_overwrite_each_other() {
        let store = Store::new();
        let pets = [SelectionNode::linked("pets", vec![SelectionNode::scalar("id")])
            .with_argument("first", ArgumentValue::Variable("first".into()))];
        write(&store, &pets, json!({"pets": [{"id": "0"}]}), json!({"first": 5}));
        write(&store, &pets, json!({"pets": [{"id": "1"}]}), json!({"first": 10}));

        let five = FieldKey::with_arguments("pets", vec![("first".into(), json!(5))]);
        let ten = FieldKey::with_arguments("pets", vec![("first".into(), json!(10))]);
        assert_eq!(field(&store, "__ROOT", five), Some(FieldValue::List(vec![FieldValue::link("0")])));
        assert_eq!(field(&store, "__ROOT", ten), Some(FieldValue::List(vec![FieldValue::link("1")])));
    }

    #[test]
    fn objects_without_ids_get_path_ids() {
        let store = Store::new();
        let selections = [SelectionNode::linked("viewer", vec![SelectionNode::scalar("name")])];
        write(&store, &selections, json!({"viewer": {"name": "me"}}), json!({}));

        assert_eq!(
            field(&store, "__ROOT", FieldKey::new("viewer")),
            Some(FieldValue::link("__ROOT.viewer"))
        );
        assert_eq!(field(&store, "__ROOT.viewer", FieldKey::new("name")), Some(Scalar::from("me").into()));
    }

    #[test]
    fn missing_variable_is_a_hard_error() {
        let store = Store::new();
        let selections = [SelectionNode::scalar("greeting")
            .with_argument("name", ArgumentValue::Variable("who".into()))];
        let err = normalize(
            &store,
            &SelectionRegistry::new(),
            &selections,
            &object(json!({"greeting": "hi"})),
            &Variables::new(),
            &EntityId::root(),
        )
        .unwrap_err();

        assert_eq!(
            err,
            NormalizeError::MissingVariable {
                field: "greeting".into(),
                variable: "who".into()
            }
        );
    }

    #[test]
    fn scalar_field_rejects_objects() {
        let store = Store::new();
        let err = normalize(
            &store,
            &SelectionRegistry::new(),
            &[SelectionNode::scalar("name")],
            &object(json!({"name": {"first": "x"}})),
            &Variables::new(),
            &EntityId::root(),
        )
        .unwrap_err();
        assert!(matches!(err, NormalizeError::UnexpectedShape { expected: "scalar", .. }));
    }

    #[test]
    fn null_links_and_scalar_lists() {
        let store = Store::new();
        let selections = [
            SelectionNode::linked("bestFriend", vec![SelectionNode::scalar("id")]),
            SelectionNode::scalar("tags"),
        ];
        write(&store, &selections, json!({"bestFriend": null, "tags": ["a", "b"]}), json!({}));

        assert_eq!(field(&store, "__ROOT", FieldKey::new("bestFriend")), Some(FieldValue::null()));
        assert_eq!(
            field(&store, "__ROOT", FieldKey::new("tags")),
            Some(FieldValue::List(vec![Scalar::from("a").into(), Scalar::from("b").into()]))
        );
    }

    #[test]
    fn encountered_ids_track_changes_only() {
        let store = Store::new();
        let selections = [SelectionNode::linked(
            "pet",
            vec![SelectionNode::scalar("id"), SelectionNode::scalar("name")],
        )];
        let first = write(&store, &selections, json!({"pet": {"id": "0", "name": "A"}}), json!({}));
        assert!(first.contains(&EntityId::root()));
        assert!(first.contains(&EntityId::new("0")));

        let unchanged = write(&store, &selections, json!({"pet": {"id": "0", "name": "A"}}), json!({}));
        assert!(unchanged.is_empty());

        let renamed = write(&store, &selections, json!({"pet": {"id": "0", "name": "B"}}), json!({}));
        assert_eq!(renamed.into_iter().collect::<Vec<_>>(), vec![EntityId::new("0")]);
    }

    #[test]
    fn numeric_ids_are_accepted() {
        let store = Store::new();
        let selections = [SelectionNode::linked("pet", vec![SelectionNode::scalar("id")])];
        write(&store, &selections, json!({"pet": {"id": 7}}), json!({}));
        assert_eq!(field(&store, "__ROOT", FieldKey::new("pet")), Some(FieldValue::link("7")));
    }

    #[test]
    fn literal_and_variable_arguments_share_keys() {
        let store = Store::new();
        let literal = [SelectionNode::scalar("avatar").with_argument("size", ArgumentValue::Literal(json!(64)))];
        let by_variable = [SelectionNode::Scalar(crate::selection::ScalarField {
            field_name: "avatar".into(),
            alias: None,
            arguments: vec![Argument::variable("size", "px")],
        })];
        write(&store, &literal, json!({"avatar": "a.png"}), json!({}));
        let changed = write(&store, &by_variable, json!({"avatar": "a.png"}), json!({"px": 64}));

        assert!(changed.is_empty());
        assert_eq!(store.get_record(&EntityId::root()).unwrap().unwrap().len(), 1);
    }
}
