use std::collections::HashSet;

use tracing::{debug, trace};

use super::RetainedQuery;
use crate::selection::{child_variables, SelectionNode, SelectionRegistry, Variables};
use crate::store::{EntityId, RecordMap, Store, StoreError};

/// Delete every record the given queries cannot reach. Returns how many
/// records were removed.
///
/// Reachability follows each query's selections from its root, so records
/// linked only through fields no live query selects are collected too. The
/// root record itself is always kept.
pub fn garbage_collect<'a, I>(
    store: &Store,
    registry: &SelectionRegistry,
    queries: I,
) -> Result<usize, StoreError>
where
    I: IntoIterator<Item = &'a RetainedQuery>,
{
    let removed = store.update(|records| {
        let mut reachable: HashSet<EntityId> = HashSet::from([EntityId::root()]);
        for query in queries {
            if records.contains_key(&query.root) {
                reachable.insert(query.root.clone());
                mark(records, registry, &query.selections, &query.root, &query.variables, &mut reachable);
            }
        }

        let before = records.len();
        records.retain(|id, _| reachable.contains(id));
        before - records.len()
    })?;

    debug!(removed, "gc.collect");
    Ok(removed)
}

fn mark(
    records: &RecordMap,
    registry: &SelectionRegistry,
    selections: &[SelectionNode],
    id: &EntityId,
    variables: &Variables,
    reachable: &mut HashSet<EntityId>,
) {
    let Some(record) = records.get(id) else {
        return;
    };

    for node in selections {
        match node {
            SelectionNode::Scalar(_) => {}
            SelectionNode::Linked(field) => {
                let Ok(key) = field.field_key(variables) else {
                    trace!(record = %id, field = %field.field_name, "gc.unbound_variable");
                    continue;
                };
                let Some(value) = record.get(&key) else {
                    continue;
                };
                for target in value.links() {
                    if records.contains_key(target) {
                        reachable.insert(target.clone());
                        mark(records, registry, &field.selections, target, variables, reachable);
                    }
                }
            }
            SelectionNode::Computed(field) => {
                if let Some(definition) = registry.get(&field.definition) {
                    let nested = child_variables(&field.arguments, variables);
                    mark(records, registry, &definition.selections, id, &nested, reachable);
                }
            }
        }
    }
}
