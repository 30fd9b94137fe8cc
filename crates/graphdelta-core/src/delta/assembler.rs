//! Changeset assembly from persisted delta marks

use std::collections::HashMap;

use crate::delta::view::RecordView;
use crate::errors::ExResult;
use crate::graph::read::{read_statement, rel_str};
use crate::graph::{props, GraphStore};
use crate::model::{Changeset, DeltaState, RelId, StoredStatement};

fn marked<S: GraphStore + ?Sized>(store: &S, rel: RelId) -> ExResult<Option<DeltaState>> {
    match rel_str(store, rel, props::DELTA_STATE)? {
        Some(name) => Ok(Some(name.parse::<DeltaState>()?)),
        None => Ok(None),
    }
}

fn hash_key(statement: &StoredStatement) -> String {
    if statement.hash.is_empty() {
        statement.uuid.clone()
    } else {
        statement.hash.clone()
    }
}

/// Read the marks of both versions back into a [`Changeset`]
///
/// Additions come from the new version, deletions from the old one, both
/// keyed by statement hash. Modifications are keyed by statement uuid and
/// read from the `modifies` property of the new side.
///
/// # Errors
///
/// Propagates store failures and unknown persisted state names.
pub fn assemble<S: GraphStore + ?Sized>(
    store: &S,
    old_view: &RecordView,
    new_view: &RecordView,
    max_depth: usize,
) -> ExResult<Changeset> {
    let mut changeset = Changeset::new();

    let (_, old_rels) = old_view.reachable(store, max_depth)?;
    let mut old_by_uuid: HashMap<String, StoredStatement> = HashMap::new();
    for rel in old_rels {
        let statement = read_statement(store, rel)?;
        if marked(store, rel)? == Some(DeltaState::Deletion) {
            changeset.deletions.insert(hash_key(&statement), statement.clone());
        }
        old_by_uuid.insert(statement.uuid.clone(), statement);
    }

    let (_, new_rels) = new_view.reachable(store, max_depth)?;
    for rel in new_rels {
        let state = marked(store, rel)?;
        if state == Some(DeltaState::Addition) {
            let statement = read_statement(store, rel)?;
            changeset.additions.insert(hash_key(&statement), statement);
            continue;
        }
        let Some(old_uuid) = rel_str(store, rel, props::MODIFIES)? else {
            continue;
        };
        let statement = read_statement(store, rel)?;
        match old_by_uuid.get(&old_uuid) {
            Some(old) => {
                changeset
                    .modifications
                    .insert(old_uuid.clone(), statement.uuid.clone());
                changeset
                    .existing_modified_statements
                    .insert(old_uuid, old.clone());
                changeset
                    .new_modified_statements
                    .insert(statement.uuid.clone(), statement);
            }
            None => tracing::debug!(
                record_uri = new_view.record_uri(),
                old_uuid = %old_uuid,
                "modified statement has no visible predecessor"
            ),
        }
    }

    Ok(changeset)
}
