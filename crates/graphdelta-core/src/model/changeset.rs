use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::model::statement::StoredStatement;

/// Result of comparing two versions of one record
///
/// All maps are string-keyed for serialization: `additions`/`deletions` by
/// statement hash, everything else by statement uuid.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Changeset {
    /// Statements only present in the new version
    pub additions: BTreeMap<String, StoredStatement>,
    /// Statements only present in the old version
    pub deletions: BTreeMap<String, StoredStatement>,
    /// Old statement uuid -> new statement uuid
    pub modifications: BTreeMap<String, String>,
    /// Old side of every modification
    pub existing_modified_statements: BTreeMap<String, StoredStatement>,
    /// New side of every modification
    pub new_modified_statements: BTreeMap<String, StoredStatement>,
}

impl Changeset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a new version is worth persisting
    pub fn has_changes(&self) -> bool {
        !self.additions.is_empty()
            || !self.deletions.is_empty()
            || !self.modifications.is_empty()
            || !self.existing_modified_statements.is_empty()
            || !self.new_modified_statements.is_empty()
    }
}
