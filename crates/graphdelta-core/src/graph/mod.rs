//! Narrow property-graph store interface
//!
//! The encoder, the versioning handler and the delta engine only talk to a
//! store through [`GraphStore`], so they run unchanged against the in-memory
//! [`MemoryGraph`] and the SQLite adapter in `graphdelta-store`.

pub mod memory;
pub mod read;

use serde::{Deserialize, Serialize};

use crate::errors::ExResult;
use crate::hash::StatementHash;
use crate::model::{NodeId, RelId};

pub use memory::MemoryGraph;

/// Node labels beyond the node-type labels
pub mod labels {
    pub const DATA_MODEL: &str = "DATA_MODEL";
}

/// Persisted property keys
pub mod props {
    // nodes
    pub const NODE_TYPE: &str = "nodeType";
    pub const URI: &str = "uri";
    pub const VALUE: &str = "value";
    pub const DATA_MODEL: &str = "dataModel";
    pub const RESOURCE_URI: &str = "resourceUri";
    pub const LATEST_VERSION: &str = "latestVersion";

    // relationships
    pub const ORDER: &str = "order";
    pub const INDEX: &str = "index";
    pub const UUID: &str = "uuid";
    pub const HASH: &str = "hash";
    pub const VALID_FROM: &str = "validFrom";
    pub const VALID_TO: &str = "validTo";
    pub const MODIFIES: &str = "modifies";

    // delta marks (nodes and relationships)
    pub const DELTA_STATE: &str = "deltaState";
    pub const MATCHED: &str = "matched";
}

/// Property value
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropValue {
    Bool(bool),
    Int(i64),
    Str(String),
}

impl PropValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            PropValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropValue::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl From<&str> for PropValue {
    fn from(value: &str) -> Self {
        PropValue::Str(value.to_string())
    }
}

impl From<String> for PropValue {
    fn from(value: String) -> Self {
        PropValue::Str(value)
    }
}

impl From<i64> for PropValue {
    fn from(value: i64) -> Self {
        PropValue::Int(value)
    }
}

impl From<bool> for PropValue {
    fn from(value: bool) -> Self {
        PropValue::Bool(value)
    }
}

/// Endpoints and type of one relationship
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelEnds {
    pub start: NodeId,
    pub end: NodeId,
    pub rel_type: String,
}

/// Transactional property-graph store
///
/// All access is synchronous. At most one transaction is open at a time;
/// `begin_tx` while one is open fails with `StoreTransaction`. Ids handed
/// out inside a rolled-back transaction are invalid afterwards.
pub trait GraphStore {
    /// # Errors
    /// `StoreTransaction` when a transaction is already open or the store is busy.
    fn begin_tx(&mut self) -> ExResult<()>;
    /// # Errors
    /// `StoreTransaction` when no transaction is open or the commit fails.
    fn commit(&mut self) -> ExResult<()>;
    /// # Errors
    /// `StoreTransaction` when no transaction is open.
    fn rollback(&mut self) -> ExResult<()>;
    fn in_tx(&self) -> bool;

    /// # Errors
    /// Propagates adapter failures.
    fn create_node(&mut self, labels: &[&str]) -> ExResult<NodeId>;
    /// # Errors
    /// `NotFound` for an unknown node.
    fn add_label(&mut self, node: NodeId, label: &str) -> ExResult<()>;
    /// # Errors
    /// `NotFound` for an unknown node.
    fn labels(&self, node: NodeId) -> ExResult<Vec<String>>;
    /// # Errors
    /// `NotFound` for an unknown node.
    fn set_node_property(&mut self, node: NodeId, key: &str, value: PropValue) -> ExResult<()>;
    /// # Errors
    /// `NotFound` for an unknown node.
    fn node_property(&self, node: NodeId, key: &str) -> ExResult<Option<PropValue>>;
    /// # Errors
    /// `NotFound` for an unknown node.
    fn remove_node_property(&mut self, node: NodeId, key: &str) -> ExResult<()>;
    /// Nodes carrying `label` whose property `key` equals `value`, ascending by id
    ///
    /// # Errors
    /// Propagates adapter failures.
    fn find_nodes(&self, label: &str, key: &str, value: &PropValue) -> ExResult<Vec<NodeId>>;

    /// # Errors
    /// `NotFound` when either endpoint is unknown.
    fn create_relationship(&mut self, from: NodeId, to: NodeId, rel_type: &str) -> ExResult<RelId>;
    /// # Errors
    /// `NotFound` for an unknown relationship.
    fn relationship(&self, rel: RelId) -> ExResult<RelEnds>;
    /// # Errors
    /// `NotFound` for an unknown relationship.
    fn set_rel_property(&mut self, rel: RelId, key: &str, value: PropValue) -> ExResult<()>;
    /// # Errors
    /// `NotFound` for an unknown relationship.
    fn rel_property(&self, rel: RelId, key: &str) -> ExResult<Option<PropValue>>;
    /// # Errors
    /// `NotFound` for an unknown relationship.
    fn remove_rel_property(&mut self, rel: RelId, key: &str) -> ExResult<()>;
    /// Outgoing relationships of `node`, ascending by id
    ///
    /// # Errors
    /// `NotFound` for an unknown node.
    fn outgoing(&self, node: NodeId) -> ExResult<Vec<RelId>>;

    /// # Errors
    /// Propagates adapter failures.
    fn lookup_statement_hash(&self, hash: &StatementHash) -> ExResult<Option<RelId>>;
    /// # Errors
    /// Propagates adapter failures.
    fn register_statement_hash(&mut self, hash: &StatementHash, rel: RelId) -> ExResult<()>;
    /// Returns whether the hash was present
    ///
    /// # Errors
    /// Propagates adapter failures.
    fn remove_statement_hash(&mut self, hash: &StatementHash) -> ExResult<bool>;

    /// Number of relationships, for statistics and tests
    ///
    /// # Errors
    /// Propagates adapter failures.
    fn relationship_count(&self) -> ExResult<usize>;
}

/// Run `f` inside a fresh transaction, committing on success and rolling
/// back on failure
///
/// # Errors
///
/// The error returned by `f`, or the store's transaction errors.
pub fn with_transaction<S, T, F>(store: &mut S, f: F) -> ExResult<T>
where
    S: GraphStore + ?Sized,
    F: FnOnce(&mut S) -> ExResult<T>,
{
    store.begin_tx()?;
    match f(store) {
        Ok(value) => {
            store.commit()?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = store.rollback() {
                tracing::debug!(error = %rollback_err, "rollback after failure also failed");
            }
            Err(err)
        }
    }
}
