//! Statement identity and hash index
//!
//! A statement hash is a pure function of the statement's logical
//! identifiers:
//!
//! ```text
//! sha256("{subjectType}:{subjectId} {predicate} {objectType}:{objectId} {dataModel}")
//! ```
//!
//! Resource ids are URIs (data-model scoped resources carry `@dataModel`),
//! literal ids are their value, blank-node ids are store node ids and so
//! only stable within one store.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

use crate::errors::{ExResult, GraphDeltaError};
use crate::graph::read::{describe_node, rel_str};
use crate::graph::{props, GraphStore};
use crate::model::{NodeDescriptor, NodeType, RelId};

/// Hex-encoded SHA-256 statement digest
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StatementHash(String);

impl StatementHash {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Wrap a digest read back from the store
    pub fn from_hex(hex: impl Into<String>) -> Self {
        Self(hex.into())
    }
}

impl fmt::Display for StatementHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Logical identifiers of one statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatementKey<'a> {
    pub subject_type: NodeType,
    pub subject_id: &'a str,
    pub predicate: &'a str,
    pub object_type: NodeType,
    pub object_id: &'a str,
    pub data_model: &'a str,
}

impl StatementKey<'_> {
    pub fn canonical(&self) -> String {
        format!(
            "{}:{} {} {}:{} {}",
            self.subject_type,
            self.subject_id,
            self.predicate,
            self.object_type,
            self.object_id,
            self.data_model
        )
    }

    pub fn digest(&self) -> StatementHash {
        hash_string(&self.canonical())
    }
}

fn hash_string(s: &str) -> StatementHash {
    let mut hasher = Sha256::new();
    hasher.update(s.as_bytes());
    StatementHash(hex::encode(hasher.finalize()))
}

/// Hash of a statement from its endpoint descriptors
pub fn hash(
    subject: &NodeDescriptor,
    predicate: &str,
    object: &NodeDescriptor,
    data_model: &str,
) -> StatementHash {
    let subject_id = subject.identifier();
    let object_id = object.identifier();
    StatementKey {
        subject_type: subject.node_type,
        subject_id: &subject_id,
        predicate,
        object_type: object.node_type,
        object_id: &object_id,
        data_model,
    }
    .digest()
}

/// Relationship registered for `hash`, if any
///
/// # Errors
///
/// Propagates store failures.
pub fn lookup<S: GraphStore + ?Sized>(store: &S, hash: &StatementHash) -> ExResult<Option<RelId>> {
    store.lookup_statement_hash(hash)
}

/// Register `rel` under `hash`
///
/// # Errors
///
/// `HashCollision` when the hash already points at another relationship.
pub fn register<S: GraphStore + ?Sized>(
    store: &mut S,
    hash: &StatementHash,
    rel: RelId,
) -> ExResult<()> {
    if let Some(existing) = store.lookup_statement_hash(hash)? {
        if existing != rel {
            return Err(GraphDeltaError::HashCollision {
                hash: hash.to_string(),
                existing_rel: existing.to_string(),
            }
            .into());
        }
        return Ok(());
    }
    store.register_statement_hash(hash, rel)?;
    store.set_rel_property(rel, props::HASH, hash.as_str().into())
}

/// Check that an index hit really is the statement that was hashed
///
/// # Errors
///
/// `HashCollision` when the relationship behind the hit hashes differently.
pub fn verify_hit<S: GraphStore + ?Sized>(
    store: &S,
    hash: &StatementHash,
    rel: RelId,
) -> ExResult<()> {
    let ends = store.relationship(rel)?;
    let data_model = rel_str(store, rel, props::DATA_MODEL)?.unwrap_or_default();
    let recomputed = self::hash(
        &describe_node(store, ends.start)?,
        &ends.rel_type,
        &describe_node(store, ends.end)?,
        &data_model,
    );
    if &recomputed != hash {
        return Err(GraphDeltaError::HashCollision {
            hash: hash.to_string(),
            existing_rel: rel.to_string(),
        }
        .into());
    }
    Ok(())
}
