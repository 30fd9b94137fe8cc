//! Data-model versions and statement deprecation
//!
//! Every data model has one `DATA_MODEL` node carrying `latestVersion`.
//! Statements are valid over `[validFrom, validTo)`; deprecating sets
//! `validTo` and drops the statement from the hash index, so a later
//! import of the same fact starts a new lineage instead of reviving the
//! old edge. Nothing is ever deleted.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::errors::{ExError, ExErrorKind, ExResult};
use crate::graph::read::{node_int, node_str, node_type, rel_int, rel_str};
use crate::graph::{labels, props, with_transaction, GraphStore};
use crate::hash::StatementHash;
use crate::model::{NodeId, NodeType, Range, RelId};

/// Version a data model starts at
pub const BOOTSTRAP_VERSION: i64 = 1;

/// Result of a deprecation run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeprecationStats {
    /// Statements whose `validTo` was set
    pub deprecated: u64,
    /// Seed records visited
    pub records: u64,
}

fn data_model_node<S: GraphStore + ?Sized>(store: &S, data_model: &str) -> ExResult<Option<NodeId>> {
    Ok(store
        .find_nodes(labels::DATA_MODEL, props::URI, &data_model.into())?
        .into_iter()
        .next())
}

/// Latest version of `data_model`; [`BOOTSTRAP_VERSION`] when it was never
/// written
///
/// # Errors
///
/// Propagates store failures.
pub fn current_version<S: GraphStore + ?Sized>(store: &S, data_model: &str) -> ExResult<i64> {
    match data_model_node(store, data_model)? {
        Some(node) => Ok(node_int(store, node, props::LATEST_VERSION)?.unwrap_or(BOOTSTRAP_VERSION)),
        None => Ok(BOOTSTRAP_VERSION),
    }
}

/// Current version, creating the data-model node at the bootstrap version
/// when missing
///
/// # Errors
///
/// Propagates store failures.
pub fn ensure_data_model<S: GraphStore + ?Sized>(store: &mut S, data_model: &str) -> ExResult<i64> {
    if data_model_node(&*store, data_model)?.is_some() {
        return current_version(&*store, data_model);
    }
    create_data_model(store, data_model)?;
    Ok(BOOTSTRAP_VERSION)
}

fn create_data_model<S: GraphStore + ?Sized>(store: &mut S, data_model: &str) -> ExResult<NodeId> {
    let node = store.create_node(&[labels::DATA_MODEL])?;
    store.set_node_property(node, props::URI, data_model.into())?;
    store.set_node_property(node, props::LATEST_VERSION, BOOTSTRAP_VERSION.into())?;
    tracing::debug!(data_model, "data model created");
    Ok(node)
}

/// Persist and return the next version of `data_model`
///
/// The first call on an unknown data model creates it at the bootstrap
/// version and returns that.
///
/// # Errors
///
/// Propagates store failures.
pub fn advance_version<S: GraphStore + ?Sized>(store: &mut S, data_model: &str) -> ExResult<i64> {
    let Some(node) = data_model_node(&*store, data_model)? else {
        create_data_model(store, data_model)?;
        return Ok(BOOTSTRAP_VERSION);
    };
    let next = node_int(&*store, node, props::LATEST_VERSION)?.unwrap_or(BOOTSTRAP_VERSION) + 1;
    store.set_node_property(node, props::LATEST_VERSION, next.into())?;
    tracing::debug!(data_model, version = next, "version advanced");
    Ok(next)
}

/// Deprecate every live statement of `data_model` through `through_version`
///
/// Seeds are all resource nodes of the data model; each seed runs in its
/// own transaction, so the store must not have one open.
///
/// # Errors
///
/// - `InvalidRange` when a live statement became valid after `through_version`
/// - `DeterminismViolation` when a record subgraph is deeper than `max_depth`
/// - store failures
///
/// The failing seed's transaction is rolled back; earlier seeds stay
/// deprecated.
pub fn deprecate_data_model<S: GraphStore + ?Sized>(
    store: &mut S,
    data_model: &str,
    through_version: i64,
    max_depth: usize,
) -> ExResult<DeprecationStats> {
    let seeds = store.find_nodes(
        NodeType::Resource.as_str(),
        props::DATA_MODEL,
        &data_model.into(),
    )?;
    let mut stats = DeprecationStats::default();
    for seed in seeds {
        let uri = node_str(&*store, seed, props::URI)?.unwrap_or_default();
        stats.deprecated += deprecate_seed(store, seed, &uri, data_model, through_version, max_depth)?;
        stats.records += 1;
    }
    Ok(stats)
}

/// Deprecate the live statements of the given records through `through_version`
///
/// Records that do not exist in `data_model` are skipped.
///
/// # Errors
///
/// As for [`deprecate_data_model`].
pub fn deprecate_records<S: GraphStore + ?Sized>(
    store: &mut S,
    data_model: &str,
    record_uris: &[String],
    through_version: i64,
    max_depth: usize,
) -> ExResult<DeprecationStats> {
    let mut stats = DeprecationStats::default();
    let mut seen = HashSet::new();
    for uri in record_uris {
        if !seen.insert(uri.as_str()) {
            continue;
        }
        let roots = store.find_nodes(NodeType::Resource.as_str(), props::URI, &uri.as_str().into())?;
        let mut root = None;
        for node in roots {
            if node_str(&*store, node, props::DATA_MODEL)?.as_deref() == Some(data_model) {
                root = Some(node);
                break;
            }
        }
        let Some(root) = root else {
            tracing::debug!(record_uri = %uri, data_model, "record not found, nothing to deprecate");
            continue;
        };
        stats.deprecated += deprecate_seed(store, root, uri, data_model, through_version, max_depth)?;
        stats.records += 1;
    }
    Ok(stats)
}

fn deprecate_seed<S: GraphStore + ?Sized>(
    store: &mut S,
    seed: NodeId,
    record_uri: &str,
    data_model: &str,
    through_version: i64,
    max_depth: usize,
) -> ExResult<u64> {
    let count = with_transaction(store, |s| {
        let mut live = Vec::new();
        let mut visited = HashSet::new();
        collect_live(&*s, seed, record_uri, data_model, 0, max_depth, &mut visited, &mut live)?;
        for rel in &live {
            deprecate_statement(s, *rel, through_version)?;
        }
        Ok(live.len() as u64)
    })?;
    tracing::debug!(record_uri, data_model, deprecated = count, "record deprecated");
    Ok(count)
}

#[allow(clippy::too_many_arguments)]
fn collect_live<S: GraphStore + ?Sized>(
    store: &S,
    node: NodeId,
    record_uri: &str,
    data_model: &str,
    depth: usize,
    max_depth: usize,
    visited: &mut HashSet<NodeId>,
    live: &mut Vec<RelId>,
) -> ExResult<()> {
    if !visited.insert(node) {
        return Ok(());
    }
    if depth > max_depth {
        return Err(ExError::new(ExErrorKind::DeterminismViolation)
            .with_op("deprecate")
            .with_record_uri(record_uri)
            .with_entity_id(node.to_string())
            .with_message(format!("record subgraph deeper than {}", max_depth)));
    }
    for rel in store.outgoing(node)? {
        if !belongs_to(store, rel, record_uri, data_model)? {
            continue;
        }
        let ends = store.relationship(rel)?;
        if rel_int(store, rel, props::VALID_TO)?.is_none() {
            live.push(rel);
        }
        if node_type(store, ends.end)?.is_blank() {
            collect_live(store, ends.end, record_uri, data_model, depth + 1, max_depth, visited, live)?;
        }
    }
    Ok(())
}

fn belongs_to<S: GraphStore + ?Sized>(
    store: &S,
    rel: RelId,
    record_uri: &str,
    data_model: &str,
) -> ExResult<bool> {
    let owner_ok = match rel_str(store, rel, props::RESOURCE_URI)? {
        Some(owner) => owner == record_uri,
        None => true,
    };
    let dm_ok = match rel_str(store, rel, props::DATA_MODEL)? {
        Some(dm) => dm == data_model,
        None => true,
    };
    Ok(owner_ok && dm_ok)
}

fn deprecate_statement<S: GraphStore + ?Sized>(
    store: &mut S,
    rel: RelId,
    through_version: i64,
) -> ExResult<()> {
    if let Some(valid_from) = rel_int(&*store, rel, props::VALID_FROM)? {
        Range::new(valid_from, through_version)
            .map_err(|e| ExError::from(e).with_op("deprecate").with_entity_id(rel.to_string()))?;
    }
    store.set_rel_property(rel, props::VALID_TO, through_version.into())?;
    if let Some(hex) = rel_str(&*store, rel, props::HASH)? {
        let hash = StatementHash::from_hex(hex);
        if store.lookup_statement_hash(&hash)? == Some(rel) {
            store.remove_statement_hash(&hash)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::{encode, EncodeContext};
    use crate::graph::MemoryGraph;
    use crate::model::{Statement, Term};

    const DM: &str = "http://ex.org/dm/1";

    fn load(g: &mut MemoryGraph, version: i64, statements: &[Statement]) {
        let mut ctx = EncodeContext::new(DM, version);
        for st in statements {
            encode(g, &mut ctx, st).unwrap();
        }
    }

    fn record(uri: &str) -> Vec<Statement> {
        vec![
            Statement::new(Term::resource(uri), "http://ex.org/title", Term::literal("A")),
            Statement::new(Term::resource(uri), "http://ex.org/author", Term::bnode(format!("{uri}-a"))),
            Statement::new(Term::bnode(format!("{uri}-a")), "http://ex.org/name", Term::literal("Doe")),
        ]
    }

    #[test]
    fn test_bootstrap_version_without_node() {
        let g = MemoryGraph::new();
        assert_eq!(current_version(&g, DM).unwrap(), 1);
    }

    #[test]
    fn test_advance_creates_then_increments() {
        let mut g = MemoryGraph::new();
        assert_eq!(advance_version(&mut g, DM).unwrap(), 1);
        assert_eq!(advance_version(&mut g, DM).unwrap(), 2);
        assert_eq!(current_version(&g, DM).unwrap(), 2);
        assert_eq!(ensure_data_model(&mut g, DM).unwrap(), 2);
    }

    #[test]
    fn test_deprecate_data_model_is_monotone() {
        let mut g = MemoryGraph::new();
        load(&mut g, 1, &record("http://ex.org/r1"));

        let first = deprecate_data_model(&mut g, DM, 2, 64).unwrap();
        let second = deprecate_data_model(&mut g, DM, 3, 64).unwrap();

        assert_eq!(first.deprecated, 3);
        assert_eq!(second.deprecated, 0);
    }

    #[test]
    fn test_deprecation_clears_hash_index() {
        let mut g = MemoryGraph::new();
        let st = Statement::new(Term::resource("http://ex.org/r1"), "p", Term::literal("A"));
        let mut ctx = EncodeContext::new(DM, 1);
        let first = encode(&mut g, &mut ctx, &st).unwrap();

        deprecate_records(&mut g, DM, &["http://ex.org/r1".to_string()], 2, 64).unwrap();
        let mut ctx = EncodeContext::new(DM, 2);
        let second = encode(&mut g, &mut ctx, &st).unwrap();

        assert!(second.created);
        assert_ne!(first.relationship, second.relationship);
        assert_eq!(rel_int(&g, first.relationship, props::VALID_TO).unwrap(), Some(2));
        assert_eq!(rel_int(&g, second.relationship, props::VALID_TO).unwrap(), None);
    }

    #[test]
    fn test_deprecate_records_leaves_other_records_live() {
        let mut g = MemoryGraph::new();
        load(&mut g, 1, &record("http://ex.org/r1"));
        load(&mut g, 1, &record("http://ex.org/r2"));

        let stats = deprecate_records(
            &mut g,
            DM,
            &["http://ex.org/r1".to_string(), "http://ex.org/missing".to_string()],
            2,
            64,
        )
        .unwrap();

        assert_eq!(stats, DeprecationStats { deprecated: 3, records: 1 });
        let rest = deprecate_data_model(&mut g, DM, 2, 64).unwrap();
        assert_eq!(rest.deprecated, 3);
    }
}
