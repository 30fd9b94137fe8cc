//! Typed reads of persisted node and relationship properties

use crate::errors::{ExError, ExErrorKind, ExResult, GraphDeltaError};
use crate::graph::{props, GraphStore};
use crate::model::{NodeDescriptor, NodeId, NodeType, Range, RelId, StoredStatement};

pub fn node_str<S: GraphStore + ?Sized>(store: &S, node: NodeId, key: &str) -> ExResult<Option<String>> {
    Ok(store
        .node_property(node, key)?
        .and_then(|v| v.as_str().map(str::to_string)))
}

pub fn node_int<S: GraphStore + ?Sized>(store: &S, node: NodeId, key: &str) -> ExResult<Option<i64>> {
    Ok(store.node_property(node, key)?.and_then(|v| v.as_int()))
}

pub fn rel_str<S: GraphStore + ?Sized>(store: &S, rel: RelId, key: &str) -> ExResult<Option<String>> {
    Ok(store
        .rel_property(rel, key)?
        .and_then(|v| v.as_str().map(str::to_string)))
}

pub fn rel_int<S: GraphStore + ?Sized>(store: &S, rel: RelId, key: &str) -> ExResult<Option<i64>> {
    Ok(store.rel_property(rel, key)?.and_then(|v| v.as_int()))
}

/// Node type recorded on a node
///
/// # Errors
///
/// `Internal` when the node carries no node type, `InvalidInput` when the
/// recorded name is unknown.
pub fn node_type<S: GraphStore + ?Sized>(store: &S, node: NodeId) -> ExResult<NodeType> {
    let name = node_str(store, node, props::NODE_TYPE)?.ok_or_else(|| {
        ExError::new(ExErrorKind::Internal)
            .with_op("node_type")
            .with_entity_id(node.to_string())
            .with_message("node has no nodeType property")
    })?;
    name.parse::<NodeType>()
        .map_err(|e: GraphDeltaError| ExError::from(e).with_entity_id(node.to_string()))
}

/// # Errors
///
/// Propagates store failures and a missing node type.
pub fn describe_node<S: GraphStore + ?Sized>(store: &S, node: NodeId) -> ExResult<NodeDescriptor> {
    Ok(NodeDescriptor {
        id: node,
        node_type: node_type(store, node)?,
        uri: node_str(store, node, props::URI)?,
        value: node_str(store, node, props::VALUE)?,
        data_model: node_str(store, node, props::DATA_MODEL)?,
    })
}

/// Validity range of a relationship; relationships without `validFrom`
/// are treated as live since version 0
///
/// # Errors
///
/// `InvalidRange` when the stored bounds are inverted.
pub fn statement_range<S: GraphStore + ?Sized>(store: &S, rel: RelId) -> ExResult<Range> {
    let from = rel_int(store, rel, props::VALID_FROM)?.unwrap_or(0);
    let to = rel_int(store, rel, props::VALID_TO)?;
    Range::of_statement(from, to)
        .map_err(|e| ExError::from(e).with_entity_id(rel.to_string()))
}

/// # Errors
///
/// Propagates store failures.
pub fn read_statement<S: GraphStore + ?Sized>(store: &S, rel: RelId) -> ExResult<StoredStatement> {
    let ends = store.relationship(rel)?;
    Ok(StoredStatement {
        rel_id: rel,
        uuid: rel_str(store, rel, props::UUID)?.unwrap_or_default(),
        hash: rel_str(store, rel, props::HASH)?.unwrap_or_default(),
        subject: describe_node(store, ends.start)?,
        predicate: ends.rel_type,
        object: describe_node(store, ends.end)?,
        order: rel_int(store, rel, props::ORDER)?,
        index: rel_int(store, rel, props::INDEX)?,
        resource_uri: rel_str(store, rel, props::RESOURCE_URI)?,
        data_model: rel_str(store, rel, props::DATA_MODEL)?,
        valid_from: rel_int(store, rel, props::VALID_FROM)?.unwrap_or(0),
        valid_to: rel_int(store, rel, props::VALID_TO)?,
    })
}

/// Resource node of a record within a data model
///
/// # Errors
///
/// `NotFound` when no such node exists.
pub fn find_record_root<S: GraphStore + ?Sized>(
    store: &S,
    record_uri: &str,
    data_model: &str,
) -> ExResult<NodeId> {
    let candidates = store.find_nodes(
        NodeType::Resource.as_str(),
        props::URI,
        &record_uri.into(),
    )?;
    for node in candidates {
        if node_str(store, node, props::DATA_MODEL)?.as_deref() == Some(data_model) {
            return Ok(node);
        }
    }
    Err(GraphDeltaError::RecordNotFound {
        record_uri: record_uri.to_string(),
        data_model: data_model.to_string(),
    }
    .into())
}
