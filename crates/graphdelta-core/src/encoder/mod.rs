//! Node/statement encoder
//!
//! Maps an abstract [`Statement`] onto node/relationship shape:
//!
//! - resource nodes are looked up by URI and data model, blank nodes through
//!   the run's blank-node map, literal nodes are always created fresh and only
//!   deduplicated at the statement level;
//! - objects of the "is-a" predicate are promoted to their type variant;
//! - every relationship carries order, index, owning record URI, data model,
//!   uuid, hash and the version it became valid in.
//!
//! `encode` validates the whole statement before it writes anything. It is
//! meant to run inside a store transaction owned by the caller, which rolls
//! back the batch on failure.

pub mod context;

pub use context::{EncodeContext, ImportStats};

use uuid::Uuid;

use crate::errors::{ExError, ExResult};
use crate::graph::read::node_str;
use crate::graph::{props, GraphStore};
use crate::hash::{self, StatementHash};
use crate::model::{NodeDescriptor, NodeId, NodeType, RelId, Statement, Term, RDF_TYPE};

/// Outcome of encoding one statement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodedStatement {
    pub subject: NodeId,
    /// `None` when the statement already existed with a literal object,
    /// in which case no literal node was created
    pub object: Option<NodeId>,
    pub relationship: RelId,
    /// False when the statement resolved to an existing relationship
    pub created: bool,
}

/// Encode one statement into the store
///
/// # Errors
///
/// - `Encoding` for malformed statements (nothing is written)
/// - `HashCollision` when the hash index points at a different statement
/// - store errors from the adapter
pub fn encode<S: GraphStore + ?Sized>(
    store: &mut S,
    ctx: &mut EncodeContext,
    statement: &Statement,
) -> ExResult<EncodedStatement> {
    statement
        .validate()
        .map_err(|e| ExError::from(e).with_op("encode").with_data_model(ctx.data_model()))?;

    let is_type_statement = statement.predicate == RDF_TYPE;

    let subject = resolve_subject(store, ctx, &statement.subject)?;
    let resource_uri = determine_resource_uri(&*store, ctx, subject.id, statement)?;

    let index = statement.index.unwrap_or(ctx.next_index);
    ctx.next_index = ctx.next_index.max(index) + 1;
    ctx.pending.triples += 1;

    if let Term::Literal { value } = &statement.object {
        let probe = NodeDescriptor {
            id: NodeId(0),
            node_type: NodeType::Literal,
            uri: None,
            value: Some(value.clone()),
            data_model: None,
        };
        let digest = hash::hash(&subject, &statement.predicate, &probe, ctx.data_model());
        if let Some(existing) = known_statement(&*store, ctx, &digest)? {
            return Ok(EncodedStatement {
                subject: subject.id,
                object: None,
                relationship: existing,
                created: false,
            });
        }

        let literal = store.create_node(&[NodeType::Literal.as_str()])?;
        store.set_node_property(literal, props::NODE_TYPE, NodeType::Literal.as_str().into())?;
        store.set_node_property(literal, props::VALUE, value.as_str().into())?;
        if let Some(uri) = &resource_uri {
            store.set_node_property(literal, props::RESOURCE_URI, uri.as_str().into())?;
        }
        ctx.pending.nodes_added += 1;
        ctx.pending.literals += 1;

        let rel = create_statement(
            store,
            ctx,
            subject.id,
            literal,
            statement,
            index,
            resource_uri.as_deref(),
            &digest,
        )?;
        return Ok(EncodedStatement {
            subject: subject.id,
            object: Some(literal),
            relationship: rel,
            created: true,
        });
    }

    let object = resolve_object(
        store,
        ctx,
        &statement.object,
        is_type_statement,
        resource_uri.as_deref(),
    )?;
    let digest = hash::hash(&subject, &statement.predicate, &object, ctx.data_model());
    if let Some(existing) = known_statement(&*store, ctx, &digest)? {
        return Ok(EncodedStatement {
            subject: subject.id,
            object: Some(object.id),
            relationship: existing,
            created: false,
        });
    }

    let rel = create_statement(
        store,
        ctx,
        subject.id,
        object.id,
        statement,
        index,
        resource_uri.as_deref(),
        &digest,
    )?;
    Ok(EncodedStatement {
        subject: subject.id,
        object: Some(object.id),
        relationship: rel,
        created: true,
    })
}

fn known_statement<S: GraphStore + ?Sized>(
    store: &S,
    ctx: &mut EncodeContext,
    digest: &StatementHash,
) -> ExResult<Option<RelId>> {
    if let Some(rel) = ctx.hashes.get(digest) {
        return Ok(Some(*rel));
    }
    match hash::lookup(store, digest)? {
        Some(rel) => {
            hash::verify_hit(store, digest, rel)?;
            ctx.hashes.insert(digest.clone(), rel);
            Ok(Some(rel))
        }
        None => Ok(None),
    }
}

#[allow(clippy::too_many_arguments)]
fn create_statement<S: GraphStore + ?Sized>(
    store: &mut S,
    ctx: &mut EncodeContext,
    subject: NodeId,
    object: NodeId,
    statement: &Statement,
    index: i64,
    resource_uri: Option<&str>,
    digest: &StatementHash,
) -> ExResult<RelId> {
    let rel = store.create_relationship(subject, object, &statement.predicate)?;
    if let Some(order) = statement.order {
        store.set_rel_property(rel, props::ORDER, order.into())?;
    }
    store.set_rel_property(rel, props::INDEX, index.into())?;
    if let Some(uri) = resource_uri {
        store.set_rel_property(rel, props::RESOURCE_URI, uri.into())?;
    }
    store.set_rel_property(rel, props::DATA_MODEL, ctx.data_model().into())?;
    let uuid = statement
        .uuid
        .clone()
        .unwrap_or_else(|| Uuid::now_v7().to_string());
    store.set_rel_property(rel, props::UUID, uuid.into())?;
    store.set_rel_property(rel, props::VALID_FROM, ctx.version().into())?;
    hash::register(store, digest, rel)?;

    ctx.hashes.insert(digest.clone(), rel);
    ctx.pending.relationships_added += 1;
    tracing::trace!(rel = %rel, statement_hash = %digest, "statement created");
    Ok(rel)
}

fn resolve_subject<S: GraphStore + ?Sized>(
    store: &mut S,
    ctx: &mut EncodeContext,
    term: &Term,
) -> ExResult<NodeDescriptor> {
    match term {
        Term::Resource { uri, data_model } => {
            let dm = data_model.clone().unwrap_or_else(|| ctx.data_model().to_string());
            resolve_resource(store, ctx, uri, &dm)
        }
        Term::Bnode { id } => resolve_bnode(store, ctx, id, NodeType::BNode, None),
        // rejected by Statement::validate
        Term::Literal { .. } => Err(crate::errors::GraphDeltaError::MalformedStatement {
            reason: "subject cannot be a literal".to_string(),
        }
        .into()),
    }
}

fn resolve_object<S: GraphStore + ?Sized>(
    store: &mut S,
    ctx: &mut EncodeContext,
    term: &Term,
    is_type_statement: bool,
    resource_uri: Option<&str>,
) -> ExResult<NodeDescriptor> {
    match term {
        Term::Resource { uri, .. } if is_type_statement => resolve_type_resource(store, ctx, uri),
        Term::Resource { uri, data_model } => {
            let dm = data_model.clone().unwrap_or_else(|| ctx.data_model().to_string());
            resolve_resource(store, ctx, uri, &dm)
        }
        Term::Bnode { id } => {
            let node_type = if is_type_statement {
                NodeType::TypeBNode
            } else {
                NodeType::BNode
            };
            let node = resolve_bnode(store, ctx, id, node_type, resource_uri)?;
            if let Some(uri) = resource_uri {
                ctx.resource_uris.entry(node.id).or_insert_with(|| uri.to_string());
            }
            Ok(node)
        }
        Term::Literal { .. } => Err(crate::errors::GraphDeltaError::MalformedStatement {
            reason: "literal objects are encoded separately".to_string(),
        }
        .into()),
    }
}

fn resolve_resource<S: GraphStore + ?Sized>(
    store: &mut S,
    ctx: &mut EncodeContext,
    uri: &str,
    data_model: &str,
) -> ExResult<NodeDescriptor> {
    let descriptor = |id| NodeDescriptor {
        id,
        node_type: NodeType::Resource,
        uri: Some(uri.to_string()),
        value: None,
        data_model: Some(data_model.to_string()),
    };

    let key = (uri.to_string(), data_model.to_string());
    if let Some(node) = ctx.resources.get(&key) {
        return Ok(descriptor(*node));
    }

    for node in store.find_nodes(NodeType::Resource.as_str(), props::URI, &uri.into())? {
        if node_str(&*store, node, props::DATA_MODEL)?.as_deref() == Some(data_model) {
            ctx.resources.insert(key, node);
            return Ok(descriptor(node));
        }
    }

    let node = store.create_node(&[NodeType::Resource.as_str()])?;
    store.set_node_property(node, props::NODE_TYPE, NodeType::Resource.as_str().into())?;
    store.set_node_property(node, props::URI, uri.into())?;
    store.set_node_property(node, props::DATA_MODEL, data_model.into())?;
    ctx.pending.nodes_added += 1;
    ctx.resources.insert(key, node);
    Ok(descriptor(node))
}

fn resolve_type_resource<S: GraphStore + ?Sized>(
    store: &mut S,
    ctx: &mut EncodeContext,
    uri: &str,
) -> ExResult<NodeDescriptor> {
    let descriptor = |id| NodeDescriptor {
        id,
        node_type: NodeType::TypeResource,
        uri: Some(uri.to_string()),
        value: None,
        data_model: None,
    };

    if let Some(node) = ctx.type_nodes.get(uri) {
        return Ok(descriptor(*node));
    }
    let existing = store
        .find_nodes(NodeType::TypeResource.as_str(), props::URI, &uri.into())?
        .into_iter()
        .next();
    let node = match existing {
        Some(node) => node,
        None => {
            let node = store.create_node(&[NodeType::TypeResource.as_str()])?;
            store.set_node_property(node, props::NODE_TYPE, NodeType::TypeResource.as_str().into())?;
            store.set_node_property(node, props::URI, uri.into())?;
            ctx.pending.nodes_added += 1;
            node
        }
    };
    ctx.type_nodes.insert(uri.to_string(), node);
    Ok(descriptor(node))
}

fn resolve_bnode<S: GraphStore + ?Sized>(
    store: &mut S,
    ctx: &mut EncodeContext,
    id: &str,
    node_type: NodeType,
    resource_uri: Option<&str>,
) -> ExResult<NodeDescriptor> {
    let node = match ctx.bnodes.get(id) {
        Some(node) => *node,
        None => {
            let node = store.create_node(&[node_type.as_str()])?;
            store.set_node_property(node, props::NODE_TYPE, node_type.as_str().into())?;
            if node_type == NodeType::BNode {
                if let Some(uri) = resource_uri {
                    store.set_node_property(node, props::RESOURCE_URI, uri.into())?;
                }
            }
            ctx.pending.nodes_added += 1;
            ctx.bnodes.insert(id.to_string(), node);
            node
        }
    };
    // a blank node first seen as subject keeps its original type
    let recorded = crate::graph::read::node_type(&*store, node)?;
    Ok(NodeDescriptor {
        id: node,
        node_type: recorded,
        uri: None,
        value: None,
        data_model: None,
    })
}

/// Owning record URI for statements on `subject`
///
/// Explicit `resource_uri` wins, then the memo, then the subject's
/// persisted `resourceUri`, then the subject's own URI for resources.
fn determine_resource_uri<S: GraphStore + ?Sized>(
    store: &S,
    ctx: &mut EncodeContext,
    subject: NodeId,
    statement: &Statement,
) -> ExResult<Option<String>> {
    if let Some(uri) = &statement.resource_uri {
        ctx.resource_uris
            .entry(subject)
            .or_insert_with(|| uri.clone());
        return Ok(Some(uri.clone()));
    }
    if let Some(uri) = ctx.resource_uris.get(&subject) {
        return Ok(Some(uri.clone()));
    }
    let found = match node_str(store, subject, props::RESOURCE_URI)? {
        Some(uri) => Some(uri),
        None => match &statement.subject {
            Term::Resource { uri, .. } => Some(uri.clone()),
            _ => None,
        },
    };
    if let Some(uri) = &found {
        ctx.resource_uris.insert(subject, uri.clone());
    }
    Ok(found)
}
