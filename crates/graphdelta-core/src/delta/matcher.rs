//! Content-schema entity matcher
//!
//! Anchors are reached by following the longest common prefix of all key
//! paths and the value path from the record root. Each key and value path
//! is then resolved relative to its anchor by a depth-first walk that only
//! follows edges whose predicate matches the attribute at the current
//! depth.

use std::collections::HashMap;

use crate::delta::entity::{CSEntity, KeyEntity, ValueEntity, KEY_VALUE_SEPARATOR};
use crate::delta::view::{depth_exceeded, RecordView};
use crate::errors::{ExResult, GraphDeltaError};
use crate::graph::read::describe_node;
use crate::graph::GraphStore;
use crate::model::{AttributePath, ContentSchema, NodeId, NodeType, RelId};

/// Node reached by following an attribute path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reached {
    pub node: NodeId,
    pub rels: Vec<RelId>,
    pub nodes: Vec<NodeId>,
    /// `predicate#order` steps taken
    pub steps: Vec<String>,
}

/// Every node reachable from `start` along `path`, in traversal order
///
/// An empty path reaches `start` itself.
///
/// # Errors
///
/// `DeterminismViolation` when `path` is longer than `max_depth`.
pub fn follow<S: GraphStore + ?Sized>(
    store: &S,
    view: &RecordView,
    start: NodeId,
    path: &[String],
    max_depth: usize,
) -> ExResult<Vec<Reached>> {
    if path.len() > max_depth {
        return Err(depth_exceeded(view, start, max_depth));
    }
    let mut out = Vec::new();
    let mut current = Reached {
        node: start,
        rels: Vec::new(),
        nodes: Vec::new(),
        steps: Vec::new(),
    };
    follow_from(store, view, path, &mut current, &mut out)?;
    Ok(out)
}

fn follow_from<S: GraphStore + ?Sized>(
    store: &S,
    view: &RecordView,
    path: &[String],
    current: &mut Reached,
    out: &mut Vec<Reached>,
) -> ExResult<()> {
    let depth = current.rels.len();
    if depth == path.len() {
        out.push(current.clone());
        return Ok(());
    }
    if !view.descends_into(store, current.node)? {
        return Ok(());
    }
    let node = current.node;
    for edge in view.edges(store, node)? {
        if edge.predicate != path[depth] {
            continue;
        }
        current.rels.push(edge.rel);
        current.nodes.push(edge.target);
        current.steps.push(edge.step());
        current.node = edge.target;
        follow_from(store, view, path, current, out)?;
        current.node = node;
        current.steps.pop();
        current.nodes.pop();
        current.rels.pop();
    }
    Ok(())
}

/// Value a terminal contributes to a key
///
/// # Errors
///
/// Propagates store failures.
pub fn terminal_value<S: GraphStore + ?Sized>(store: &S, node: NodeId) -> ExResult<String> {
    let descriptor = describe_node(store, node)?;
    Ok(match descriptor.node_type {
        NodeType::Literal => descriptor.value.unwrap_or_default(),
        NodeType::Resource | NodeType::TypeResource => descriptor.uri.unwrap_or_default(),
        NodeType::BNode | NodeType::TypeBNode => String::new(),
    })
}

/// Resolve the record's own identifier
///
/// `None` when the schema declares no identifier path.
///
/// # Errors
///
/// `SchemaResolution` when the path reaches nothing.
pub fn record_identifier<S: GraphStore + ?Sized>(
    store: &S,
    view: &RecordView,
    schema: &ContentSchema,
    max_depth: usize,
) -> ExResult<Option<String>> {
    let Some(path) = &schema.record_identifier_attribute_path else {
        return Ok(None);
    };
    let reached = follow(store, view, view.root(), path.attributes(), max_depth)?;
    if reached.is_empty() {
        return Err(GraphDeltaError::UnresolvablePath {
            path: path.to_string(),
            record_uri: view.record_uri().to_string(),
            reason: format!("no record identifier at version {}", view.version()),
        }
        .into());
    }
    let values = reached
        .iter()
        .map(|r| terminal_value(store, r.node))
        .collect::<ExResult<Vec<_>>>()?;
    Ok(Some(values.join(&KEY_VALUE_SEPARATOR.to_string())))
}

fn relative<'a>(path: &'a AttributePath, prefix_len: usize) -> &'a [String] {
    &path.attributes()[prefix_len.min(path.len())..]
}

/// Build the content-schema entities of one record version
///
/// Entities sharing a key are numbered 1..n in traversal order.
///
/// # Errors
///
/// `DeterminismViolation` for paths deeper than `max_depth`; store failures.
pub fn match_entities<S: GraphStore + ?Sized>(
    store: &S,
    view: &RecordView,
    schema: &ContentSchema,
    max_depth: usize,
) -> ExResult<Vec<CSEntity>> {
    let prefix = schema.common_attribute_path();
    let anchors = follow(store, view, view.root(), &prefix, max_depth)?;

    let mut entities = Vec::with_capacity(anchors.len());
    let mut seen_keys: HashMap<String, usize> = HashMap::new();
    for anchor in anchors {
        let identity = anchor_identity(store, &anchor)?;
        let mut anchor_nodes = vec![view.root()];
        anchor_nodes.extend(anchor.nodes.iter().copied());
        let mut entity = CSEntity::new(
            anchor.node,
            anchor.rels.clone(),
            anchor_nodes,
            schema.key_attribute_paths.len(),
            identity,
        );
        entity.anchor_steps = anchor.steps.clone();

        for (path_index, key_path) in schema.key_attribute_paths.iter().enumerate() {
            let rel_path = relative(key_path, prefix.len());
            for reached in follow(store, view, anchor.node, rel_path, max_depth)? {
                entity.key_entities.push(KeyEntity {
                    node: reached.node,
                    key: terminal_value(store, reached.node)?,
                    path_index,
                    rels: reached.rels,
                    nodes: reached.nodes,
                });
            }
        }

        let value_path = relative(&schema.value_attribute_path, prefix.len());
        let values = follow(store, view, anchor.node, value_path, max_depth)?;
        for (index, reached) in values.into_iter().enumerate() {
            entity.value_entities.push(ValueEntity {
                entity: KeyEntity {
                    node: reached.node,
                    key: terminal_value(store, reached.node)?,
                    path_index: 0,
                    rels: reached.rels,
                    nodes: reached.nodes,
                },
                index,
            });
        }

        let counter = seen_keys.entry(entity.key().to_string()).or_insert(0);
        *counter += 1;
        entity.order = *counter;
        entities.push(entity);
    }

    tracing::debug!(
        record_uri = view.record_uri(),
        version = view.version(),
        entities = entities.len(),
        "content schema entities matched"
    );
    Ok(entities)
}

/// Identity used when a schema has no key paths
///
/// Resources and literals are identified by content; blank anchors by the
/// steps that reach them, since their node ids differ per version.
fn anchor_identity<S: GraphStore + ?Sized>(store: &S, anchor: &Reached) -> ExResult<String> {
    let descriptor = describe_node(store, anchor.node)?;
    Ok(match descriptor.node_type {
        NodeType::BNode | NodeType::TypeBNode => anchor.steps.join("/"),
        _ => descriptor.identifier(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::{encode, EncodeContext};
    use crate::errors::ExErrorKind;
    use crate::graph::MemoryGraph;
    use crate::model::{Statement, Term};

    const DM: &str = "dm";
    const R1: &str = "http://ex.org/r1";

    fn path(attrs: &[&str]) -> AttributePath {
        AttributePath::new(attrs.iter().copied()).unwrap()
    }

    fn items(g: &mut MemoryGraph, names: &[(&str, &str)]) {
        let mut ctx = EncodeContext::new(DM, 1);
        for (i, (name, value)) in names.iter().enumerate() {
            let b = format!("item{}", i);
            let sts = [
                Statement::new(Term::resource(R1), "hasItem", Term::bnode(&b)).with_order(i as i64),
                Statement::new(Term::bnode(&b), "hasName", Term::literal(*name)),
                Statement::new(Term::bnode(&b), "hasValue", Term::literal(*value)),
            ];
            for st in &sts {
                encode(g, &mut ctx, st).unwrap();
            }
        }
    }

    #[test]
    fn test_entities_anchor_at_common_prefix() {
        let mut g = MemoryGraph::new();
        items(&mut g, &[("a", "1"), ("b", "2")]);
        let view = RecordView::open(&g, R1, DM, 1).unwrap();
        let schema = ContentSchema::new(
            vec![path(&["hasItem", "hasName"])],
            path(&["hasItem", "hasValue"]),
        );

        let entities = match_entities(&g, &view, &schema, 64).unwrap();

        assert_eq!(entities.len(), 2);
        assert_eq!(entities[0].key(), "a");
        assert_eq!(entities[0].values(), vec!["1"]);
        assert_eq!(entities[1].key(), "b");
        assert_eq!(entities[0].anchor_rels.len(), 1);
    }

    #[test]
    fn test_duplicate_keys_get_ordinals() {
        let mut g = MemoryGraph::new();
        items(&mut g, &[("a", "1"), ("a", "2")]);
        let view = RecordView::open(&g, R1, DM, 1).unwrap();
        let schema = ContentSchema::new(
            vec![path(&["hasItem", "hasName"])],
            path(&["hasItem", "hasValue"]),
        );

        let entities = match_entities(&g, &view, &schema, 64).unwrap();

        let orders: Vec<_> = entities.iter().map(|e| e.order).collect();
        assert_eq!(orders, vec![1, 2]);
    }

    #[test]
    fn test_missing_record_identifier_is_schema_error() {
        let mut g = MemoryGraph::new();
        items(&mut g, &[("a", "1")]);
        let view = RecordView::open(&g, R1, DM, 1).unwrap();
        let schema = ContentSchema::new(vec![], path(&["hasItem", "hasValue"]))
            .with_record_identifier(path(&["identifier"]));

        let err = record_identifier(&g, &view, &schema, 64).unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::SchemaResolution);
    }

    #[test]
    fn test_follow_prunes_wrong_predicates() {
        let mut g = MemoryGraph::new();
        items(&mut g, &[("a", "1")]);
        let view = RecordView::open(&g, R1, DM, 1).unwrap();

        let hit = follow(&g, &view, view.root(), &["hasItem".into(), "hasName".into()], 64).unwrap();
        let miss = follow(&g, &view, view.root(), &["hasItem".into(), "hasColour".into()], 64).unwrap();

        assert_eq!(hit.len(), 1);
        assert_eq!(hit[0].rels.len(), 2);
        assert!(miss.is_empty());
    }
}
