//! Derived entity descriptors
//!
//! None of these are persisted. A [`CSEntity`] is one repeating sub-entity
//! of a record as scoped by a content schema; the subgraph descriptors drive
//! the generic leaf walk used for additions, deletions and residual leaves.

use std::cell::OnceCell;
use std::collections::HashSet;

use crate::delta::view::{depth_exceeded, RecordView};
use crate::errors::ExResult;
use crate::graph::read::describe_node;
use crate::graph::GraphStore;
use crate::model::{DeltaState, NodeId, NodeType, RelId};

/// Separates the segments contributed by different key paths
pub const KEY_PATH_SEPARATOR: char = '\u{1f}';
/// Separates several values reached through the same key path
pub const KEY_VALUE_SEPARATOR: char = '\u{1e}';

/// Terminal node of a key or value path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyEntity {
    pub node: NodeId,
    /// Resolved value: literal value, resource URI, empty for blank nodes
    pub key: String,
    /// Declaration index of the key path that reached this node
    pub path_index: usize,
    /// Relationships from the anchor down to `node`
    pub rels: Vec<RelId>,
    /// Nodes below the anchor along `rels`, ending with `node`
    pub nodes: Vec<NodeId>,
}

impl KeyEntity {
    /// Relationship that reaches `node`, if the path is not empty
    pub fn edge(&self) -> Option<RelId> {
        self.rels.last().copied()
    }
}

/// Terminal of the value path with its position among the entity's values
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueEntity {
    pub entity: KeyEntity,
    pub index: usize,
}

impl ValueEntity {
    pub fn value(&self) -> &str {
        &self.entity.key
    }
}

/// One content-schema entity of a record version
#[derive(Debug, Clone)]
pub struct CSEntity {
    pub anchor: NodeId,
    /// Relationships from the record root down to the anchor
    pub anchor_rels: Vec<RelId>,
    /// Root first, then the nodes along `anchor_rels`
    pub anchor_nodes: Vec<NodeId>,
    /// `predicate#order` steps along `anchor_rels`
    pub anchor_steps: Vec<String>,
    /// 1-based position among entities sharing the same key
    pub order: usize,
    pub key_entities: Vec<KeyEntity>,
    pub value_entities: Vec<ValueEntity>,
    key_path_count: usize,
    identity: String,
    key: OnceCell<String>,
}

impl CSEntity {
    pub fn new(
        anchor: NodeId,
        anchor_rels: Vec<RelId>,
        anchor_nodes: Vec<NodeId>,
        key_path_count: usize,
        identity: impl Into<String>,
    ) -> Self {
        Self {
            anchor,
            anchor_rels,
            anchor_nodes,
            anchor_steps: Vec::new(),
            order: 0,
            key_entities: Vec::new(),
            value_entities: Vec::new(),
            key_path_count,
            identity: identity.into(),
            key: OnceCell::new(),
        }
    }

    /// Concatenated key
    ///
    /// Key paths contribute one segment each, in declaration order; values
    /// reached through the same path keep traversal order. A path that
    /// reaches nothing contributes an empty segment. Without key paths the
    /// anchor identity is the key.
    pub fn key(&self) -> &str {
        self.key.get_or_init(|| {
            if self.key_path_count == 0 {
                return self.identity.clone();
            }
            let sep = KEY_VALUE_SEPARATOR.to_string();
            (0..self.key_path_count)
                .map(|i| {
                    self.key_entities
                        .iter()
                        .filter(|k| k.path_index == i)
                        .map(|k| k.key.as_str())
                        .collect::<Vec<_>>()
                        .join(&sep)
                })
                .collect::<Vec<_>>()
                .join(&KEY_PATH_SEPARATOR.to_string())
        })
    }

    /// Values ordered by position
    pub fn values(&self) -> Vec<&str> {
        let mut values: Vec<&ValueEntity> = self.value_entities.iter().collect();
        values.sort_by_key(|v| v.index);
        values.into_iter().map(ValueEntity::value).collect()
    }

    /// Relationship reaching the anchor from its parent
    pub fn anchor_edge(&self) -> Option<RelId> {
        self.anchor_rels.last().copied()
    }
}

/// Intermediate node whose whole subgraph gets one delta state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubGraphEntity {
    pub node: NodeId,
    pub state: DeltaState,
    pub max_depth: usize,
}

/// One root-to-leaf path below a [`SubGraphEntity`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubGraphLeafEntity {
    pub rels: Vec<RelId>,
    /// Nodes along `rels`, ending with the leaf
    pub nodes: Vec<NodeId>,
    pub leaf: NodeId,
    /// `predicate#order` steps joined with `/`
    pub path: String,
    /// `path=leafIdentity`
    pub signature: String,
    pub state: DeltaState,
}

impl SubGraphEntity {
    pub fn new(node: NodeId, state: DeltaState, max_depth: usize) -> Self {
        Self {
            node,
            state,
            max_depth,
        }
    }

    /// All leaf paths below the node
    ///
    /// Descends through blank nodes and stops at literals, resources and
    /// type resources. A node reached twice ends the second path.
    ///
    /// # Errors
    ///
    /// `DeterminismViolation` when a path is longer than `max_depth`.
    pub fn leaves<S: GraphStore + ?Sized>(
        &self,
        store: &S,
        view: &RecordView,
    ) -> ExResult<Vec<SubGraphLeafEntity>> {
        let mut out = Vec::new();
        if !view.descends_into(store, self.node)? {
            return Ok(out);
        }
        let mut visited = HashSet::from([self.node]);
        let mut trail = Trail::default();
        self.walk(store, view, self.node, &mut visited, &mut trail, &mut out)?;
        Ok(out)
    }

    fn walk<S: GraphStore + ?Sized>(
        &self,
        store: &S,
        view: &RecordView,
        node: NodeId,
        visited: &mut HashSet<NodeId>,
        trail: &mut Trail,
        out: &mut Vec<SubGraphLeafEntity>,
    ) -> ExResult<()> {
        if trail.rels.len() >= self.max_depth {
            return Err(depth_exceeded(view, node, self.max_depth));
        }
        for edge in view.edges(store, node)? {
            trail.push(edge.rel, edge.target, edge.step());
            let descend = visited.insert(edge.target)
                && view.descends_into(store, edge.target)?
                && !view.edges(store, edge.target)?.is_empty();
            if descend {
                self.walk(store, view, edge.target, visited, trail, out)?;
            } else {
                out.push(self.leaf(store, trail, edge.target)?);
            }
            trail.pop();
        }
        Ok(())
    }

    fn leaf<S: GraphStore + ?Sized>(
        &self,
        store: &S,
        trail: &Trail,
        leaf: NodeId,
    ) -> ExResult<SubGraphLeafEntity> {
        let path = trail.steps.join("/");
        let identity = leaf_identity(store, leaf)?;
        Ok(SubGraphLeafEntity {
            rels: trail.rels.clone(),
            nodes: trail.nodes.clone(),
            leaf,
            signature: format!("{}={}", path, identity),
            path,
            state: self.state,
        })
    }
}

#[derive(Default)]
struct Trail {
    rels: Vec<RelId>,
    nodes: Vec<NodeId>,
    steps: Vec<String>,
}

impl Trail {
    fn push(&mut self, rel: RelId, node: NodeId, step: String) {
        self.rels.push(rel);
        self.nodes.push(node);
        self.steps.push(step);
    }

    fn pop(&mut self) {
        self.rels.pop();
        self.nodes.pop();
        self.steps.pop();
    }
}

/// Version-independent identity of a leaf; blank nodes have none
fn leaf_identity<S: GraphStore + ?Sized>(store: &S, node: NodeId) -> ExResult<String> {
    let descriptor = describe_node(store, node)?;
    Ok(match descriptor.node_type {
        NodeType::BNode | NodeType::TypeBNode => "_".to_string(),
        _ => descriptor.identifier(),
    })
}
