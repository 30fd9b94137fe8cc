//! Version-scoped view of one record's subgraph

use crate::errors::{ExError, ExResult};
use crate::graph::read::{find_record_root, node_type, rel_int, rel_str, statement_range};
use crate::graph::{props, GraphStore};
use crate::model::{NodeId, NodeType, RelId};

/// Outgoing edge as seen from a [`RecordView`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    pub rel: RelId,
    pub predicate: String,
    pub target: NodeId,
    pub order: Option<i64>,
    pub index: Option<i64>,
}

impl Edge {
    /// `predicate#order`, the step used in path signatures
    pub fn step(&self) -> String {
        match self.order {
            Some(order) => format!("{}#{}", self.predicate, order),
            None => self.predicate.clone(),
        }
    }
}

/// One record as it was at one version
///
/// Only edges live at `version` and owned by the record (or not owned by
/// any record) are visible.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordView {
    record_uri: String,
    data_model: String,
    version: i64,
    root: NodeId,
}

impl RecordView {
    /// # Errors
    ///
    /// `NotFound` when the record has no root node in `data_model`.
    pub fn open<S: GraphStore + ?Sized>(
        store: &S,
        record_uri: &str,
        data_model: &str,
        version: i64,
    ) -> ExResult<Self> {
        let root = find_record_root(store, record_uri, data_model)
            .map_err(|e| e.with_op("record_view"))?;
        Ok(Self {
            record_uri: record_uri.to_string(),
            data_model: data_model.to_string(),
            version,
            root,
        })
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn record_uri(&self) -> &str {
        &self.record_uri
    }

    pub fn data_model(&self) -> &str {
        &self.data_model
    }

    pub fn version(&self) -> i64 {
        self.version
    }

    /// Visible outgoing edges of `node`, sorted by predicate, order, index, id
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub fn edges<S: GraphStore + ?Sized>(&self, store: &S, node: NodeId) -> ExResult<Vec<Edge>> {
        let mut edges = Vec::new();
        for rel in store.outgoing(node)? {
            if !statement_range(store, rel)?.contains(self.version) {
                continue;
            }
            if let Some(owner) = rel_str(store, rel, props::RESOURCE_URI)? {
                if owner != self.record_uri {
                    continue;
                }
            }
            let ends = store.relationship(rel)?;
            edges.push(Edge {
                rel,
                predicate: ends.rel_type,
                target: ends.end,
                order: rel_int(store, rel, props::ORDER)?,
                index: rel_int(store, rel, props::INDEX)?,
            });
        }
        edges.sort_by(|a, b| {
            (&a.predicate, a.order, a.index, a.rel).cmp(&(&b.predicate, b.order, b.index, b.rel))
        });
        Ok(edges)
    }

    /// Whether the walk continues below `node`
    ///
    /// Blank nodes are part of the record; literals, resources and type
    /// resources end a path.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub fn descends_into<S: GraphStore + ?Sized>(&self, store: &S, node: NodeId) -> ExResult<bool> {
        if node == self.root {
            return Ok(true);
        }
        Ok(matches!(node_type(store, node)?, NodeType::BNode | NodeType::TypeBNode))
    }

    /// Every visible relationship reachable from the root
    ///
    /// # Errors
    ///
    /// `DeterminismViolation` when the record is deeper than `max_depth`.
    pub fn reachable<S: GraphStore + ?Sized>(
        &self,
        store: &S,
        max_depth: usize,
    ) -> ExResult<(Vec<NodeId>, Vec<RelId>)> {
        let mut nodes = vec![self.root];
        let mut rels = Vec::new();
        let mut seen = std::collections::HashSet::from([self.root]);
        let mut frontier = vec![(self.root, 0usize)];
        while let Some((node, depth)) = frontier.pop() {
            if !self.descends_into(store, node)? {
                continue;
            }
            if depth >= max_depth {
                return Err(depth_exceeded(self, node, max_depth));
            }
            for edge in self.edges(store, node)? {
                rels.push(edge.rel);
                if seen.insert(edge.target) {
                    nodes.push(edge.target);
                    frontier.push((edge.target, depth + 1));
                }
            }
        }
        Ok((nodes, rels))
    }
}

pub(crate) fn depth_exceeded(view: &RecordView, node: NodeId, max_depth: usize) -> ExError {
    ExError::new(crate::errors::ExErrorKind::DeterminismViolation)
        .with_op("record_view")
        .with_record_uri(view.record_uri())
        .with_entity_id(node.to_string())
        .with_message(format!("record subgraph deeper than {}", max_depth))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::{encode, EncodeContext};
    use crate::graph::MemoryGraph;
    use crate::model::{Statement, Term};
    use crate::versioning::deprecate_records;

    const DM: &str = "dm";
    const R1: &str = "http://ex.org/r1";

    #[test]
    fn test_view_filters_by_version() {
        let mut g = MemoryGraph::new();
        let mut ctx = EncodeContext::new(DM, 1);
        encode(&mut g, &mut ctx, &Statement::new(Term::resource(R1), "p", Term::literal("old"))).unwrap();
        deprecate_records(&mut g, DM, &[R1.to_string()], 2, 64).unwrap();
        let mut ctx = EncodeContext::new(DM, 2);
        encode(&mut g, &mut ctx, &Statement::new(Term::resource(R1), "p", Term::literal("new"))).unwrap();

        let v1 = RecordView::open(&g, R1, DM, 1).unwrap();
        let v2 = RecordView::open(&g, R1, DM, 2).unwrap();

        assert_eq!(v1.root(), v2.root());
        assert_eq!(v1.edges(&g, v1.root()).unwrap().len(), 1);
        let (_, rels) = v2.reachable(&g, 64).unwrap();
        assert_eq!(rels.len(), 1);
        assert_ne!(v1.edges(&g, v1.root()).unwrap()[0].rel, rels[0]);
    }

    #[test]
    fn test_edges_sorted_by_order() {
        let mut g = MemoryGraph::new();
        let mut ctx = EncodeContext::new(DM, 1);
        for (value, order) in [("c", 3), ("a", 1), ("b", 2)] {
            let st = Statement::new(Term::resource(R1), "p", Term::literal(value)).with_order(order);
            encode(&mut g, &mut ctx, &st).unwrap();
        }
        let view = RecordView::open(&g, R1, DM, 1).unwrap();
        let orders: Vec<_> = view
            .edges(&g, view.root())
            .unwrap()
            .iter()
            .map(|e| e.order)
            .collect();
        assert_eq!(orders, vec![Some(1), Some(2), Some(3)]);
    }

    #[test]
    fn test_missing_record_is_not_found() {
        let g = MemoryGraph::new();
        let err = RecordView::open(&g, R1, DM, 1).unwrap_err();
        assert_eq!(err.kind(), crate::errors::ExErrorKind::NotFound);
    }
}
