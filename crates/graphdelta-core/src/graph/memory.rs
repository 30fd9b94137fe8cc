use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::errors::{ExError, ExErrorKind, ExResult};
use crate::graph::{GraphStore, PropValue, RelEnds};
use crate::hash::StatementHash;
use crate::model::{NodeId, RelId};

#[derive(Debug, Clone, Default)]
struct NodeRecord {
    labels: BTreeSet<String>,
    props: HashMap<String, PropValue>,
    outgoing: Vec<RelId>,
}

#[derive(Debug, Clone)]
struct RelRecord {
    ends: RelEnds,
    props: HashMap<String, PropValue>,
}

#[derive(Debug, Clone, Default)]
struct GraphState {
    next_node: u64,
    next_rel: u64,
    nodes: BTreeMap<NodeId, NodeRecord>,
    rels: BTreeMap<RelId, RelRecord>,
    hashes: HashMap<StatementHash, RelId>,
}

/// In-memory property graph
///
/// Not thread-safe; one instance belongs to one worker. A transaction is a
/// snapshot of the whole state taken at `begin_tx` and restored on
/// `rollback`. Outside a transaction every write applies immediately.
#[derive(Debug, Clone, Default)]
pub struct MemoryGraph {
    state: GraphState,
    snapshot: Option<GraphState>,
    failing_commits: usize,
}

fn node_not_found(node: NodeId) -> ExError {
    ExError::new(ExErrorKind::NotFound)
        .with_op("memory_graph")
        .with_entity_id(node.to_string())
        .with_message("node not found")
}

fn rel_not_found(rel: RelId) -> ExError {
    ExError::new(ExErrorKind::NotFound)
        .with_op("memory_graph")
        .with_entity_id(rel.to_string())
        .with_message("relationship not found")
}

fn tx_error(message: &str) -> ExError {
    ExError::new(ExErrorKind::StoreTransaction)
        .with_op("memory_graph")
        .with_message(message)
}

impl MemoryGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `n` commits fail with `StoreTransaction`
    ///
    /// The failing commit rolls the transaction back, the way a store that
    /// lost its write lock would.
    pub fn inject_commit_failures(&mut self, n: usize) {
        self.failing_commits = n;
    }

    pub fn node_count(&self) -> usize {
        self.state.nodes.len()
    }

    fn node(&self, node: NodeId) -> ExResult<&NodeRecord> {
        self.state.nodes.get(&node).ok_or_else(|| node_not_found(node))
    }

    fn node_mut(&mut self, node: NodeId) -> ExResult<&mut NodeRecord> {
        self.state
            .nodes
            .get_mut(&node)
            .ok_or_else(|| node_not_found(node))
    }

    fn rel(&self, rel: RelId) -> ExResult<&RelRecord> {
        self.state.rels.get(&rel).ok_or_else(|| rel_not_found(rel))
    }

    fn rel_mut(&mut self, rel: RelId) -> ExResult<&mut RelRecord> {
        self.state.rels.get_mut(&rel).ok_or_else(|| rel_not_found(rel))
    }
}

impl GraphStore for MemoryGraph {
    fn begin_tx(&mut self) -> ExResult<()> {
        if self.snapshot.is_some() {
            return Err(tx_error("transaction already open"));
        }
        self.snapshot = Some(self.state.clone());
        Ok(())
    }

    fn commit(&mut self) -> ExResult<()> {
        let Some(snapshot) = self.snapshot.take() else {
            return Err(tx_error("commit without open transaction"));
        };
        if self.failing_commits > 0 {
            self.failing_commits -= 1;
            self.state = snapshot;
            return Err(tx_error("injected commit failure"));
        }
        Ok(())
    }

    fn rollback(&mut self) -> ExResult<()> {
        let Some(snapshot) = self.snapshot.take() else {
            return Err(tx_error("rollback without open transaction"));
        };
        self.state = snapshot;
        Ok(())
    }

    fn in_tx(&self) -> bool {
        self.snapshot.is_some()
    }

    fn create_node(&mut self, labels: &[&str]) -> ExResult<NodeId> {
        self.state.next_node += 1;
        let id = NodeId(self.state.next_node);
        let record = NodeRecord {
            labels: labels.iter().map(|l| l.to_string()).collect(),
            ..NodeRecord::default()
        };
        self.state.nodes.insert(id, record);
        Ok(id)
    }

    fn add_label(&mut self, node: NodeId, label: &str) -> ExResult<()> {
        self.node_mut(node)?.labels.insert(label.to_string());
        Ok(())
    }

    fn labels(&self, node: NodeId) -> ExResult<Vec<String>> {
        Ok(self.node(node)?.labels.iter().cloned().collect())
    }

    fn set_node_property(&mut self, node: NodeId, key: &str, value: PropValue) -> ExResult<()> {
        self.node_mut(node)?.props.insert(key.to_string(), value);
        Ok(())
    }

    fn node_property(&self, node: NodeId, key: &str) -> ExResult<Option<PropValue>> {
        Ok(self.node(node)?.props.get(key).cloned())
    }

    fn remove_node_property(&mut self, node: NodeId, key: &str) -> ExResult<()> {
        self.node_mut(node)?.props.remove(key);
        Ok(())
    }

    fn find_nodes(&self, label: &str, key: &str, value: &PropValue) -> ExResult<Vec<NodeId>> {
        Ok(self
            .state
            .nodes
            .iter()
            .filter(|(_, n)| n.labels.contains(label) && n.props.get(key) == Some(value))
            .map(|(id, _)| *id)
            .collect())
    }

    fn create_relationship(&mut self, from: NodeId, to: NodeId, rel_type: &str) -> ExResult<RelId> {
        self.node(to)?;
        self.state.next_rel += 1;
        let id = RelId(self.state.next_rel);
        self.node_mut(from)?.outgoing.push(id);
        self.state.rels.insert(
            id,
            RelRecord {
                ends: RelEnds {
                    start: from,
                    end: to,
                    rel_type: rel_type.to_string(),
                },
                props: HashMap::new(),
            },
        );
        Ok(id)
    }

    fn relationship(&self, rel: RelId) -> ExResult<RelEnds> {
        Ok(self.rel(rel)?.ends.clone())
    }

    fn set_rel_property(&mut self, rel: RelId, key: &str, value: PropValue) -> ExResult<()> {
        self.rel_mut(rel)?.props.insert(key.to_string(), value);
        Ok(())
    }

    fn rel_property(&self, rel: RelId, key: &str) -> ExResult<Option<PropValue>> {
        Ok(self.rel(rel)?.props.get(key).cloned())
    }

    fn remove_rel_property(&mut self, rel: RelId, key: &str) -> ExResult<()> {
        self.rel_mut(rel)?.props.remove(key);
        Ok(())
    }

    fn outgoing(&self, node: NodeId) -> ExResult<Vec<RelId>> {
        Ok(self.node(node)?.outgoing.clone())
    }

    fn lookup_statement_hash(&self, hash: &StatementHash) -> ExResult<Option<RelId>> {
        Ok(self.state.hashes.get(hash).copied())
    }

    fn register_statement_hash(&mut self, hash: &StatementHash, rel: RelId) -> ExResult<()> {
        self.state.hashes.insert(hash.clone(), rel);
        Ok(())
    }

    fn remove_statement_hash(&mut self, hash: &StatementHash) -> ExResult<bool> {
        Ok(self.state.hashes.remove(hash).is_some())
    }

    fn relationship_count(&self) -> ExResult<usize> {
        Ok(self.state.rels.len())
    }
}
