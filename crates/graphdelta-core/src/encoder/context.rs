use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::hash::StatementHash;
use crate::model::{NodeId, RelId};

/// Counters reported by an import
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportStats {
    /// Statements handled, including ones that resolved to an existing edge
    pub triples: u64,
    pub nodes_added: u64,
    pub relationships_added: u64,
    /// Literal nodes created
    pub literals: u64,
}

impl ImportStats {
    pub fn absorb(&mut self, other: ImportStats) {
        self.triples += other.triples;
        self.nodes_added += other.nodes_added;
        self.relationships_added += other.relationships_added;
        self.literals += other.literals;
    }
}

/// Short-lived state of one encoding run
///
/// Holds the blank-node map, the resource-URI memo and a hash-index cache.
/// It belongs to a single worker and must be cleared at every flush and
/// reset after every rollback, since the store ids it caches are only valid
/// inside the transaction that produced them.
#[derive(Debug)]
pub struct EncodeContext {
    data_model: String,
    version: i64,
    pub(crate) bnodes: HashMap<String, NodeId>,
    pub(crate) resources: HashMap<(String, String), NodeId>,
    pub(crate) type_nodes: HashMap<String, NodeId>,
    pub(crate) resource_uris: HashMap<NodeId, String>,
    pub(crate) hashes: HashMap<StatementHash, RelId>,
    pub(crate) next_index: i64,
    committed_index: i64,
    pub(crate) pending: ImportStats,
}

impl EncodeContext {
    /// Context for statements written into `data_model` at `version`
    pub fn new(data_model: impl Into<String>, version: i64) -> Self {
        Self {
            data_model: data_model.into(),
            version,
            bnodes: HashMap::new(),
            resources: HashMap::new(),
            type_nodes: HashMap::new(),
            resource_uris: HashMap::new(),
            hashes: HashMap::new(),
            next_index: 0,
            committed_index: 0,
            pending: ImportStats::default(),
        }
    }

    pub fn data_model(&self) -> &str {
        &self.data_model
    }

    pub fn version(&self) -> i64 {
        self.version
    }

    /// Counters of the not yet committed batch
    pub fn pending_stats(&self) -> ImportStats {
        self.pending
    }

    /// Close a committed batch: hand out its counters and drop all caches
    pub fn flush(&mut self) -> ImportStats {
        let stats = std::mem::take(&mut self.pending);
        self.committed_index = self.next_index;
        self.clear_caches();
        stats
    }

    /// Forget everything produced since the last flush
    pub fn reset_after_rollback(&mut self) {
        self.pending = ImportStats::default();
        self.next_index = self.committed_index;
        self.clear_caches();
    }

    fn clear_caches(&mut self) {
        self.bnodes.clear();
        self.resources.clear();
        self.type_nodes.clear();
        self.resource_uris.clear();
        self.hashes.clear();
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.bnodes.is_empty()
            && self.resources.is_empty()
            && self.type_nodes.is_empty()
            && self.resource_uris.is_empty()
            && self.hashes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flush_clears_caches_and_hands_out_stats() {
        let mut ctx = EncodeContext::new("dm", 1);
        ctx.bnodes.insert("b1".to_string(), NodeId(1));
        ctx.pending.triples = 3;
        ctx.next_index = 3;

        let stats = ctx.flush();
        assert_eq!(stats.triples, 3);
        assert!(ctx.is_empty());
        assert_eq!(ctx.pending_stats(), ImportStats::default());
    }

    #[test]
    fn test_rollback_rewinds_index() {
        let mut ctx = EncodeContext::new("dm", 1);
        ctx.next_index = 2;
        ctx.flush();
        ctx.next_index = 5;
        ctx.pending.triples = 3;

        ctx.reset_after_rollback();
        assert_eq!(ctx.next_index, 2);
        assert_eq!(ctx.pending_stats().triples, 0);
    }
}
