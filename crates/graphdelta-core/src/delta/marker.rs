//! Delta marker and path propagator
//!
//! Marks are collected in a [`MarkBook`] first and written to the store in
//! one pass. Old and new entities are joined on `(key, order)` and marked in
//! phases whose order is fixed:
//!
//! 1. matched pairs: `ExactMatch` on anchor, key and value paths, with
//!    `Modification` on differing value leaves, then residual leaves below
//!    the pair's anchors;
//! 2. unmatched entities: `Deletion`/`Addition` on the anchor edge and the
//!    whole subgraph below the anchor;
//! 3. anchor-path relationships nobody accounted for yet, paired by the
//!    steps that reach them;
//! 4. residual leaves below the record root.
//!
//! Relationships touched by phases 1 and 2 follow [`DeltaState::merge`];
//! phases 3 and 4 only mark relationships that are still unmarked.

use std::collections::{BTreeMap, HashMap, VecDeque};

use crate::delta::entity::{CSEntity, SubGraphEntity, SubGraphLeafEntity};
use crate::delta::view::RecordView;
use crate::errors::{ExResult, GraphDeltaError};
use crate::graph::read::rel_str;
use crate::graph::{props, GraphStore};
use crate::model::{DeltaState, NodeId, RelId, RDF_TYPE};

/// Markable graph element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Element {
    Node(NodeId),
    Rel(RelId),
}

/// In-memory marks of one delta run
#[derive(Debug, Default, Clone)]
pub struct MarkBook {
    states: BTreeMap<Element, DeltaState>,
    /// new relationship -> old relationship it modifies
    modifies: BTreeMap<RelId, RelId>,
}

/// Relationship counts per state after marking
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MarkSummary {
    pub exact: usize,
    pub modified: usize,
    pub added: usize,
    pub deleted: usize,
}

impl MarkBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `state`, subject to [`DeltaState::merge`]; returns the
    /// resulting state
    pub fn mark(&mut self, element: Element, state: DeltaState) -> DeltaState {
        let merged = DeltaState::merge(self.states.get(&element).copied(), state);
        self.states.insert(element, merged);
        merged
    }

    pub fn mark_rel(&mut self, rel: RelId, state: DeltaState) -> DeltaState {
        self.mark(Element::Rel(rel), state)
    }

    pub fn mark_node(&mut self, node: NodeId, state: DeltaState) -> DeltaState {
        self.mark(Element::Node(node), state)
    }

    /// Record `state` only if the relationship carries no mark yet
    pub fn mark_rel_if_unmarked(&mut self, rel: RelId, state: DeltaState) -> bool {
        if self.is_rel_marked(rel) {
            return false;
        }
        self.states.insert(Element::Rel(rel), state);
        true
    }

    pub fn state(&self, element: Element) -> Option<DeltaState> {
        self.states.get(&element).copied()
    }

    pub fn rel_state(&self, rel: RelId) -> Option<DeltaState> {
        self.state(Element::Rel(rel))
    }

    pub fn node_state(&self, node: NodeId) -> Option<DeltaState> {
        self.state(Element::Node(node))
    }

    pub fn is_rel_marked(&self, rel: RelId) -> bool {
        self.states.contains_key(&Element::Rel(rel))
    }

    /// Pair a modified relationship with its predecessor
    pub fn pair(&mut self, old: RelId, new: RelId) {
        self.modifies.insert(new, old);
    }

    pub fn modifies(&self) -> &BTreeMap<RelId, RelId> {
        &self.modifies
    }

    pub fn summary(&self) -> MarkSummary {
        let mut summary = MarkSummary::default();
        for (element, state) in &self.states {
            if let Element::Rel(_) = element {
                match state {
                    DeltaState::ExactMatch => summary.exact += 1,
                    DeltaState::Modification => summary.modified += 1,
                    DeltaState::Addition => summary.added += 1,
                    DeltaState::Deletion => summary.deleted += 1,
                }
            }
        }
        summary
    }

    /// Write all marks as `deltaState`/`matched` and every pairing as
    /// `modifies` (the old statement's uuid) on the new relationship
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub fn persist<S: GraphStore + ?Sized>(&self, store: &mut S) -> ExResult<()> {
        for (element, state) in &self.states {
            match element {
                Element::Node(node) => {
                    store.set_node_property(*node, props::DELTA_STATE, state.as_str().into())?;
                    store.set_node_property(*node, props::MATCHED, true.into())?;
                }
                Element::Rel(rel) => {
                    store.set_rel_property(*rel, props::DELTA_STATE, state.as_str().into())?;
                    store.set_rel_property(*rel, props::MATCHED, true.into())?;
                }
            }
        }
        for (new, old) in &self.modifies {
            let old_uuid = rel_str(&*store, *old, props::UUID)?.unwrap_or_default();
            store.set_rel_property(*new, props::MODIFIES, old_uuid.into())?;
        }
        Ok(())
    }
}

/// Remove marks left by an earlier delta run over the same views
///
/// # Errors
///
/// Propagates store failures.
pub fn clear_marks<S: GraphStore + ?Sized>(
    store: &mut S,
    views: &[&RecordView],
    max_depth: usize,
) -> ExResult<()> {
    for view in views {
        let (nodes, rels) = view.reachable(&*store, max_depth)?;
        for node in nodes {
            store.remove_node_property(node, props::DELTA_STATE)?;
            store.remove_node_property(node, props::MATCHED)?;
        }
        for rel in rels {
            store.remove_rel_property(rel, props::DELTA_STATE)?;
            store.remove_rel_property(rel, props::MATCHED)?;
            store.remove_rel_property(rel, props::MODIFIES)?;
        }
    }
    Ok(())
}

/// Mark both record versions
///
/// # Errors
///
/// `MatchingIncomplete` when a visible relationship of either version is
/// left unmarked; `DeterminismViolation` for subgraphs deeper than
/// `max_depth`; store failures.
pub fn mark_delta<S: GraphStore + ?Sized>(
    store: &S,
    old_view: &RecordView,
    new_view: &RecordView,
    old_entities: &[CSEntity],
    new_entities: &[CSEntity],
    max_depth: usize,
) -> ExResult<MarkBook> {
    let mut book = MarkBook::new();

    let mut old_by_key: BTreeMap<(String, usize), usize> = BTreeMap::new();
    for (i, entity) in old_entities.iter().enumerate() {
        old_by_key.insert((entity.key().to_string(), entity.order), i);
    }
    let mut matched = Vec::new();
    let mut added = Vec::new();
    for entity in new_entities {
        match old_by_key.remove(&(entity.key().to_string(), entity.order)) {
            Some(i) => matched.push((&old_entities[i], entity)),
            None => added.push(entity),
        }
    }
    let mut deleted: Vec<&CSEntity> = old_by_key.values().map(|i| &old_entities[*i]).collect();
    deleted.sort_by_key(|e| e.anchor);

    // 1. matched pairs
    for (old, new) in &matched {
        mark_pair(store, &mut book, old_view, new_view, old, new, max_depth)?;
    }

    // 2. unmatched entities
    for entity in &deleted {
        mark_subgraph(store, &mut book, old_view, entity, DeltaState::Deletion, max_depth)?;
    }
    for entity in &added {
        mark_subgraph(store, &mut book, new_view, entity, DeltaState::Addition, max_depth)?;
    }

    // 3. anchor paths
    let old_all: Vec<&CSEntity> = old_entities.iter().collect();
    let new_all: Vec<&CSEntity> = new_entities.iter().collect();
    mark_anchor_paths(&mut book, &old_all, &new_all);

    // 4. residual leaves below the root
    let old_leaves = SubGraphEntity::new(old_view.root(), DeltaState::Deletion, max_depth)
        .leaves(store, old_view)?;
    let new_leaves = SubGraphEntity::new(new_view.root(), DeltaState::Addition, max_depth)
        .leaves(store, new_view)?;
    match_residual(&mut book, old_leaves, new_leaves);

    check_complete(store, &book, old_view, max_depth)?;
    check_complete(store, &book, new_view, max_depth)?;

    let summary = book.summary();
    tracing::debug!(
        record_uri = new_view.record_uri(),
        matched = matched.len(),
        added_entities = added.len(),
        deleted_entities = deleted.len(),
        exact = summary.exact,
        modified = summary.modified,
        added = summary.added,
        deleted = summary.deleted,
        "delta marked"
    );
    Ok(book)
}

fn mark_pair<S: GraphStore + ?Sized>(
    store: &S,
    book: &mut MarkBook,
    old_view: &RecordView,
    new_view: &RecordView,
    old: &CSEntity,
    new: &CSEntity,
    max_depth: usize,
) -> ExResult<()> {
    for entity in [old, new] {
        for rel in &entity.anchor_rels {
            book.mark_rel(*rel, DeltaState::ExactMatch);
        }
        for node in &entity.anchor_nodes {
            book.mark_node(*node, DeltaState::ExactMatch);
        }
        for key in &entity.key_entities {
            mark_path(book, &key.rels, &key.nodes, DeltaState::ExactMatch);
            book.mark_node(key.node, DeltaState::ExactMatch);
        }
    }
    mark_shared_types(store, book, old_view, new_view, old.anchor, new.anchor)?;

    let mut old_values: Vec<_> = old.value_entities.iter().collect();
    let mut new_values: Vec<_> = new.value_entities.iter().collect();
    old_values.sort_by_key(|v| v.index);
    new_values.sort_by_key(|v| v.index);

    for (i, (o, n)) in old_values.iter().zip(new_values.iter()).enumerate() {
        let (o, n) = (&o.entity, &n.entity);
        if o.key == n.key {
            mark_path(book, &o.rels, &o.nodes, DeltaState::ExactMatch);
            mark_path(book, &n.rels, &n.nodes, DeltaState::ExactMatch);
            book.mark_node(o.node, DeltaState::ExactMatch);
            book.mark_node(n.node, DeltaState::ExactMatch);
            continue;
        }
        mark_leaf_change(book, &o.rels, &o.nodes, o.node, DeltaState::Modification);
        mark_leaf_change(book, &n.rels, &n.nodes, n.node, DeltaState::Modification);
        let old_edge = o.edge().or(old.anchor_edge());
        let new_edge = n.edge().or(new.anchor_edge());
        match (old_edge, new_edge) {
            (Some(old_rel), Some(new_rel)) => {
                book.mark_rel(old_rel, DeltaState::Modification);
                book.mark_rel(new_rel, DeltaState::Modification);
                book.pair(old_rel, new_rel);
            }
            _ => tracing::debug!(
                record_uri = new_view.record_uri(),
                value = i,
                "modified value has no relationship to pair"
            ),
        }
    }
    for extra in old_values.iter().skip(new_values.len()) {
        let e = &extra.entity;
        mark_leaf_change(book, &e.rels, &e.nodes, e.node, DeltaState::Deletion);
    }
    for extra in new_values.iter().skip(old_values.len()) {
        let e = &extra.entity;
        mark_leaf_change(book, &e.rels, &e.nodes, e.node, DeltaState::Addition);
    }

    let old_leaves = unmarked_leaves(
        book,
        SubGraphEntity::new(old.anchor, DeltaState::Deletion, max_depth).leaves(store, old_view)?,
    );
    let new_leaves = unmarked_leaves(
        book,
        SubGraphEntity::new(new.anchor, DeltaState::Addition, max_depth).leaves(store, new_view)?,
    );
    match_residual(book, old_leaves, new_leaves);
    Ok(())
}

fn mark_path(book: &mut MarkBook, rels: &[RelId], nodes: &[NodeId], state: DeltaState) {
    for rel in rels {
        book.mark_rel(*rel, state);
    }
    for node in nodes {
        book.mark_node(*node, state);
    }
}

/// Structural steps stay `ExactMatch`; the leaf step carries `state`
fn mark_leaf_change(
    book: &mut MarkBook,
    rels: &[RelId],
    nodes: &[NodeId],
    leaf: NodeId,
    state: DeltaState,
) {
    if let Some((last, structural)) = rels.split_last() {
        for rel in structural {
            book.mark_rel(*rel, DeltaState::ExactMatch);
        }
        book.mark_rel(*last, state);
    }
    for node in nodes.iter().take(nodes.len().saturating_sub(1)) {
        book.mark_node(*node, DeltaState::ExactMatch);
    }
    book.mark_node(leaf, state);
}

/// `ExactMatch` on the type declarations both anchors share
fn mark_shared_types<S: GraphStore + ?Sized>(
    store: &S,
    book: &mut MarkBook,
    old_view: &RecordView,
    new_view: &RecordView,
    old_anchor: NodeId,
    new_anchor: NodeId,
) -> ExResult<()> {
    if !old_view.descends_into(store, old_anchor)? || !new_view.descends_into(store, new_anchor)? {
        return Ok(());
    }
    let type_edges = |view: &RecordView, node: NodeId| -> ExResult<Vec<_>> {
        Ok(view
            .edges(store, node)?
            .into_iter()
            .filter(|e| e.predicate == RDF_TYPE)
            .collect())
    };
    let old_types = type_edges(old_view, old_anchor)?;
    let new_types = type_edges(new_view, new_anchor)?;
    for old in &old_types {
        if let Some(new) = new_types.iter().find(|n| n.target == old.target) {
            book.mark_rel(old.rel, DeltaState::ExactMatch);
            book.mark_rel(new.rel, DeltaState::ExactMatch);
            book.mark_node(old.target, DeltaState::ExactMatch);
        }
    }
    Ok(())
}

/// `state` on the anchor edge, the anchor and everything below it
fn mark_subgraph<S: GraphStore + ?Sized>(
    store: &S,
    book: &mut MarkBook,
    view: &RecordView,
    entity: &CSEntity,
    state: DeltaState,
    max_depth: usize,
) -> ExResult<()> {
    if let Some(edge) = entity.anchor_edge() {
        book.mark_rel(edge, state);
    }
    book.mark_node(entity.anchor, state);
    let sub = SubGraphEntity::new(entity.anchor, state, max_depth);
    for leaf in sub.leaves(store, view)? {
        mark_path(book, &leaf.rels, &leaf.nodes, leaf.state);
    }
    Ok(())
}

/// Pair still unmarked anchor-path relationships by the steps reaching them
fn mark_anchor_paths(book: &mut MarkBook, old: &[&CSEntity], new: &[&CSEntity]) {
    fn unmarked_steps(book: &MarkBook, entities: &[&CSEntity]) -> BTreeMap<String, Vec<(RelId, NodeId)>> {
        let mut out: BTreeMap<String, Vec<(RelId, NodeId)>> = BTreeMap::new();
        for entity in entities {
            for (i, rel) in entity.anchor_rels.iter().enumerate() {
                if book.is_rel_marked(*rel) {
                    continue;
                }
                let signature = entity.anchor_steps[..=i].join("/");
                let target = entity.anchor_nodes[i + 1];
                let slot = out.entry(signature).or_default();
                if !slot.iter().any(|(r, _)| r == rel) {
                    slot.push((*rel, target));
                }
            }
        }
        out
    }

    let mut old_paths = unmarked_steps(book, old);
    let new_paths = unmarked_steps(book, new);
    for (signature, new_rels) in new_paths {
        let mut old_rels: VecDeque<_> = old_paths.remove(&signature).unwrap_or_default().into();
        for (rel, node) in new_rels {
            match old_rels.pop_front() {
                Some((old_rel, old_node)) => {
                    book.mark_rel(old_rel, DeltaState::ExactMatch);
                    book.mark_rel(rel, DeltaState::ExactMatch);
                    book.mark_node(old_node, DeltaState::ExactMatch);
                    book.mark_node(node, DeltaState::ExactMatch);
                }
                None => {
                    book.mark_rel(rel, DeltaState::Addition);
                    book.mark_node(node, DeltaState::Addition);
                }
            }
        }
        for (old_rel, old_node) in old_rels {
            book.mark_rel(old_rel, DeltaState::Deletion);
            book.mark_node(old_node, DeltaState::Deletion);
        }
    }
    for (old_rel, old_node) in old_paths.into_values().flatten() {
        book.mark_rel(old_rel, DeltaState::Deletion);
        book.mark_node(old_node, DeltaState::Deletion);
    }
}

fn unmarked_leaves(book: &MarkBook, leaves: Vec<SubGraphLeafEntity>) -> Vec<SubGraphLeafEntity> {
    leaves
        .into_iter()
        .filter(|leaf| leaf.rels.iter().any(|rel| !book.is_rel_marked(*rel)))
        .collect()
}

/// Match leaf paths nobody accounted for
///
/// Equal signature (steps plus leaf value) is an exact match; equal steps
/// alone is a modification; the rest are additions and deletions. Only
/// unmarked relationships are marked.
fn match_residual(
    book: &mut MarkBook,
    old_leaves: Vec<SubGraphLeafEntity>,
    new_leaves: Vec<SubGraphLeafEntity>,
) {
    let old_leaves = unmarked_leaves(book, old_leaves);
    let new_leaves = unmarked_leaves(book, new_leaves);

    let mut by_signature: HashMap<String, VecDeque<usize>> = HashMap::new();
    for (i, leaf) in old_leaves.iter().enumerate() {
        by_signature.entry(leaf.signature.clone()).or_default().push_back(i);
    }
    let mut old_used = vec![false; old_leaves.len()];
    let mut pending_new = Vec::new();
    for leaf in &new_leaves {
        match by_signature.get_mut(&leaf.signature).and_then(VecDeque::pop_front) {
            Some(i) => {
                old_used[i] = true;
                mark_residual_leaf(book, &old_leaves[i], DeltaState::ExactMatch);
                mark_residual_leaf(book, leaf, DeltaState::ExactMatch);
            }
            None => pending_new.push(leaf),
        }
    }

    let mut by_path: HashMap<&str, VecDeque<usize>> = HashMap::new();
    for (i, leaf) in old_leaves.iter().enumerate() {
        if !old_used[i] {
            by_path.entry(leaf.path.as_str()).or_default().push_back(i);
        }
    }
    for leaf in pending_new {
        match by_path.get_mut(leaf.path.as_str()).and_then(VecDeque::pop_front) {
            Some(i) => {
                old_used[i] = true;
                let old = &old_leaves[i];
                let old_last = old.rels.last().copied().filter(|r| !book.is_rel_marked(*r));
                let new_last = leaf.rels.last().copied().filter(|r| !book.is_rel_marked(*r));
                mark_residual_leaf(book, old, DeltaState::Modification);
                mark_residual_leaf(book, leaf, DeltaState::Modification);
                if let (Some(o), Some(n)) = (old_last, new_last) {
                    book.pair(o, n);
                }
            }
            None => mark_residual_leaf(book, leaf, DeltaState::Addition),
        }
    }
    for (i, leaf) in old_leaves.iter().enumerate() {
        if !old_used[i] {
            mark_residual_leaf(book, leaf, DeltaState::Deletion);
        }
    }
}

fn mark_residual_leaf(book: &mut MarkBook, leaf: &SubGraphLeafEntity, state: DeltaState) {
    let last = leaf.rels.len().saturating_sub(1);
    for (i, (rel, node)) in leaf.rels.iter().zip(leaf.nodes.iter()).enumerate() {
        let rel_state = if i < last && state == DeltaState::Modification {
            DeltaState::ExactMatch
        } else {
            state
        };
        if book.mark_rel_if_unmarked(*rel, rel_state) {
            book.mark_node(*node, rel_state);
        }
    }
}

fn check_complete<S: GraphStore + ?Sized>(
    store: &S,
    book: &MarkBook,
    view: &RecordView,
    max_depth: usize,
) -> ExResult<()> {
    let (_, rels) = view.reachable(store, max_depth)?;
    let unmatched = rels.iter().filter(|rel| !book.is_rel_marked(**rel)).count();
    if unmatched > 0 {
        return Err(GraphDeltaError::MatchingIncomplete {
            record_uri: view.record_uri().to_string(),
            unmatched,
        }
        .into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mark_book_precedence() {
        let mut book = MarkBook::new();
        let node = NodeId(7);

        book.mark_node(node, DeltaState::ExactMatch);
        book.mark_node(node, DeltaState::Deletion);
        book.mark_node(node, DeltaState::ExactMatch);

        assert_eq!(book.node_state(node), Some(DeltaState::Deletion));
    }

    #[test]
    fn test_first_change_sticks() {
        let mut book = MarkBook::new();
        let rel = RelId(3);

        book.mark_rel(rel, DeltaState::Addition);
        book.mark_rel(rel, DeltaState::Deletion);

        assert_eq!(book.rel_state(rel), Some(DeltaState::Addition));
    }

    #[test]
    fn test_mark_if_unmarked_respects_existing() {
        let mut book = MarkBook::new();
        let rel = RelId(1);

        assert!(book.mark_rel_if_unmarked(rel, DeltaState::ExactMatch));
        assert!(!book.mark_rel_if_unmarked(rel, DeltaState::Addition));
        assert_eq!(book.rel_state(rel), Some(DeltaState::ExactMatch));
    }

    #[test]
    fn test_summary_counts_relationships_only() {
        let mut book = MarkBook::new();
        book.mark_rel(RelId(1), DeltaState::Addition);
        book.mark_rel(RelId(2), DeltaState::ExactMatch);
        book.mark_node(NodeId(1), DeltaState::Addition);

        let summary = book.summary();
        assert_eq!(summary.added, 1);
        assert_eq!(summary.exact, 1);
    }
}
