/// Scenario 4: Marking precedence on shared nodes
///
/// A type node shared by an unchanged entity and a removed (or added) one
/// ends with the change state, never ExactMatch.
mod common;

use common::{items, path, publish, DM, MAX_DEPTH};
use graphdelta_core::delta::compute_changeset;
use graphdelta_core::graph::{props, GraphStore, MemoryGraph};
use graphdelta_core::model::{ContentSchema, DeltaState, NodeId, NodeType};

const R1: &str = "http://ex.org/list/1";

fn schema() -> ContentSchema {
    ContentSchema::new(
        vec![path(&["hasItem", "hasName"])],
        path(&["hasItem", "hasValue"]),
    )
}

fn item_type_node(store: &MemoryGraph) -> NodeId {
    store
        .find_nodes(
            NodeType::TypeResource.as_str(),
            props::URI,
            &"http://example.org/Item".into(),
        )
        .unwrap()[0]
}

fn node_state(store: &MemoryGraph, node: NodeId) -> DeltaState {
    store
        .node_property(node, props::DELTA_STATE)
        .unwrap()
        .and_then(|v| v.as_str().map(|s| s.parse::<DeltaState>().unwrap()))
        .unwrap()
}

#[test]
fn test_scenario_04_deletion_outranks_exact_match() {
    // GIVEN two typed items, then only the first one
    let mut store = MemoryGraph::new();
    let v1 = publish(&mut store, R1, &items(R1, &[("a", "1"), ("b", "2")]));
    let v2 = publish(&mut store, R1, &items(R1, &[("a", "1")]));

    // WHEN computing the changeset
    let cs = compute_changeset(&mut store, R1, DM, &schema(), v1, v2, MAX_DEPTH).unwrap();

    // THEN the shared type node is marked Deletion
    assert_eq!(node_state(&store, item_type_node(&store)), DeltaState::Deletion);
    // AND the removed item contributes its edge, type, name and value
    assert_eq!(cs.deletions.len(), 4);
    assert!(cs.additions.is_empty());
}

#[test]
fn test_scenario_04_addition_outranks_exact_match() {
    // GIVEN one typed item, then a second one appended
    let mut store = MemoryGraph::new();
    let v1 = publish(&mut store, R1, &items(R1, &[("a", "1")]));
    let v2 = publish(&mut store, R1, &items(R1, &[("a", "1"), ("b", "2")]));

    // WHEN computing the changeset
    compute_changeset(&mut store, R1, DM, &schema(), v1, v2, MAX_DEPTH).unwrap();

    // THEN the shared type node is marked Addition
    assert_eq!(node_state(&store, item_type_node(&store)), DeltaState::Addition);
}

#[test]
fn test_scenario_04_unchanged_items_stay_exact() {
    // GIVEN the same items published twice
    let mut store = MemoryGraph::new();
    let v1 = publish(&mut store, R1, &items(R1, &[("a", "1"), ("b", "2")]));
    let v2 = publish(&mut store, R1, &items(R1, &[("a", "1"), ("b", "2")]));

    // WHEN computing the changeset
    let cs = compute_changeset(&mut store, R1, DM, &schema(), v1, v2, MAX_DEPTH).unwrap();

    // THEN the type node is an exact match and nothing changed
    assert_eq!(node_state(&store, item_type_node(&store)), DeltaState::ExactMatch);
    assert!(!cs.has_changes());
}
