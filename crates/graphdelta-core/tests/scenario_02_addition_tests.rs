/// Scenario 2: Addition and deletion of key-matched sub-entities
mod common;

use common::{items, path, publish, tagged, DM, MAX_DEPTH};
use graphdelta_core::delta::compute_changeset;
use graphdelta_core::graph::MemoryGraph;
use graphdelta_core::model::ContentSchema;

const R1: &str = "http://ex.org/shelf/1";

fn tag_schema() -> ContentSchema {
    ContentSchema::new(vec![path(&["hasTag"])], path(&["hasTag"]))
}

#[test]
fn test_scenario_02_one_new_entity_is_one_addition() {
    // GIVEN three tags, then the same three plus a fourth
    let mut store = MemoryGraph::new();
    let v1 = publish(&mut store, R1, &tagged(R1, &["red", "green", "blue"]));
    let v2 = publish(&mut store, R1, &tagged(R1, &["red", "green", "blue", "cyan"]));

    // WHEN computing the changeset
    let cs = compute_changeset(&mut store, R1, DM, &tag_schema(), v1, v2, MAX_DEPTH).unwrap();

    // THEN exactly the new tag is an addition
    assert_eq!(cs.additions.len(), 1);
    assert!(cs.deletions.is_empty());
    assert!(cs.modifications.is_empty());
    let added = cs.additions.values().next().unwrap();
    assert_eq!(added.object.value.as_deref(), Some("cyan"));
}

#[test]
fn test_scenario_02_removed_entity_is_one_deletion() {
    // GIVEN four tags, then only three of them
    let mut store = MemoryGraph::new();
    let v1 = publish(&mut store, R1, &tagged(R1, &["red", "green", "blue", "cyan"]));
    let v2 = publish(&mut store, R1, &tagged(R1, &["red", "green", "blue"]));

    // WHEN computing the changeset
    let cs = compute_changeset(&mut store, R1, DM, &tag_schema(), v1, v2, MAX_DEPTH).unwrap();

    // THEN exactly the dropped tag is a deletion
    assert_eq!(cs.deletions.len(), 1);
    assert!(cs.additions.is_empty());
    assert!(cs.modifications.is_empty());
}

#[test]
fn test_scenario_02_new_item_adds_its_whole_subgraph() {
    // GIVEN two items, then a third item appended
    let mut store = MemoryGraph::new();
    let v1 = publish(&mut store, R1, &items(R1, &[("a", "1"), ("b", "2")]));
    let v2 = publish(&mut store, R1, &items(R1, &[("a", "1"), ("b", "2"), ("c", "3")]));
    let schema = ContentSchema::new(
        vec![path(&["hasItem", "hasName"])],
        path(&["hasItem", "hasValue"]),
    );

    // WHEN computing the changeset
    let cs = compute_changeset(&mut store, R1, DM, &schema, v1, v2, MAX_DEPTH).unwrap();

    // THEN the item edge, its type, name and value are additions
    assert_eq!(cs.additions.len(), 4);
    assert!(cs.deletions.is_empty());
    assert!(cs.modifications.is_empty());
}
