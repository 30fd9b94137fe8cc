// Integration tests for the SQLite graph store: the encoder, versioning and
// delta engine running against an on-disk database

use std::path::PathBuf;

use graphdelta_core::encoder::{encode, EncodeContext};
use graphdelta_core::errors::ExErrorKind;
use graphdelta_core::graph::{with_transaction, GraphStore};
use graphdelta_core::hash;
use graphdelta_core::model::{AttributePath, ContentSchema, Statement, Term};
use graphdelta_core::versioning::{advance_version, current_version, deprecate_records};
use graphdelta_core::compute_changeset;
use graphdelta_store::dataset::parse_dataset_file;
use graphdelta_store::SqliteGraph;
use tempfile::TempDir;

const MAX_DEPTH: usize = 64;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn import(g: &mut SqliteGraph, data_model: &str, version: i64, statements: &[Statement]) {
    with_transaction(g, |s| {
        let mut ctx = EncodeContext::new(data_model, version);
        for st in statements {
            encode(s, &mut ctx, st)?;
        }
        Ok(())
    })
    .unwrap();
}

fn publish(g: &mut SqliteGraph, path: &str) -> i64 {
    let dataset = parse_dataset_file(&fixture(path)).unwrap();
    let version = advance_version(g, &dataset.data_model).unwrap();
    deprecate_records(g, &dataset.data_model, &dataset.record_uris(), version, MAX_DEPTH).unwrap();
    import(g, &dataset.data_model, version, &dataset.statements);
    version
}

#[test]
fn test_reimport_adds_no_relationships() {
    // Given: Resource and literal statements imported once
    let mut g = SqliteGraph::open_in_memory().unwrap();
    let data_model = "http://example.org/dm/books";
    let statements = vec![
        Statement::new(Term::resource("http://example.org/book/1"), "hasTitle", Term::literal("A")),
        Statement::new(
            Term::resource("http://example.org/book/1"),
            "hasPublisher",
            Term::resource("http://example.org/pub/1"),
        ),
        Statement::new(Term::resource("http://example.org/pub/1"), "hasName", Term::literal("ACME")),
    ];
    import(&mut g, data_model, 1, &statements);
    let once = g.relationship_count().unwrap();

    // When: The same statements are imported again
    import(&mut g, data_model, 1, &statements);

    // Then: The edge count is unchanged
    assert_eq!(once, 3);
    assert_eq!(g.relationship_count().unwrap(), once);
}

#[test]
fn test_rollback_discards_batch() {
    // Given: A batch that fails after writing
    let mut g = SqliteGraph::open_in_memory().unwrap();
    let dataset = parse_dataset_file(&fixture("books_v1.yaml")).unwrap();

    let result: Result<(), _> = with_transaction(&mut g, |s| {
        let mut ctx = EncodeContext::new(&dataset.data_model, 1);
        for st in &dataset.statements {
            encode(s, &mut ctx, st)?;
        }
        Err(graphdelta_core::ExError::new(ExErrorKind::Encoding).with_message("abort"))
    });

    // Then: Nothing from the batch is visible
    assert!(result.is_err());
    assert!(!g.in_tx());
    assert_eq!(g.relationship_count().unwrap(), 0);
}

#[test]
fn test_state_survives_reopen() {
    // Given: An on-disk database with one published version
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("graph.db");
    let data_model = {
        let mut g = SqliteGraph::open(&path).unwrap();
        publish(&mut g, "books_v1.yaml");
        parse_dataset_file(&fixture("books_v1.yaml")).unwrap().data_model
    };

    // When: The database is reopened
    let g = SqliteGraph::open(&path).unwrap();

    // Then: The version and hash index are still there
    assert_eq!(current_version(&g, &data_model).unwrap(), 1);
    assert_eq!(g.relationship_count().unwrap(), 4);
    let mut indexed = 0;
    for rel in 1..=4u64 {
        let rel = graphdelta_core::model::RelId(rel);
        if let Some(hex) = g.rel_property(rel, "hash").unwrap() {
            let h = hash::StatementHash::from_hex(hex.as_str().unwrap_or_default());
            if g.lookup_statement_hash(&h).unwrap() == Some(rel) {
                indexed += 1;
            }
        }
    }
    assert_eq!(indexed, 4);
}

#[test]
fn test_title_change_is_one_modification() {
    // Given: Two versions of a book differing only in the title
    let mut g = SqliteGraph::open_in_memory().unwrap();
    let v1 = publish(&mut g, "books_v1.yaml");
    let v2 = publish(&mut g, "books_v2.json");
    let schema = ContentSchema::new(
        vec![AttributePath::new(["hasAuthor", "hasName"]).unwrap()],
        AttributePath::new(["hasTitle"]).unwrap(),
    );

    // When: The changeset is computed
    let changeset = compute_changeset(
        &mut g,
        "http://example.org/book/1",
        "http://example.org/dm/books",
        &schema,
        v1,
        v2,
        MAX_DEPTH,
    )
    .unwrap();

    // Then: Exactly one modification, nothing added or deleted
    assert_eq!((v1, v2), (1, 2));
    assert_eq!(changeset.modifications.len(), 1);
    assert!(changeset.additions.is_empty());
    assert!(changeset.deletions.is_empty());
    let (old_uuid, new_uuid) = changeset.modifications.iter().next().unwrap();
    assert_eq!(
        changeset.existing_modified_statements[old_uuid].object.value.as_deref(),
        Some("A")
    );
    assert_eq!(
        changeset.new_modified_statements[new_uuid].object.value.as_deref(),
        Some("B")
    );
}
