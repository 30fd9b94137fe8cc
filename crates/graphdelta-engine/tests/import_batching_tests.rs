/// Scenario 1: batched import with record-boundary flushes and replay
mod common;

use common::{book, shelf, DM};
use graphdelta_core::errors::ExErrorKind;
use graphdelta_core::graph::{GraphStore, MemoryGraph};
use graphdelta_core::model::{Statement, Term};
use graphdelta_core::versioning::current_version;
use graphdelta_engine::commands::import::import_statements;
use graphdelta_engine::EngineConfig;

fn tiny_batches() -> EngineConfig {
    EngineConfig {
        batch_size: 1,
        ..EngineConfig::default()
    }
}

#[test]
fn test_blank_nodes_stay_in_their_record_batch() {
    // Given: Three books whose authors are blank nodes, flushed after every record
    let mut g = MemoryGraph::new();
    let statements = shelf(&[
        ("http://example.org/book/1", "Doe", "A"),
        ("http://example.org/book/2", "Roe", "B"),
        ("http://example.org/book/3", "Poe", "C"),
    ]);

    // When: They are imported
    let stats = import_statements(&mut g, statements, DM, &tiny_batches()).unwrap();

    // Then: Every statement became one edge and the shared type node was reused
    assert_eq!(stats.triples, 12);
    assert_eq!(stats.relationships_added, 12);
    assert_eq!(g.relationship_count().unwrap(), 12);
    assert_eq!(current_version(&g, DM).unwrap(), 1);
}

#[test]
fn test_reimport_through_engine_is_idempotent() {
    // Given: Resource and literal statements imported once
    let mut g = MemoryGraph::new();
    let statements: Vec<Statement> = ["A", "B", "C"]
        .iter()
        .enumerate()
        .map(|(i, title)| {
            Statement::new(
                Term::resource(format!("http://example.org/book/{}", i)),
                "hasTitle",
                Term::literal(*title),
            )
        })
        .collect();
    import_statements(&mut g, statements.clone(), DM, &EngineConfig::default()).unwrap();

    // When: The same statements are imported again
    let again = import_statements(&mut g, statements, DM, &EngineConfig::default()).unwrap();

    // Then: Nothing new was written
    assert_eq!(again.triples, 3);
    assert_eq!(again.relationships_added, 0);
    assert_eq!(g.relationship_count().unwrap(), 3);
}

#[test]
fn test_malformed_statement_fails_only_its_batch() {
    // Given: A valid record followed by a record with an empty predicate
    let mut g = MemoryGraph::new();
    let mut statements = book("http://example.org/book/1", "Doe", "A");
    statements.push(Statement::new(
        Term::resource("http://example.org/book/2"),
        "",
        Term::literal("broken"),
    ));

    // When: They are imported with one record per batch
    let err = import_statements(&mut g, statements, DM, &tiny_batches()).unwrap_err();

    // Then: The error is an encoding error and the first record was kept
    assert_eq!(err.kind(), ExErrorKind::Encoding);
    assert_eq!(err.data_model(), Some(DM));
    assert!(err.run_id().is_some());
    assert_eq!(g.relationship_count().unwrap(), 4);
    assert!(!g.in_tx());
}

#[test]
fn test_malformed_statement_rolls_back_whole_batch() {
    // Given: The same input in a single batch
    let mut g = MemoryGraph::new();
    let mut statements = book("http://example.org/book/1", "Doe", "A");
    statements.push(Statement::new(
        Term::resource("http://example.org/book/2"),
        "",
        Term::literal("broken"),
    ));

    // When: They are imported
    let err = import_statements(&mut g, statements, DM, &EngineConfig::default()).unwrap_err();

    // Then: No partial commit
    assert_eq!(err.kind(), ExErrorKind::Encoding);
    assert_eq!(g.relationship_count().unwrap(), 0);
}

#[test]
fn test_replayed_batch_counts_once() {
    // Given: A store whose first commit fails transiently
    let mut g = MemoryGraph::new();
    g.inject_commit_failures(1);

    // When: A record is imported
    let stats = import_statements(
        &mut g,
        book("http://example.org/book/1", "Doe", "A"),
        DM,
        &EngineConfig::default(),
    )
    .unwrap();

    // Then: The replay wrote the record exactly once
    assert_eq!(stats.relationships_added, 4);
    assert_eq!(g.relationship_count().unwrap(), 4);
}
