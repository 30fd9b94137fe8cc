// Integration tests for the migration framework

use graphdelta_core::errors::ExErrorKind;
use graphdelta_store::migrations::{applied_migrations, apply_migrations};
use rusqlite::Connection;

fn setup_test_db() -> Connection {
    Connection::open_in_memory().expect("Failed to create in-memory database")
}

fn get_table_names(conn: &Connection) -> Vec<String> {
    let mut stmt = conn
        .prepare("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")
        .unwrap();
    stmt.query_map([], |row| row.get(0))
        .unwrap()
        .collect::<Result<Vec<String>, _>>()
        .unwrap()
}

#[test]
fn test_apply_migrations_on_empty_db() {
    // Given: An empty SQLite database
    let mut conn = setup_test_db();

    // When: Migrations are applied
    let result = apply_migrations(&mut conn);

    // Then: All migrations succeed and the graph tables exist
    assert!(result.is_ok(), "Migrations should succeed: {:?}", result.err());

    let tables = get_table_names(&conn);
    for expected in [
        "schema_version",
        "nodes",
        "node_labels",
        "node_props",
        "rels",
        "rel_props",
        "statement_hashes",
    ] {
        assert!(tables.contains(&expected.to_string()), "Missing table: {}", expected);
    }
}

#[test]
fn test_migrations_are_idempotent() {
    // Given: A database with migrations applied
    let mut conn = setup_test_db();
    apply_migrations(&mut conn).unwrap();

    // When: Migrations are applied again
    apply_migrations(&mut conn).unwrap();

    // Then: Each migration is recorded exactly once, in order
    assert_eq!(
        applied_migrations(&conn).unwrap(),
        vec!["001_graph_schema".to_string(), "002_statement_hash_index".to_string()]
    );
}

#[test]
fn test_edited_migration_is_detected() {
    // Given: A database whose recorded checksum no longer matches
    let mut conn = setup_test_db();
    apply_migrations(&mut conn).unwrap();
    conn.execute(
        "UPDATE schema_version SET checksum = 'deadbeef' WHERE migration_id = '001_graph_schema'",
        [],
    )
    .unwrap();

    // When: Migrations are applied
    let err = apply_migrations(&mut conn).unwrap_err();

    // Then: The run is refused
    assert_eq!(err.kind(), ExErrorKind::Persistence);
    assert!(err.message().contains("Checksum mismatch for migration 001_graph_schema"));
}

#[test]
fn test_checksums_are_recorded() {
    let mut conn = setup_test_db();
    apply_migrations(&mut conn).unwrap();

    let missing: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM schema_version WHERE checksum IS NULL OR length(checksum) != 64",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(missing, 0);
}
