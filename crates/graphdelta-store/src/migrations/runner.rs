//! Migration runner
//!
//! Every applied migration is recorded in `schema_version` together with the
//! SHA-256 of its SQL. On each run the recorded checksums are compared with
//! the embedded SQL first; a database whose history no longer matches is
//! left untouched.

#![allow(clippy::result_large_err)]

use std::collections::HashMap;

use rusqlite::Connection;

use crate::errors::{checksum_mismatch, from_rusqlite, migration_error, Result};
use crate::migrations::checksums::compute_checksum;
use crate::migrations::embedded::{Migration, MIGRATIONS};

const SCHEMA_VERSION_DDL: &str = "CREATE TABLE IF NOT EXISTS schema_version (
    id INTEGER PRIMARY KEY,
    migration_id TEXT NOT NULL UNIQUE,
    applied_at INTEGER NOT NULL,
    checksum TEXT
)";

/// Bring the database schema up to date
///
/// Returns how many migrations were applied by this call; zero on an
/// up-to-date database.
///
/// # Errors
///
/// `Persistence` when a recorded checksum differs from the embedded SQL or a
/// migration fails; the failing migration is rolled back.
pub fn apply_migrations(conn: &mut Connection) -> Result<usize> {
    conn.execute(SCHEMA_VERSION_DDL, []).map_err(from_rusqlite)?;

    let recorded = recorded_checksums(conn)?;
    for migration in MIGRATIONS {
        // Rows written without a checksum are trusted as-is
        if let Some(Some(expected)) = recorded.get(migration.id) {
            let actual = compute_checksum(migration.sql);
            if *expected != actual {
                return Err(checksum_mismatch(migration.id, expected, &actual));
            }
        }
    }

    let mut applied = 0;
    for migration in MIGRATIONS.iter().filter(|m| !recorded.contains_key(m.id)) {
        apply_one(conn, migration)?;
        applied += 1;
    }
    Ok(applied)
}

/// Ids of applied migrations, in application order
///
/// # Errors
///
/// `Persistence` when `schema_version` cannot be read.
pub fn applied_migrations(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn
        .prepare("SELECT migration_id FROM schema_version ORDER BY id")
        .map_err(from_rusqlite)?;
    let ids = stmt
        .query_map([], |row| row.get(0))
        .map_err(from_rusqlite)?
        .collect::<std::result::Result<Vec<String>, _>>()
        .map_err(from_rusqlite)?;
    Ok(ids)
}

fn recorded_checksums(conn: &Connection) -> Result<HashMap<String, Option<String>>> {
    let mut stmt = conn
        .prepare("SELECT migration_id, checksum FROM schema_version")
        .map_err(from_rusqlite)?;
    let rows = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))
        .map_err(from_rusqlite)?
        .collect::<std::result::Result<HashMap<String, Option<String>>, _>>()
        .map_err(from_rusqlite)?;
    Ok(rows)
}

fn apply_one(conn: &mut Connection, migration: &Migration) -> Result<()> {
    let tx = conn.transaction().map_err(from_rusqlite)?;
    tx.execute_batch(migration.sql)
        .map_err(|e| migration_error(migration.id, &e.to_string()))?;
    tx.execute(
        "INSERT INTO schema_version (migration_id, applied_at, checksum) VALUES (?1, ?2, ?3)",
        rusqlite::params![
            migration.id,
            chrono::Utc::now().timestamp(),
            compute_checksum(migration.sql)
        ],
    )
    .map_err(from_rusqlite)?;
    tx.commit().map_err(from_rusqlite)?;

    tracing::debug!(migration_id = migration.id, "migration applied");
    Ok(())
}
