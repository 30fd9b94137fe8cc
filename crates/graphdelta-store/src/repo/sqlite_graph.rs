//! SQLite implementation of `GraphStore`
//!
//! Nodes, labels, relationships and properties live in the tables created by
//! `001_graph_schema`; the statement hash index lives in `statement_hashes`.
//! Property values are stored as JSON scalars.

#![allow(clippy::result_large_err)]

use std::path::Path;

use graphdelta_core::errors::{ExError, ExErrorKind, ExResult};
use graphdelta_core::graph::{GraphStore, PropValue, RelEnds};
use graphdelta_core::hash::StatementHash;
use graphdelta_core::model::{NodeId, RelId};
use rusqlite::{Connection, OptionalExtension};

use crate::db;
use crate::errors::{from_rusqlite, transaction_error, Result};
use crate::migrations::apply_migrations;

/// Property graph persisted in one SQLite database
///
/// Outside a transaction every write autocommits. `begin_tx` takes the
/// write lock up front (`BEGIN IMMEDIATE`) so lock contention surfaces
/// there as a retryable `StoreTransaction` error instead of mid-batch.
pub struct SqliteGraph {
    conn: Connection,
    in_tx: bool,
}

fn encode_value(value: &PropValue) -> ExResult<String> {
    Ok(serde_json::to_string(value)?)
}

fn decode_value(text: &str) -> ExResult<PropValue> {
    Ok(serde_json::from_str(text)?)
}

fn sql_id(id: u64) -> i64 {
    id as i64
}

fn node_not_found(node: NodeId) -> ExError {
    ExError::new(ExErrorKind::NotFound)
        .with_op("sqlite_graph")
        .with_entity_id(node.to_string())
        .with_message("node not found")
}

fn rel_not_found(rel: RelId) -> ExError {
    ExError::new(ExErrorKind::NotFound)
        .with_op("sqlite_graph")
        .with_entity_id(rel.to_string())
        .with_message("relationship not found")
}

impl SqliteGraph {
    /// Open (or create) a database file and bring its schema up to date
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = db::open(path)?;
        Self::from_connection(conn)
    }

    /// In-memory database with the full schema
    pub fn open_in_memory() -> Result<Self> {
        let conn = db::open_in_memory()?;
        Self::from_connection(conn)
    }

    /// Configure `conn` and apply pending migrations
    pub fn from_connection(mut conn: Connection) -> Result<Self> {
        db::configure(&conn)?;
        apply_migrations(&mut conn)?;
        Ok(Self { conn, in_tx: false })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    fn node_exists(&self, node: NodeId) -> ExResult<bool> {
        Ok(self
            .conn
            .query_row(
                "SELECT 1 FROM nodes WHERE id = ?1",
                [sql_id(node.0)],
                |_| Ok(()),
            )
            .optional()
            .map_err(from_rusqlite)?
            .is_some())
    }

    fn ensure_node(&self, node: NodeId) -> ExResult<()> {
        if self.node_exists(node)? {
            Ok(())
        } else {
            Err(node_not_found(node))
        }
    }

    fn ensure_rel(&self, rel: RelId) -> ExResult<()> {
        self.relationship(rel).map(|_| ())
    }
}

impl GraphStore for SqliteGraph {
    fn begin_tx(&mut self) -> ExResult<()> {
        if self.in_tx {
            return Err(transaction_error("begin_tx", "transaction already open"));
        }
        self.conn
            .execute_batch("BEGIN IMMEDIATE")
            .map_err(from_rusqlite)?;
        self.in_tx = true;
        Ok(())
    }

    fn commit(&mut self) -> ExResult<()> {
        if !self.in_tx {
            return Err(transaction_error("commit", "commit without open transaction"));
        }
        self.in_tx = false;
        if let Err(err) = self.conn.execute_batch("COMMIT") {
            // A failed COMMIT leaves the transaction open; close it so the
            // connection is usable for the retry
            if let Err(rollback_err) = self.conn.execute_batch("ROLLBACK") {
                tracing::debug!(error = %rollback_err, "rollback after failed commit also failed");
            }
            return Err(transaction_error("commit", err.to_string()));
        }
        Ok(())
    }

    fn rollback(&mut self) -> ExResult<()> {
        if !self.in_tx {
            return Err(transaction_error(
                "rollback",
                "rollback without open transaction",
            ));
        }
        self.in_tx = false;
        self.conn
            .execute_batch("ROLLBACK")
            .map_err(|e| transaction_error("rollback", e.to_string()))
    }

    fn in_tx(&self) -> bool {
        self.in_tx
    }

    fn create_node(&mut self, labels: &[&str]) -> ExResult<NodeId> {
        self.conn
            .execute("INSERT INTO nodes DEFAULT VALUES", [])
            .map_err(from_rusqlite)?;
        let node = NodeId(self.conn.last_insert_rowid() as u64);
        for label in labels {
            self.add_label(node, label)?;
        }
        Ok(node)
    }

    fn add_label(&mut self, node: NodeId, label: &str) -> ExResult<()> {
        self.ensure_node(node)?;
        self.conn
            .execute(
                "INSERT OR IGNORE INTO node_labels (node_id, label) VALUES (?1, ?2)",
                rusqlite::params![sql_id(node.0), label],
            )
            .map_err(from_rusqlite)?;
        Ok(())
    }

    fn labels(&self, node: NodeId) -> ExResult<Vec<String>> {
        self.ensure_node(node)?;
        let mut stmt = self
            .conn
            .prepare_cached("SELECT label FROM node_labels WHERE node_id = ?1 ORDER BY label")
            .map_err(from_rusqlite)?;
        let labels = stmt
            .query_map([sql_id(node.0)], |row| row.get(0))
            .map_err(from_rusqlite)?
            .collect::<std::result::Result<Vec<String>, _>>()
            .map_err(from_rusqlite)?;
        Ok(labels)
    }

    fn set_node_property(&mut self, node: NodeId, key: &str, value: PropValue) -> ExResult<()> {
        self.ensure_node(node)?;
        self.conn
            .execute(
                "INSERT INTO node_props (node_id, key, value) VALUES (?1, ?2, ?3)
                 ON CONFLICT(node_id, key) DO UPDATE SET value = excluded.value",
                rusqlite::params![sql_id(node.0), key, encode_value(&value)?],
            )
            .map_err(from_rusqlite)?;
        Ok(())
    }

    fn node_property(&self, node: NodeId, key: &str) -> ExResult<Option<PropValue>> {
        let text: Option<String> = self
            .conn
            .query_row(
                "SELECT value FROM node_props WHERE node_id = ?1 AND key = ?2",
                rusqlite::params![sql_id(node.0), key],
                |row| row.get(0),
            )
            .optional()
            .map_err(from_rusqlite)?;
        match text {
            Some(text) => Ok(Some(decode_value(&text)?)),
            None => {
                self.ensure_node(node)?;
                Ok(None)
            }
        }
    }

    fn remove_node_property(&mut self, node: NodeId, key: &str) -> ExResult<()> {
        self.ensure_node(node)?;
        self.conn
            .execute(
                "DELETE FROM node_props WHERE node_id = ?1 AND key = ?2",
                rusqlite::params![sql_id(node.0), key],
            )
            .map_err(from_rusqlite)?;
        Ok(())
    }

    fn find_nodes(&self, label: &str, key: &str, value: &PropValue) -> ExResult<Vec<NodeId>> {
        let mut stmt = self
            .conn
            .prepare_cached(
                "SELECT p.node_id FROM node_props p
                 JOIN node_labels l ON l.node_id = p.node_id
                 WHERE l.label = ?1 AND p.key = ?2 AND p.value = ?3
                 ORDER BY p.node_id",
            )
            .map_err(from_rusqlite)?;
        let ids = stmt
            .query_map(rusqlite::params![label, key, encode_value(value)?], |row| {
                row.get::<_, i64>(0)
            })
            .map_err(from_rusqlite)?
            .collect::<std::result::Result<Vec<i64>, _>>()
            .map_err(from_rusqlite)?;
        Ok(ids.into_iter().map(|id| NodeId(id as u64)).collect())
    }

    fn create_relationship(&mut self, from: NodeId, to: NodeId, rel_type: &str) -> ExResult<RelId> {
        self.ensure_node(from)?;
        self.ensure_node(to)?;
        self.conn
            .execute(
                "INSERT INTO rels (start_node, end_node, rel_type) VALUES (?1, ?2, ?3)",
                rusqlite::params![sql_id(from.0), sql_id(to.0), rel_type],
            )
            .map_err(from_rusqlite)?;
        Ok(RelId(self.conn.last_insert_rowid() as u64))
    }

    fn relationship(&self, rel: RelId) -> ExResult<RelEnds> {
        let row: Option<(i64, i64, String)> = self
            .conn
            .query_row(
                "SELECT start_node, end_node, rel_type FROM rels WHERE id = ?1",
                [sql_id(rel.0)],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()
            .map_err(from_rusqlite)?;
        let (start, end, rel_type) = row.ok_or_else(|| rel_not_found(rel))?;
        Ok(RelEnds {
            start: NodeId(start as u64),
            end: NodeId(end as u64),
            rel_type,
        })
    }

    fn set_rel_property(&mut self, rel: RelId, key: &str, value: PropValue) -> ExResult<()> {
        self.ensure_rel(rel)?;
        self.conn
            .execute(
                "INSERT INTO rel_props (rel_id, key, value) VALUES (?1, ?2, ?3)
                 ON CONFLICT(rel_id, key) DO UPDATE SET value = excluded.value",
                rusqlite::params![sql_id(rel.0), key, encode_value(&value)?],
            )
            .map_err(from_rusqlite)?;
        Ok(())
    }

    fn rel_property(&self, rel: RelId, key: &str) -> ExResult<Option<PropValue>> {
        let text: Option<String> = self
            .conn
            .query_row(
                "SELECT value FROM rel_props WHERE rel_id = ?1 AND key = ?2",
                rusqlite::params![sql_id(rel.0), key],
                |row| row.get(0),
            )
            .optional()
            .map_err(from_rusqlite)?;
        match text {
            Some(text) => Ok(Some(decode_value(&text)?)),
            None => {
                self.ensure_rel(rel)?;
                Ok(None)
            }
        }
    }

    fn remove_rel_property(&mut self, rel: RelId, key: &str) -> ExResult<()> {
        self.ensure_rel(rel)?;
        self.conn
            .execute(
                "DELETE FROM rel_props WHERE rel_id = ?1 AND key = ?2",
                rusqlite::params![sql_id(rel.0), key],
            )
            .map_err(from_rusqlite)?;
        Ok(())
    }

    fn outgoing(&self, node: NodeId) -> ExResult<Vec<RelId>> {
        self.ensure_node(node)?;
        let mut stmt = self
            .conn
            .prepare_cached("SELECT id FROM rels WHERE start_node = ?1 ORDER BY id")
            .map_err(from_rusqlite)?;
        let ids = stmt
            .query_map([sql_id(node.0)], |row| row.get::<_, i64>(0))
            .map_err(from_rusqlite)?
            .collect::<std::result::Result<Vec<i64>, _>>()
            .map_err(from_rusqlite)?;
        Ok(ids.into_iter().map(|id| RelId(id as u64)).collect())
    }

    fn lookup_statement_hash(&self, hash: &StatementHash) -> ExResult<Option<RelId>> {
        let rel: Option<i64> = self
            .conn
            .query_row(
                "SELECT rel_id FROM statement_hashes WHERE hash = ?1",
                [hash.as_str()],
                |row| row.get(0),
            )
            .optional()
            .map_err(from_rusqlite)?;
        Ok(rel.map(|id| RelId(id as u64)))
    }

    fn register_statement_hash(&mut self, hash: &StatementHash, rel: RelId) -> ExResult<()> {
        self.conn
            .execute(
                "INSERT INTO statement_hashes (hash, rel_id) VALUES (?1, ?2)
                 ON CONFLICT(hash) DO UPDATE SET rel_id = excluded.rel_id",
                rusqlite::params![hash.as_str(), sql_id(rel.0)],
            )
            .map_err(from_rusqlite)?;
        Ok(())
    }

    fn remove_statement_hash(&mut self, hash: &StatementHash) -> ExResult<bool> {
        let removed = self
            .conn
            .execute(
                "DELETE FROM statement_hashes WHERE hash = ?1",
                [hash.as_str()],
            )
            .map_err(from_rusqlite)?;
        Ok(removed > 0)
    }

    fn relationship_count(&self) -> ExResult<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM rels", [], |row| row.get(0))
            .map_err(from_rusqlite)?;
        Ok(count as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_props_round_trip_through_json() {
        let mut g = SqliteGraph::open_in_memory().unwrap();
        let n = g.create_node(&["RESOURCE"]).unwrap();

        g.set_node_property(n, "uri", "http://ex.org/r1".into()).unwrap();
        g.set_node_property(n, "latestVersion", 3i64.into()).unwrap();
        g.set_node_property(n, "matched", true.into()).unwrap();

        assert_eq!(
            g.node_property(n, "uri").unwrap(),
            Some(PropValue::Str("http://ex.org/r1".to_string()))
        );
        assert_eq!(g.node_property(n, "latestVersion").unwrap(), Some(PropValue::Int(3)));
        assert_eq!(g.node_property(n, "matched").unwrap(), Some(PropValue::Bool(true)));
        assert_eq!(g.node_property(n, "missing").unwrap(), None);
    }

    #[test]
    fn test_string_and_int_values_do_not_collide() {
        let mut g = SqliteGraph::open_in_memory().unwrap();
        let a = g.create_node(&["LITERAL"]).unwrap();
        let b = g.create_node(&["LITERAL"]).unwrap();
        g.set_node_property(a, "value", "1".into()).unwrap();
        g.set_node_property(b, "value", 1i64.into()).unwrap();

        assert_eq!(g.find_nodes("LITERAL", "value", &"1".into()).unwrap(), vec![a]);
        assert_eq!(g.find_nodes("LITERAL", "value", &1i64.into()).unwrap(), vec![b]);
    }

    #[test]
    fn test_unknown_node_is_not_found() {
        let g = SqliteGraph::open_in_memory().unwrap();
        let err = g.node_property(NodeId(42), "uri").unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::NotFound);
    }

    #[test]
    fn test_nested_begin_is_rejected() {
        let mut g = SqliteGraph::open_in_memory().unwrap();
        g.begin_tx().unwrap();
        let err = g.begin_tx().unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::StoreTransaction);
        g.rollback().unwrap();
        assert!(!g.in_tx());
    }
}
