//! GraphDelta Store - SQLite persistence for the property graph
//!
//! Provides:
//! - SQLite schema with migrations framework
//! - `SqliteGraph`, a `GraphStore` adapter over rusqlite
//! - Dataset and content-schema file loading (YAML or JSON)

pub mod dataset;
pub mod db;
pub mod errors;
pub mod migrations;
pub mod repo;

// Re-export key types
pub use errors::Result;
pub use repo::SqliteGraph;
