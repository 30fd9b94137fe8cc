//! Repository layer: SQLite-backed property graph

mod sqlite_graph;

pub use sqlite_graph::SqliteGraph;
