//! Schema migrations compiled into the binary

/// One ordered schema step
pub struct Migration {
    pub id: &'static str,
    pub sql: &'static str,
}

/// Every migration, oldest first; ids sort in application order
pub const MIGRATIONS: &[Migration] = &[
    Migration {
        id: "001_graph_schema",
        sql: include_str!("../../migrations/001_graph_schema.sql"),
    },
    Migration {
        id: "002_statement_hash_index",
        sql: include_str!("../../migrations/002_statement_hash_index.sql"),
    },
];
