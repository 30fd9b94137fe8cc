//! Subcommand implementations

pub mod changeset;
pub mod deprecate;
pub mod import;
pub mod version;

use clap::Args;
use graphdelta_engine::EngineConfig;
use graphdelta_store::SqliteGraph;
use std::path::PathBuf;

/// Database and engine configuration shared by every subcommand
#[derive(Debug, Args)]
pub struct StoreArgs {
    /// SQLite database file (created when missing)
    #[arg(long, default_value = ".graphdelta/graph.db")]
    pub db: PathBuf,

    /// Engine configuration (TOML); defaults apply when absent
    #[arg(long, default_value = ".graphdelta/config.toml")]
    pub config: PathBuf,
}

impl StoreArgs {
    /// Open the database and load the engine configuration
    pub fn open(&self) -> Result<(SqliteGraph, EngineConfig), Box<dyn std::error::Error>> {
        if let Some(parent) = self.db.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let config = EngineConfig::load(&self.config)?;
        let store = SqliteGraph::open(&self.db)?;
        Ok((store, config))
    }
}
