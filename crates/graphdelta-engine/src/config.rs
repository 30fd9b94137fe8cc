//! Engine configuration
//!
//! Every field has a default, so an empty document (or no file at all) is a
//! valid configuration.

#![allow(clippy::result_large_err)]

use std::path::Path;
use std::time::Duration;

use graphdelta_core::errors::{ExError, ExErrorKind};
use graphdelta_store::errors::{io_error, Result};
use serde::{Deserialize, Serialize};

/// Statements per import batch before a flush is due
pub const DEFAULT_BATCH_SIZE: usize = 50_000;
/// Seconds an import batch may stay open before a flush is due
pub const DEFAULT_BATCH_TIME_SECS: u64 = 30;
/// Depth limit for record traversals
pub const DEFAULT_MAX_SUBGRAPH_DEPTH: usize = 64;

/// Batching, retry and traversal limits of the engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Flush after this many statements (at the next record boundary)
    pub batch_size: usize,
    /// Flush after this many seconds (at the next record boundary)
    pub batch_time_secs: u64,
    /// Replay a batch once after a transient store failure
    pub retry_transient: bool,
    /// Depth guard for every traversal of the delta engine and deprecator
    pub max_subgraph_depth: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            batch_time_secs: DEFAULT_BATCH_TIME_SECS,
            retry_transient: true,
            max_subgraph_depth: DEFAULT_MAX_SUBGRAPH_DEPTH,
        }
    }
}

impl EngineConfig {
    /// Parse a TOML document
    ///
    /// # Errors
    ///
    /// `InvalidInput` for malformed TOML or a zero batch size / depth.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: EngineConfig = toml::from_str(content).map_err(|e| {
            ExError::new(ExErrorKind::InvalidInput)
                .with_op("config_load")
                .with_message(format!("TOML parse error: {}", e))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path`; a missing file yields the defaults
    ///
    /// # Errors
    ///
    /// `Io` when the file exists but cannot be read, otherwise as
    /// [`EngineConfig::from_toml_str`].
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no engine config file, using defaults");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|e| io_error("config_load", e))?;
        Self::from_toml_str(&content)
    }

    pub fn batch_time(&self) -> Duration {
        Duration::from_secs(self.batch_time_secs)
    }

    fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(ExError::new(ExErrorKind::InvalidInput)
                .with_op("config_load")
                .with_message("batch_size must be at least 1"));
        }
        if self.max_subgraph_depth == 0 {
            return Err(ExError::new(ExErrorKind::InvalidInput)
                .with_op("config_load")
                .with_message("max_subgraph_depth must be at least 1"));
        }
        Ok(())
    }
}
