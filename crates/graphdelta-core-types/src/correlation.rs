//! Correlation types for import, deprecation and delta runs
//!
//! Every engine operation runs under a `RunId` so that the batch flushes,
//! retries and per-record failures it logs can be tied back together.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier of one engine run (an import, a deprecation job, a delta job)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(String);

impl RunId {
    /// Generate a new time-ordered RunId (UUIDv7)
    pub fn new() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Wrap an externally supplied id (e.g. one passed on the command line)
    pub fn from_string(s: String) -> Self {
        Self(s)
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Context carried through one engine run
#[derive(Debug, Clone)]
pub struct RunContext {
    pub run_id: RunId,
    /// Data model (data set) the run operates on
    pub data_model: String,
}

impl RunContext {
    /// Create a context with a fresh RunId for the given data model
    pub fn new(data_model: impl Into<String>) -> Self {
        Self {
            run_id: RunId::new(),
            data_model: data_model.into(),
        }
    }

    /// Reuse an existing RunId (e.g. for a retried batch)
    pub fn with_run_id(mut self, run_id: RunId) -> Self {
        self.run_id = run_id;
        self
    }
}
