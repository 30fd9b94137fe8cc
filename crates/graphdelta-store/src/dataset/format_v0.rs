//! Dataset Format v0 schema
//!
//! Defines the document structure for statement import

use graphdelta_core::model::{record_uris, Statement};
use serde::{Deserialize, Serialize};

/// Top-level dataset file structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetV0 {
    /// Schema version (must be 0 for this format)
    pub schema_version: u32,

    /// Data model the statements belong to
    pub data_model: String,

    /// Statements in record order
    #[serde(default)]
    pub statements: Vec<Statement>,
}

impl DatasetV0 {
    /// Distinct record URIs in first-seen order
    ///
    /// A statement's record is its explicit `resource_uri`, else its
    /// resource subject; blank-node subjects belong to the record before them.
    pub fn record_uris(&self) -> Vec<String> {
        record_uris(&self.statements)
    }
}
