//! Dataset and content-schema files
//!
//! Provides:
//! - Dataset format v0 (`schema_version`, `data_model`, `statements`)
//! - Content-schema documents
//! - YAML or JSON parsing with validation

pub mod format_v0;
pub mod parser;

pub use format_v0::DatasetV0;
pub use parser::{
    parse_dataset_file, parse_dataset_str, parse_schema_file, parse_schema_str, FileFormat,
};
