//! Dataset and content-schema parser with validation
//!
//! Documents are YAML or JSON; the format is chosen by file extension.

#![allow(clippy::result_large_err)]

use crate::dataset::format_v0::DatasetV0;
use crate::errors::{dataset_validation, io_error, Result};
use graphdelta_core::model::ContentSchema;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;

/// Document syntax
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Yaml,
    Json,
}

impl FileFormat {
    /// `.json` files are JSON, everything else is read as YAML
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => FileFormat::Json,
            _ => FileFormat::Yaml,
        }
    }
}

fn parse_document<T: DeserializeOwned>(content: &str, format: FileFormat) -> Result<T> {
    match format {
        FileFormat::Yaml => serde_yaml::from_str(content)
            .map_err(|e| dataset_validation(&format!("YAML parse error: {}", e))),
        FileFormat::Json => serde_json::from_str(content)
            .map_err(|e| dataset_validation(&format!("JSON parse error: {}", e))),
    }
}

fn read_file(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| io_error("dataset_read", e))
}

/// Parse a dataset file from a path
pub fn parse_dataset_file(path: &Path) -> Result<DatasetV0> {
    let content = read_file(path)?;
    parse_dataset_str(&content, FileFormat::from_path(path))
}

/// Parse a dataset from a string
pub fn parse_dataset_str(content: &str, format: FileFormat) -> Result<DatasetV0> {
    let dataset: DatasetV0 = parse_document(content, format)?;
    validate_dataset(&dataset)?;
    Ok(dataset)
}

/// Parse a content-schema file from a path
pub fn parse_schema_file(path: &Path) -> Result<ContentSchema> {
    let content = read_file(path)?;
    parse_schema_str(&content, FileFormat::from_path(path))
}

/// Parse a content schema from a string
///
/// Empty attribute paths are rejected while deserializing.
pub fn parse_schema_str(content: &str, format: FileFormat) -> Result<ContentSchema> {
    parse_document(content, format)
}

fn validate_dataset(dataset: &DatasetV0) -> Result<()> {
    if dataset.schema_version != 0 {
        return Err(dataset_validation(&format!(
            "Unsupported schema_version: {}. Expected 0",
            dataset.schema_version
        )));
    }

    if dataset.data_model.trim().is_empty() {
        return Err(dataset_validation("data_model must not be empty"));
    }

    for (i, statement) in dataset.statements.iter().enumerate() {
        statement
            .validate()
            .map_err(|e| dataset_validation(&format!("statement {}: {}", i, e)))?;
    }

    // Blank-node statements inherit the preceding record, so the first
    // statement has to name one
    if let Some(first) = dataset.statements.first() {
        if first.record_uri().is_none() {
            return Err(dataset_validation(
                "statement 0 has a blank-node subject and no resource_uri",
            ));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use graphdelta_core::errors::ExErrorKind;

    const MINIMAL: &str = r#"
schema_version: 0
data_model: http://ex.org/dm
statements:
  - subject: { type: resource, uri: "http://ex.org/r1" }
    predicate: hasTitle
    object: { type: literal, value: "A" }
"#;

    #[test]
    fn test_parse_minimal_yaml() {
        let dataset = parse_dataset_str(MINIMAL, FileFormat::Yaml).unwrap();
        assert_eq!(dataset.data_model, "http://ex.org/dm");
        assert_eq!(dataset.statements.len(), 1);
        assert_eq!(dataset.record_uris(), vec!["http://ex.org/r1".to_string()]);
    }

    #[test]
    fn test_wrong_schema_version_rejected() {
        let content = MINIMAL.replace("schema_version: 0", "schema_version: 3");
        let err = parse_dataset_str(&content, FileFormat::Yaml).unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::InvalidInput);
        assert!(err.message().contains("schema_version"));
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(FileFormat::from_path(Path::new("a.JSON")), FileFormat::Json);
        assert_eq!(FileFormat::from_path(Path::new("a.yaml")), FileFormat::Yaml);
        assert_eq!(FileFormat::from_path(Path::new("a")), FileFormat::Yaml);
    }
}
