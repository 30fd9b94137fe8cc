//! Content schema: attribute paths that define entity identity and the
//! value compared once two entities are key-matched

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::{GraphDeltaError, Result};

/// Ordered, non-empty sequence of predicate URIs
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct AttributePath {
    attributes: Vec<String>,
}

impl AttributePath {
    /// # Errors
    ///
    /// Returns `EmptyAttributePath` when no attribute is given.
    pub fn new<I, S>(attributes: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let attributes: Vec<String> = attributes.into_iter().map(Into::into).collect();
        if attributes.is_empty() || attributes.iter().any(|a| a.trim().is_empty()) {
            return Err(GraphDeltaError::EmptyAttributePath);
        }
        Ok(Self { attributes })
    }

    pub fn attributes(&self) -> &[String] {
        &self.attributes
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    /// Always false; kept for clippy's len_without_is_empty
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    /// Longest prefix shared by all paths
    pub fn common_prefix<'a, I>(paths: I) -> Vec<String>
    where
        I: IntoIterator<Item = &'a AttributePath>,
    {
        let mut iter = paths.into_iter();
        let Some(first) = iter.next() else {
            return Vec::new();
        };
        let mut prefix: Vec<String> = first.attributes.clone();
        for path in iter {
            let shared = prefix
                .iter()
                .zip(path.attributes.iter())
                .take_while(|(a, b)| a == b)
                .count();
            prefix.truncate(shared);
        }
        prefix
    }
}

impl TryFrom<Vec<String>> for AttributePath {
    type Error = GraphDeltaError;

    fn try_from(value: Vec<String>) -> Result<Self> {
        AttributePath::new(value)
    }
}

impl From<AttributePath> for Vec<String> {
    fn from(path: AttributePath) -> Self {
        path.attributes
    }
}

impl fmt::Display for AttributePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.attributes.join(" :: "))
    }
}

/// Caller-supplied description of a record's repeating sub-entities
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentSchema {
    /// Locates the record's own key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record_identifier_attribute_path: Option<AttributePath>,
    /// Concatenated leaf values identify one sub-entity
    #[serde(default)]
    pub key_attribute_paths: Vec<AttributePath>,
    /// Leaf compared for equality once two sub-entities are key-matched
    pub value_attribute_path: AttributePath,
}

impl ContentSchema {
    pub fn new(key_attribute_paths: Vec<AttributePath>, value_attribute_path: AttributePath) -> Self {
        Self {
            record_identifier_attribute_path: None,
            key_attribute_paths,
            value_attribute_path,
        }
    }

    pub fn with_record_identifier(mut self, path: AttributePath) -> Self {
        self.record_identifier_attribute_path = Some(path);
        self
    }

    /// Path from the record root to the entity anchors
    pub fn common_attribute_path(&self) -> Vec<String> {
        AttributePath::common_prefix(
            self.key_attribute_paths
                .iter()
                .chain(std::iter::once(&self.value_attribute_path)),
        )
    }
}
