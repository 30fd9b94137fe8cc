//! Abstract statements (encoder input) and stored statements (read back)

use serde::{Deserialize, Serialize};

use crate::errors::{GraphDeltaError, Result};
use crate::model::node::{NodeId, NodeType, RelId};

/// Subject or object of an abstract statement
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Term {
    /// URI-identified node, optionally scoped to a data model
    Resource {
        uri: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        data_model: Option<String>,
    },
    /// Blank node, identified only within one record run
    Bnode { id: String },
    /// Value node
    Literal { value: String },
}

impl Term {
    pub fn resource(uri: impl Into<String>) -> Self {
        Term::Resource {
            uri: uri.into(),
            data_model: None,
        }
    }

    pub fn resource_in(uri: impl Into<String>, data_model: impl Into<String>) -> Self {
        Term::Resource {
            uri: uri.into(),
            data_model: Some(data_model.into()),
        }
    }

    pub fn bnode(id: impl Into<String>) -> Self {
        Term::Bnode { id: id.into() }
    }

    pub fn literal(value: impl Into<String>) -> Self {
        Term::Literal {
            value: value.into(),
        }
    }

    /// Node type before any "is-a" promotion
    pub fn node_type(&self) -> NodeType {
        match self {
            Term::Resource { .. } => NodeType::Resource,
            Term::Bnode { .. } => NodeType::BNode,
            Term::Literal { .. } => NodeType::Literal,
        }
    }

    fn validate(&self, role: &str) -> Result<()> {
        let (field, text) = match self {
            Term::Resource { uri, .. } => ("uri", uri),
            Term::Bnode { id } => ("id", id),
            Term::Literal { .. } => return Ok(()),
        };
        if text.trim().is_empty() {
            return Err(GraphDeltaError::MalformedStatement {
                reason: format!("{} {} is empty", role, field),
            });
        }
        Ok(())
    }
}

/// Subject–predicate–object fact with ordinal position
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statement {
    pub subject: Term,
    pub predicate: String,
    pub object: Term,
    /// Position among same-subject/predicate siblings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<i64>,
    /// Absolute ordinal; assigned by the encoder when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<i64>,
    /// Owning record URI
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_uri: Option<String>,
    /// Store-independent identity; generated when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
}

impl Statement {
    pub fn new(subject: Term, predicate: impl Into<String>, object: Term) -> Self {
        Self {
            subject,
            predicate: predicate.into(),
            object,
            order: None,
            index: None,
            resource_uri: None,
            uuid: None,
        }
    }

    pub fn with_order(mut self, order: i64) -> Self {
        self.order = Some(order);
        self
    }

    pub fn with_index(mut self, index: i64) -> Self {
        self.index = Some(index);
        self
    }

    pub fn with_resource_uri(mut self, uri: impl Into<String>) -> Self {
        self.resource_uri = Some(uri.into());
        self
    }

    pub fn with_uuid(mut self, uuid: impl Into<String>) -> Self {
        self.uuid = Some(uuid.into());
        self
    }

    /// Reject statements that cannot be encoded
    ///
    /// # Errors
    ///
    /// Returns `MalformedStatement` for an empty predicate, a literal subject,
    /// or an empty URI / blank-node id.
    pub fn validate(&self) -> Result<()> {
        if self.predicate.trim().is_empty() {
            return Err(GraphDeltaError::MalformedStatement {
                reason: "predicate is empty".to_string(),
            });
        }
        if matches!(self.subject, Term::Literal { .. }) {
            return Err(GraphDeltaError::MalformedStatement {
                reason: "subject cannot be a literal".to_string(),
            });
        }
        self.subject.validate("subject")?;
        self.object.validate("object")?;
        Ok(())
    }

    /// Owning record: the explicit `resource_uri`, else a resource subject's URI
    ///
    /// `None` for a blank-node subject without `resource_uri`; such a
    /// statement belongs to whatever record precedes it.
    pub fn record_uri(&self) -> Option<&str> {
        if let Some(uri) = &self.resource_uri {
            return Some(uri);
        }
        match &self.subject {
            Term::Resource { uri, .. } => Some(uri),
            _ => None,
        }
    }
}

/// Distinct owning records of `statements`, in first-seen order
pub fn record_uris(statements: &[Statement]) -> Vec<String> {
    let mut uris: Vec<String> = Vec::new();
    for statement in statements {
        if let Some(uri) = statement.record_uri() {
            if !uris.iter().any(|u| u == uri) {
                uris.push(uri.to_string());
            }
        }
    }
    uris
}

/// Node as read back from the store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeDescriptor {
    pub id: NodeId,
    pub node_type: NodeType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_model: Option<String>,
}

impl NodeDescriptor {
    /// Identifier used in statement hashes and entity keys
    ///
    /// URI for resources (suffixed with the data model when scoped), value
    /// for literals, store id for blank nodes.
    pub fn identifier(&self) -> String {
        match self.node_type {
            NodeType::Resource | NodeType::TypeResource => {
                let uri = self.uri.clone().unwrap_or_default();
                match &self.data_model {
                    Some(dm) => format!("{}@{}", uri, dm),
                    None => uri,
                }
            }
            NodeType::Literal => self.value.clone().unwrap_or_default(),
            NodeType::BNode | NodeType::TypeBNode => self.id.0.to_string(),
        }
    }
}

/// Relationship as read back from the store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredStatement {
    pub rel_id: RelId,
    pub uuid: String,
    pub hash: String,
    pub subject: NodeDescriptor,
    pub predicate: String,
    pub object: NodeDescriptor,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_model: Option<String>,
    pub valid_from: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_to: Option<i64>,
}
