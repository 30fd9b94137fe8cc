use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::GraphDeltaError;

/// Store-internal node id
///
/// Only meaningful within one store; blank-node identity across runs is
/// never derived from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u64);

/// Store-internal relationship id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RelId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node:{}", self.0)
    }
}

impl fmt::Display for RelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rel:{}", self.0)
    }
}

/// Kind of a graph node
///
/// The type variants mark nodes that are themselves the object of an
/// "is-a" statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeType {
    #[serde(rename = "RESOURCE")]
    Resource,
    #[serde(rename = "BNODE")]
    BNode,
    #[serde(rename = "TYPE_RESOURCE")]
    TypeResource,
    #[serde(rename = "TYPE_BNODE")]
    TypeBNode,
    #[serde(rename = "LITERAL")]
    Literal,
}

impl NodeType {
    /// Stable wire name, also used as the node label
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeType::Resource => "RESOURCE",
            NodeType::BNode => "BNODE",
            NodeType::TypeResource => "TYPE_RESOURCE",
            NodeType::TypeBNode => "TYPE_BNODE",
            NodeType::Literal => "LITERAL",
        }
    }

    /// Type-variant used when the node is the object of an "is-a" statement
    pub fn promote_to_type(self) -> Self {
        match self {
            NodeType::Resource => NodeType::TypeResource,
            NodeType::BNode => NodeType::TypeBNode,
            other => other,
        }
    }

    pub fn is_resource(&self) -> bool {
        matches!(self, NodeType::Resource | NodeType::TypeResource)
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, NodeType::BNode | NodeType::TypeBNode)
    }

    pub fn is_type(&self) -> bool {
        matches!(self, NodeType::TypeResource | NodeType::TypeBNode)
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NodeType {
    type Err = GraphDeltaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "RESOURCE" => Ok(NodeType::Resource),
            "BNODE" => Ok(NodeType::BNode),
            "TYPE_RESOURCE" => Ok(NodeType::TypeResource),
            "TYPE_BNODE" => Ok(NodeType::TypeBNode),
            "LITERAL" => Ok(NodeType::Literal),
            other => Err(GraphDeltaError::UnknownNodeType {
                name: other.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_names_round_trip() {
        for nt in [
            NodeType::Resource,
            NodeType::BNode,
            NodeType::TypeResource,
            NodeType::TypeBNode,
            NodeType::Literal,
        ] {
            assert_eq!(nt.as_str().parse::<NodeType>().unwrap(), nt);
        }
        assert!("URI".parse::<NodeType>().is_err());
    }

    #[test]
    fn test_promotion() {
        assert_eq!(NodeType::Resource.promote_to_type(), NodeType::TypeResource);
        assert_eq!(NodeType::BNode.promote_to_type(), NodeType::TypeBNode);
        assert_eq!(NodeType::Literal.promote_to_type(), NodeType::Literal);
    }

    #[test]
    fn test_serde_uses_wire_name() {
        let json = serde_json::to_string(&NodeType::TypeBNode).unwrap();
        assert_eq!(json, "\"TYPE_BNODE\"");
    }
}
