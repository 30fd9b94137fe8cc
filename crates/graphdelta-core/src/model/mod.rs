//! Domain models for statement encoding, versioning and change detection

pub mod changeset;
pub mod content_schema;
pub mod delta_state;
pub mod node;
pub mod range;
pub mod statement;

pub use changeset::Changeset;
pub use content_schema::{AttributePath, ContentSchema};
pub use delta_state::DeltaState;
pub use node::{NodeId, NodeType, RelId};
pub use range::Range;
pub use statement::{record_uris, NodeDescriptor, Statement, StoredStatement, Term};

/// The "is-a" predicate; its objects are promoted to type nodes
pub const RDF_TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";
