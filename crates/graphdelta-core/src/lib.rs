//! GraphDelta Core - statement encoding, versioning and change detection
//!
//! This crate provides the storage-agnostic kernel of GraphDelta:
//! - Statement encoding onto a property graph with a content-hash index
//! - Half-open version ranges, version bookkeeping and deprecation
//! - Content-schema entity matching between two versions of a record
//! - Delta marking and changeset assembly
//!
//! Everything talks to storage through [`graph::GraphStore`]; the in-memory
//! [`graph::MemoryGraph`] ships here, the SQLite adapter in `graphdelta-store`.

pub mod delta;
pub mod encoder;
pub mod errors;
pub mod graph;
pub mod hash;
pub mod logging_facility;
pub mod model;
pub mod versioning;

pub use graphdelta_core_types as core_types;

// Re-export commonly used types
pub use delta::compute_changeset;
pub use encoder::{encode, EncodeContext, ImportStats};
pub use errors::{ExError, ExErrorKind, ExResult, GraphDeltaError, Result};
pub use graph::{GraphStore, MemoryGraph};
pub use model::{Changeset, ContentSchema, DeltaState, Range, Statement, Term};
pub use versioning::DeprecationStats;
