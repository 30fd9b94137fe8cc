//! Core types shared across GraphDelta facilities
//!
//! This crate provides the foundational types used by the error and logging
//! facilities of every other crate in the workspace:
//!
//! - **Correlation types**: RunId, RunContext
//! - **Schema constants**: Canonical field keys and event names

pub mod correlation;
pub mod schema;

pub use correlation::{RunContext, RunId};
