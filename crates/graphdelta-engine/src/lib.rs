//! GraphDelta Engine - Orchestration layer
//!
//! Provides high-level commands that coordinate the encoder, the versioning
//! handler and the delta engine of `graphdelta-core` over any `GraphStore`,
//! with batching, retry and per-record isolation.

pub mod commands;
pub mod config;

pub use config::EngineConfig;
