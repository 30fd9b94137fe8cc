//! Embedded, checksummed schema migrations
//!
//! Applied in id order on every open; re-running is a no-op.

mod checksums;
mod embedded;
mod runner;

pub use checksums::compute_checksum;
pub use runner::{applied_migrations, apply_migrations};
