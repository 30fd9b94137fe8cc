//! Structured logging
//!
//! Engine-level operations are bracketed with [`log_op_start!`],
//! [`log_op_end!`] and [`log_op_error!`]; core and store code only emit
//! `debug` diagnostics and leave boundaries to the engine. Binaries call
//! [`init`] once with a [`Profile`]; tests install [`init_test_capture`]
//! instead and assert on the captured events.
//!
//! ```rust
//! use graphdelta_core::logging_facility::{init, Profile};
//!
//! init(Profile::from_name("development"));
//! ```
//!
//! [`log_op_start!`]: crate::log_op_start
//! [`log_op_end!`]: crate::log_op_end
//! [`log_op_error!`]: crate::log_op_error

pub mod init;
pub mod macros;
pub mod test_capture;

pub use init::{init, Profile};
pub use test_capture::{init_test_capture, CapturedEvent, TestCapture};
