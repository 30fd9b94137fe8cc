//! Canonical schema constants for structured logging and events
//!
//! These constants keep field names identical across crates so that log
//! pipelines and the test capture layer can rely on them.

// Canonical field keys for structured logging
pub const FIELD_COMPONENT: &str = "component";
pub const FIELD_OP: &str = "op";
pub const FIELD_EVENT: &str = "event";
pub const FIELD_DURATION_MS: &str = "duration_ms";
pub const FIELD_RUN_ID: &str = "run_id";

// Graph identifiers
pub const FIELD_DATA_MODEL: &str = "data_model";
pub const FIELD_RECORD_URI: &str = "record_uri";
pub const FIELD_VERSION: &str = "version";
pub const FIELD_STATEMENT_HASH: &str = "statement_hash";

// Counters
pub const FIELD_STATEMENTS: &str = "statements";
pub const FIELD_DEPRECATED: &str = "deprecated";

// Error fields
pub const FIELD_ERR_KIND: &str = "err_kind";
pub const FIELD_ERR_CODE: &str = "err_code";

// Canonical event names
pub const EVENT_START: &str = "start";
pub const EVENT_END: &str = "end";
pub const EVENT_END_ERROR: &str = "end_error";
