//! Operation boundary macros
//!
//! An engine operation emits one `start` event and then exactly one of
//! `end` or `end_error`. Extra `key = value` fields are passed through to
//! `tracing` unchanged.

/// Operation started
///
/// ```
/// # use graphdelta_core::log_op_start;
/// log_op_start!("import_statements");
/// log_op_start!("import_statements", data_model = "dm:books");
/// ```
#[macro_export]
macro_rules! log_op_start {
    ($op:expr $(, $($field:tt)*)?) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = $crate::core_types::schema::EVENT_START,
            $($($field)*)?
        )
    };
}

/// Operation finished; `duration_ms` is mandatory
///
/// ```
/// # use graphdelta_core::log_op_end;
/// log_op_end!("update_records", duration_ms = 42, version = 3);
/// ```
#[macro_export]
macro_rules! log_op_end {
    ($op:expr, duration_ms = $duration:expr $(, $($field:tt)*)?) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = $crate::core_types::schema::EVENT_END,
            duration_ms = $duration,
            $($($field)*)?
        )
    };
}

/// Operation failed
///
/// `$err` is anything convertible into `ExError`; its kind, stable code and
/// rendered message are attached as `err_kind`, `err_code` and `error`.
///
/// ```
/// # use graphdelta_core::log_op_error;
/// # use graphdelta_core::errors::GraphDeltaError;
/// log_op_error!("compute_changeset", GraphDeltaError::EmptyAttributePath, duration_ms = 10);
/// ```
#[macro_export]
macro_rules! log_op_error {
    ($op:expr, $err:expr, duration_ms = $duration:expr $(, $($field:tt)*)?) => {{
        let ex_err: $crate::errors::ExError = $err.into();
        tracing::error!(
            component = module_path!(),
            op = $op,
            event = $crate::core_types::schema::EVENT_END_ERROR,
            duration_ms = $duration,
            err_kind = ?ex_err.kind(),
            err_code = ex_err.code(),
            error = %ex_err,
            $($($field)*)?
        )
    }};
}
