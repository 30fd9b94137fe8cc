#![allow(clippy::unwrap_used, clippy::expect_used)]

use graphdelta_core::core_types::schema::{EVENT_END, EVENT_END_ERROR, EVENT_START};
use graphdelta_core::errors::{ExError, ExErrorKind, GraphDeltaError};
use graphdelta_core::logging_facility::test_capture::init_test_capture;
use graphdelta_core::{log_op_end, log_op_error, log_op_start};

#[test]
fn test_log_op_start_macro() {
    let capture = init_test_capture();
    let op_name = "gd_log_op_start_unique_1";

    log_op_start!(op_name);

    assert_eq!(
        capture.count_events(|e| e.op.as_deref() == Some(op_name)
            && e.event.as_deref() == Some(EVENT_START)),
        1
    );
}

#[test]
fn test_log_op_end_records_duration() {
    let capture = init_test_capture();
    let op_name = "gd_log_op_end_unique_2";

    log_op_end!(op_name, duration_ms = 42);

    let events = capture.events_for(op_name);
    assert_eq!(events.len(), 1, "Should have exactly one end event");
    assert_eq!(events[0].event.as_deref(), Some(EVENT_END));
    assert_eq!(events[0].field("duration_ms"), Some("42"));
}

#[test]
fn test_log_op_error_includes_code() {
    let capture = init_test_capture();
    let op_name = "gd_log_op_error_unique_3";

    let err = GraphDeltaError::UnresolvablePath {
        path: "hasAuthor :: hasName".to_string(),
        record_uri: "http://ex.org/b1".to_string(),
        reason: "no terminal".to_string(),
    };
    log_op_error!(op_name, err, duration_ms = 10);

    let events = capture.events_for(op_name);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event.as_deref(), Some(EVENT_END_ERROR));
    assert_eq!(events[0].field("err_code"), Some("ERR_SCHEMA_RESOLUTION"));
}

#[test]
fn test_log_op_error_accepts_ex_error() {
    let capture = init_test_capture();
    let op_name = "gd_log_op_error_unique_4";

    let err = ExError::new(ExErrorKind::StoreTransaction).with_message("database is locked");
    log_op_error!(op_name, err, duration_ms = 1, data_model = "dm:1");

    let events = capture.events_for(op_name);
    assert_eq!(events[0].field("err_code"), Some("ERR_STORE_TRANSACTION"));
    assert_eq!(events[0].field("data_model"), Some("dm:1"));
    assert!(events[0]
        .field("error")
        .is_some_and(|rendered| rendered.contains("database is locked")));
}

#[test]
fn test_start_fields_are_captured() {
    let capture = init_test_capture();
    let op_name = "gd_log_fields_unique_5";

    log_op_start!(op_name, data_model = "dm:books", record_uri = "http://ex.org/b1");

    let events = capture.events_for(op_name);
    assert_eq!(events[0].field("data_model"), Some("dm:books"));
    assert_eq!(events[0].field("record_uri"), Some("http://ex.org/b1"));
    assert!(events[0].component.is_some());
}

#[test]
fn test_boundary_single_start_and_end() {
    let capture = init_test_capture();
    let op_name = "gd_boundary_unique_6";

    log_op_start!(op_name);
    log_op_end!(op_name, duration_ms = 3);

    capture.assert_event_exists(op_name, EVENT_START);
    capture.assert_event_exists(op_name, EVENT_END);
    assert_eq!(capture.events_for(op_name).len(), 2);
}

#[test]
#[should_panic(expected = "Expected event")]
fn test_assert_event_exists_fails_for_unknown_op() {
    let capture = init_test_capture();
    capture.assert_event_exists("gd_nonexistent_op_unique_999", EVENT_START);
}
