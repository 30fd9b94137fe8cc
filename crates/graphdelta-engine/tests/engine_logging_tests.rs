#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use common::{book, book_schema, DM};
use graphdelta_core::core_types::schema::{EVENT_END, EVENT_END_ERROR, EVENT_START};
use graphdelta_core::graph::MemoryGraph;
use graphdelta_core::logging_facility::test_capture::init_test_capture;
use graphdelta_engine::commands::changeset::compute_changeset;
use graphdelta_engine::commands::import::import_statements;
use graphdelta_engine::EngineConfig;

#[test]
fn test_import_is_bracketed_by_start_and_end() {
    let capture = init_test_capture();
    let mut g = MemoryGraph::new();

    import_statements(
        &mut g,
        book("http://example.org/book/log-1", "Doe", "A"),
        DM,
        &EngineConfig::default(),
    )
    .unwrap();

    capture.assert_event_exists("import_statements", EVENT_START);
    capture.assert_event_exists("import_statements", EVENT_END);
}

#[test]
fn test_failed_changeset_logs_end_error_with_code() {
    let capture = init_test_capture();
    let mut g = MemoryGraph::new();
    let record = "http://example.org/book/log-missing";

    let err = compute_changeset(&mut g, record, DM, &book_schema(), 1, 2, &EngineConfig::default())
        .unwrap_err();

    let errors: Vec<_> = capture
        .events_for("compute_changeset")
        .into_iter()
        .filter(|e| e.event.as_deref() == Some(EVENT_END_ERROR))
        .filter(|e| e.field("record_uri") == Some(record))
        .collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].field("err_code"), Some(err.code()));
    assert_eq!(err.code(), "ERR_NOT_FOUND");
}

#[test]
fn test_successful_changeset_has_no_end_error() {
    let capture = init_test_capture();
    let mut g = MemoryGraph::new();
    let record = "http://example.org/book/log-ok";
    let config = EngineConfig::default();
    graphdelta_engine::commands::import::update_records(&mut g, book(record, "Doe", "A"), DM, &config)
        .unwrap();
    graphdelta_engine::commands::import::update_records(&mut g, book(record, "Doe", "B"), DM, &config)
        .unwrap();

    compute_changeset(&mut g, record, DM, &book_schema(), 1, 2, &config).unwrap();

    let for_record = |event: &str| {
        capture.count_events(|e| {
            e.op.as_deref() == Some("compute_changeset")
                && e.event.as_deref() == Some(event)
                && e.field("record_uri") == Some(record)
        })
    };
    assert_eq!(for_record(EVENT_START), 1);
    assert_eq!(for_record(EVENT_END), 1);
    assert_eq!(for_record(EVENT_END_ERROR), 0);
}
