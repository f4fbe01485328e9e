#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use common::flat_repo;
use knowlex_core::diff::JsonStructuralDiff;
use knowlex_core::errors::KnowlexError;
use knowlex_core::lifecycle::{DraftRequest, PackageRequest};
use knowlex_core::logging_facility::test_capture::init_test_capture;
use knowlex_core::{apply, log_op_end, log_op_error, log_op_start, Command};
use knowlex_core_types::schema::{EVENT_END, EVENT_END_ERROR, EVENT_START};

#[test]
fn test_log_op_error_includes_code() {
    let capture = init_test_capture();
    let op_name = "test_log_op_error_unique_1";

    let err = KnowlexError::ArtifactNotFound {
        reference: "a-1".to_string(),
    };
    log_op_error!(op_name, err, duration_ms = 10);

    let events: Vec<_> = capture
        .events_for_op(op_name)
        .into_iter()
        .filter(|e| e.event.as_deref() == Some(EVENT_END_ERROR))
        .collect();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].field("err.code"), Some("ERR_NOT_FOUND"));
    assert_eq!(events[0].field("duration_ms"), Some("10"));
}

#[test]
fn test_start_and_end_pair() {
    let capture = init_test_capture();
    let op_name = "test_start_end_unique_2";

    log_op_start!(op_name, artifact.id = "a-1");
    log_op_end!(op_name, duration_ms = 5);

    let events = capture.events_for_op(op_name);
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].event.as_deref(), Some(EVENT_START));
    assert_eq!(events[0].field("artifact.id"), Some("a-1"));
    assert_eq!(events[1].event.as_deref(), Some(EVENT_END));
}

#[test]
fn test_boundary_macros_as_match_arms() {
    let capture = init_test_capture();
    let op_name = "test_match_arm_unique_3";

    for outcome in [Ok(3usize), Err(KnowlexError::MissingVersionBehavior)] {
        match outcome {
            Ok(len) => log_op_end!(op_name, duration_ms = 1, batch_len = len),
            Err(e) => log_op_error!(op_name, e, duration_ms = 1),
        }
    }

    let events = capture.events_for_op(op_name);
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].field("batch_len"), Some("3"));
    assert_eq!(events[1].event.as_deref(), Some(EVENT_END_ERROR));
}

#[test]
fn test_apply_brackets_package_with_start_and_end() {
    let capture = init_test_capture();
    let mut repo = flat_repo();

    apply(
        &mut repo,
        Command::Package(PackageRequest {
            id: "root".to_string(),
            ..PackageRequest::default()
        }),
        &JsonStructuralDiff::default(),
    )
    .unwrap();

    capture.assert_event_exists("package", EVENT_START);
    let ends = capture.count_events(|e| {
        e.op.as_deref() == Some("package")
            && e.event.as_deref() == Some(EVENT_END)
            && e.field("batch_len") == Some("5")
    });
    assert_eq!(ends, 1);
}

#[test]
fn test_apply_failure_emits_end_error() {
    let capture = init_test_capture();
    let mut repo = flat_repo();

    let result = apply(
        &mut repo,
        Command::Draft(DraftRequest {
            id: "log-test-missing-root".to_string(),
            version: "1.0.0".to_string(),
        }),
        &JsonStructuralDiff::default(),
    );
    assert!(result.is_err());

    let starts = capture.count_events(|e| {
        e.op.as_deref() == Some("draft")
            && e.event.as_deref() == Some(EVENT_START)
            && e.field("artifact.id") == Some("log-test-missing-root")
    });
    assert_eq!(starts, 1);

    let errors = capture.count_events(|e| {
        e.op.as_deref() == Some("draft")
            && e.event.as_deref() == Some(EVENT_END_ERROR)
            && e.field("err.code") == Some("ERR_NOT_FOUND")
    });
    assert!(errors >= 1);
}
