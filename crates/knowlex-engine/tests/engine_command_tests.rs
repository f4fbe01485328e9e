#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use knowlex_core::errors::ExErrorKind;
use knowlex_core::lifecycle::{DraftRequest, PackageRequest};
use knowlex_core::{ArtifactKind, ArtifactRepository, Command, CommandOutcome};
use knowlex_core_types::{RequestContext, RequestId, TraceId};
use knowlex_engine::{
    apply_engine_command, apply_in_context, EngineCommand, EngineCommandResult, EngineConfig,
};
use knowlex_store::SqliteArtifactRepository;

fn lifecycle(result: EngineCommandResult) -> CommandOutcome {
    match result {
        EngineCommandResult::Lifecycle(outcome) => outcome,
        other => panic!("unexpected result {:?}", other),
    }
}

#[test]
fn test_import_then_draft() {
    let (_dir, mut conn, seed) = common::setup();
    let config = EngineConfig::default();

    let imported =
        apply_engine_command(EngineCommand::Import { path: seed }, &mut conn, &config).unwrap();
    match imported {
        EngineCommandResult::Imported(receipt) => assert_eq!(receipt.created(), 3),
        other => panic!("unexpected result {:?}", other),
    }

    let drafted = lifecycle(
        apply_engine_command(
            EngineCommand::Lifecycle(Command::Draft(DraftRequest {
                id: "spec".to_string(),
                version: "1.1.0".to_string(),
            })),
            &mut conn,
            &config,
        )
        .unwrap(),
    );
    assert_eq!(drafted.receipt().unwrap().created(), 2);

    let repo = SqliteArtifactRepository::new(&mut conn);
    let drafts = repo
        .search_by_url("http://example.org/rules", Some("1.1.0-draft"))
        .unwrap();
    assert_eq!(drafts.len(), 1);
}

#[test]
fn test_package_uses_configured_default_priority() {
    let (_dir, mut conn, seed) = common::setup();
    let config = EngineConfig::from_toml_str("default_priority = \"stat\"").unwrap();
    apply_engine_command(EngineCommand::Import { path: seed }, &mut conn, &config).unwrap();

    let packaged = lifecycle(
        apply_engine_command(
            EngineCommand::Lifecycle(Command::Package(PackageRequest {
                id: "spec".to_string(),
                ..PackageRequest::default()
            })),
            &mut conn,
            &config,
        )
        .unwrap(),
    );
    let batch = packaged.batch().unwrap();
    assert_eq!(batch.len(), 3);
    let codes = batch
        .artifacts()
        .find(|a| a.kind == ArtifactKind::CodeList)
        .unwrap();
    assert_eq!(codes.priority(), Some("stat"));
}

#[test]
fn test_import_of_missing_file_is_io_error() {
    let (dir, mut conn, _seed) = common::setup();
    let err = apply_engine_command(
        EngineCommand::Import {
            path: dir.path().join("nope.yaml"),
        },
        &mut conn,
        &EngineConfig::default(),
    )
    .unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::Io);
}

#[test]
fn test_failed_lifecycle_command_is_not_retried_or_applied() {
    let (_dir, mut conn, seed) = common::setup();
    let config = EngineConfig::default();
    apply_engine_command(EngineCommand::Import { path: seed }, &mut conn, &config).unwrap();

    let err = apply_engine_command(
        EngineCommand::Lifecycle(Command::Draft(DraftRequest {
            id: "rules".to_string(),
            version: "not-a-version".to_string(),
        })),
        &mut conn,
        &config,
    )
    .unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::InvalidArgument);

    let repo = SqliteArtifactRepository::new(&mut conn);
    assert_eq!(repo.artifact_count().unwrap(), 3);
}

#[test]
fn test_errors_carry_request_context() {
    let (_dir, mut conn, _seed) = common::setup();
    let ctx = RequestContext::with_request_id(RequestId::from_string("req-9".to_string()))
        .with_trace_id(TraceId::from_string("trace-9".to_string()));

    let err = apply_in_context(
        EngineCommand::Lifecycle(Command::Package(PackageRequest {
            id: "absent".to_string(),
            ..PackageRequest::default()
        })),
        &mut conn,
        &EngineConfig::default(),
        &ctx,
    )
    .unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::NotFound);
    assert_eq!(err.request_id().map(|r| r.as_str()), Some("req-9"));
    assert_eq!(err.trace_id().map(|t| t.as_str()), Some("trace-9"));
}
