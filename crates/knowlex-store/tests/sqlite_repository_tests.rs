#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use common::*;
use knowlex_core::batch::{new_placeholder, BatchBuilder};
use knowlex_core::diff::JsonStructuralDiff;
use knowlex_core::errors::ExErrorKind;
use knowlex_core::lifecycle::{ApproveRequest, DraftRequest, PackageRequest, ReleaseRequest};
use knowlex_core::model::{Artifact, ArtifactKind, AssessmentKind, Status};
use knowlex_core::version::VersionBehavior;
use knowlex_core::{apply, ArtifactRepository, BatchType, Command};
use knowlex_store::SqliteArtifactRepository;

fn seed(repo: &mut SqliteArtifactRepository<'_>) {
    for artifact in spec_and_rules() {
        repo.create(artifact).unwrap();
    }
}

#[test]
fn test_failed_batch_rolls_back_every_entry() {
    let (_dir, mut conn) = temp_store();
    let mut repo = SqliteArtifactRepository::new(&mut conn);
    seed(&mut repo);

    let fresh = Artifact::new(new_placeholder(), url("fresh"), ArtifactKind::Library)
        .with_version("1.0.0");
    let clash = Artifact::new(new_placeholder(), url("rules"), ArtifactKind::RuleSet)
        .with_version("1.0.0");
    let batch = BatchBuilder::new()
        .create(fresh)
        .create(clash)
        .build(BatchType::Transaction);

    let err = repo.commit_batch(&batch).unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::Conflict);
    assert_eq!(repo.artifact_count().unwrap(), 2);
    assert!(repo.search_by_url(&url("fresh"), None).unwrap().is_empty());
}

#[test]
fn test_package_batch_commits_idempotently() {
    let (_dir, mut conn) = temp_store();
    let mut repo = SqliteArtifactRepository::new(&mut conn);
    seed(&mut repo);

    let batch = knowlex_core::lifecycle::package(
        &repo,
        &PackageRequest {
            id: "spec".to_string(),
            ..PackageRequest::default()
        },
    )
    .unwrap();
    let receipt = repo.commit_batch(&batch).unwrap();
    assert_eq!(receipt.unchanged(), 2);
    assert_eq!(repo.artifact_count().unwrap(), 2);
}

#[test]
fn test_lifecycle_round_on_disk() {
    let (dir, mut conn) = temp_store();
    let differ = JsonStructuralDiff::default();
    let draft_id = {
        let mut repo = SqliteArtifactRepository::new(&mut conn);
        seed(&mut repo);

        let drafted = apply(
            &mut repo,
            Command::Draft(DraftRequest {
                id: "spec".to_string(),
                version: "1.1.0".to_string(),
            }),
            &differ,
        )
        .unwrap();
        let draft_id = drafted.receipt().unwrap().entries[0].id.clone();

        apply(
            &mut repo,
            Command::Approve(ApproveRequest {
                id: draft_id.clone(),
                assessment_kind: Some(AssessmentKind::Comment),
                summary: Some("ready".to_string()),
                ..ApproveRequest::default()
            }),
            &differ,
        )
        .unwrap();

        apply(
            &mut repo,
            Command::Release(ReleaseRequest {
                id: draft_id.clone(),
                version: Some("1.1.0".to_string()),
                version_behavior: Some(VersionBehavior::Default),
                ..ReleaseRequest::default()
            }),
            &differ,
        )
        .unwrap();
        draft_id
    };
    drop(conn);

    let mut reopened = knowlex_store::db::open_store(dir.path().join("store.db")).unwrap();
    let repo = SqliteArtifactRepository::new(&mut reopened);
    let released = repo.read(&draft_id).unwrap().unwrap();
    assert_eq!(released.status, Status::Active);
    assert_eq!(released.version.as_deref(), Some("1.1.0"));

    let rules = repo.search_by_url(&url("rules"), Some("1.1.0")).unwrap();
    assert_eq!(rules.len(), 1);
    assert_eq!(rules[0].status, Status::Active);

    let assessments = repo
        .search_assessments_for_target(&released.canonical())
        .unwrap();
    assert_eq!(assessments.len(), 1);
    assert_eq!(
        assessments[0].latest().and_then(|e| e.summary.as_deref()),
        Some("ready")
    );
}
