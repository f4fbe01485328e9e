use knowlex_core::model::{Artifact, ArtifactKind, CanonicalRef, Reference, Status};
use rusqlite::Connection;
use tempfile::TempDir;

/// Migrated on-disk store; keep the `TempDir` alive for the test's duration
#[allow(dead_code)]
pub fn temp_store() -> (TempDir, Connection) {
    let dir = tempfile::tempdir().unwrap();
    let conn = knowlex_store::db::open_store(dir.path().join("store.db")).unwrap();
    (dir, conn)
}

#[allow(dead_code)]
pub fn url(name: &str) -> String {
    format!("http://example.org/{}", name)
}

/// Active `spec` owning `rules`, both at 1.0.0
#[allow(dead_code)]
pub fn spec_and_rules() -> Vec<Artifact> {
    vec![
        Artifact::new("spec", url("spec"), ArtifactKind::Specification)
            .with_version("1.0.0")
            .with_status(Status::Active)
            .with_reference(Reference::owned_component(CanonicalRef::versioned(
                url("rules"),
                "1.0.0",
            ))),
        Artifact::new("rules", url("rules"), ArtifactKind::RuleSet)
            .with_version("1.0.0")
            .with_status(Status::Active),
    ]
}
