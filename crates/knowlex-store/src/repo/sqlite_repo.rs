//! SQLite repository implementation
//!
//! Artifacts and assessments are stored as JSON bodies next to the columns
//! that lookups filter on. `SqliteRepo` holds the row-level statements and
//! works on any `&Connection`, including an open transaction;
//! `SqliteArtifactRepository` implements the lifecycle store interface on
//! top of it.

#![allow(clippy::result_large_err)]

use crate::errors::{from_rusqlite, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use knowlex_core::batch::{
    is_placeholder, parse_idempotency_key, BatchResource, EntryRequest, WriteMethod,
};
use knowlex_core::errors::{ExError, ExErrorKind, KnowlexError};
use knowlex_core::model::{Artifact, ArtifactMeta, Assessment, CanonicalRef, Status};
use knowlex_core::repository::{
    assign_batch_ids, ensure_committable, ArtifactRepository, BatchReceipt, CommittedEntry,
    EntryOutcome,
};
use knowlex_core::TransactionBatch;
use rusqlite::{Connection, OptionalExtension};
use uuid::Uuid;

fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn decode_artifact(body: String) -> Result<Artifact> {
    Ok(serde_json::from_str(&body)?)
}

fn decode_assessment(body: String) -> Result<Assessment> {
    Ok(serde_json::from_str(&body)?)
}

/// Tag a uniqueness violation with the canonical it concerns
fn canonical_conflict(err: ExError, artifact: &Artifact) -> ExError {
    if err.kind() == ExErrorKind::Conflict {
        ExError::from(KnowlexError::CanonicalConflict {
            canonical: artifact.canonical().key(),
        })
        .with_source(err)
    } else {
        err
    }
}

/// Row-level statements
pub struct SqliteRepo;

impl SqliteRepo {
    pub fn read_artifact(conn: &Connection, id: &str) -> Result<Option<Artifact>> {
        let body: Option<String> = conn
            .query_row("SELECT body FROM artifacts WHERE id = ?1", [id], |row| {
                row.get(0)
            })
            .optional()
            .map_err(from_rusqlite)?;
        body.map(decode_artifact).transpose()
    }

    /// Artifacts with `url` (and `version` when given), oldest first
    pub fn search_artifacts(
        conn: &Connection,
        url: &str,
        version: Option<&str>,
        status: Option<Status>,
    ) -> Result<Vec<Artifact>> {
        let mut stmt = conn
            .prepare(
                "SELECT body FROM artifacts
                 WHERE url = ?1
                   AND (?2 IS NULL OR version = ?2)
                   AND (?3 IS NULL OR status = ?3)
                 ORDER BY created_at, id",
            )
            .map_err(from_rusqlite)?;
        let bodies = stmt
            .query_map(
                rusqlite::params![url, version, status.map(|s| s.as_str())],
                |row| row.get::<_, String>(0),
            )
            .map_err(from_rusqlite)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(from_rusqlite)?;
        bodies.into_iter().map(decode_artifact).collect()
    }

    /// Insert a new artifact, assigning an id and bookkeeping timestamps
    pub fn insert_artifact(conn: &Connection, mut artifact: Artifact) -> Result<Artifact> {
        if artifact.id.is_empty() || is_placeholder(&artifact.id) {
            artifact.id = Uuid::now_v7().to_string();
        }
        let now = Utc::now();
        artifact.meta = Some(ArtifactMeta {
            created_at: now,
            updated_at: now,
        });

        conn.execute(
            "INSERT INTO artifacts (id, url, version, status, kind, body, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
            rusqlite::params![
                artifact.id,
                artifact.url,
                artifact.version,
                artifact.status.as_str(),
                artifact.kind.as_str(),
                serde_json::to_string(&artifact)?,
                timestamp(now),
            ],
        )
        .map_err(|e| canonical_conflict(from_rusqlite(e), &artifact))?;

        Ok(artifact)
    }

    /// Overwrite an existing artifact, keeping its creation time
    pub fn update_artifact(conn: &Connection, mut artifact: Artifact) -> Result<Artifact> {
        let existing = Self::read_artifact(conn, &artifact.id)?.ok_or_else(|| {
            ExError::from(KnowlexError::ArtifactNotFound {
                reference: artifact.id.clone(),
            })
        })?;
        let now = Utc::now();
        artifact.meta = Some(ArtifactMeta {
            created_at: existing.meta.map(|m| m.created_at).unwrap_or(now),
            updated_at: now,
        });

        conn.execute(
            "UPDATE artifacts
             SET url = ?2, version = ?3, status = ?4, kind = ?5, body = ?6, updated_at = ?7
             WHERE id = ?1",
            rusqlite::params![
                artifact.id,
                artifact.url,
                artifact.version,
                artifact.status.as_str(),
                artifact.kind.as_str(),
                serde_json::to_string(&artifact)?,
                timestamp(now),
            ],
        )
        .map_err(|e| canonical_conflict(from_rusqlite(e), &artifact))?;

        Ok(artifact)
    }

    pub fn assessments_for_target(
        conn: &Connection,
        target: &CanonicalRef,
    ) -> Result<Vec<Assessment>> {
        let mut stmt = conn
            .prepare("SELECT body FROM assessments WHERE target = ?1 ORDER BY id")
            .map_err(from_rusqlite)?;
        let bodies = stmt
            .query_map([target.key()], |row| row.get::<_, String>(0))
            .map_err(from_rusqlite)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(from_rusqlite)?;
        bodies.into_iter().map(decode_assessment).collect()
    }

    /// Insert or replace an assessment by id
    pub fn upsert_assessment(conn: &Connection, assessment: &Assessment) -> Result<EntryOutcome> {
        let exists: bool = conn
            .query_row(
                "SELECT 1 FROM assessments WHERE id = ?1",
                [&assessment.id],
                |_| Ok(true),
            )
            .optional()
            .map_err(from_rusqlite)?
            .unwrap_or(false);

        conn.execute(
            "INSERT INTO assessments (id, kind, target, body, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(id) DO UPDATE SET
                kind = excluded.kind,
                target = excluded.target,
                body = excluded.body,
                updated_at = excluded.updated_at",
            rusqlite::params![
                assessment.id,
                assessment.kind.as_str(),
                assessment.target.key(),
                serde_json::to_string(assessment)?,
                timestamp(Utc::now()),
            ],
        )
        .map_err(from_rusqlite)?;

        Ok(if exists {
            EntryOutcome::Updated
        } else {
            EntryOutcome::Created
        })
    }

    pub fn count_artifacts(conn: &Connection) -> Result<usize> {
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM artifacts", [], |row| row.get(0))
            .map_err(from_rusqlite)?;
        Ok(count as usize)
    }

    /// Apply one batch entry
    pub fn apply_entry(
        conn: &Connection,
        resource: &BatchResource,
        request: &EntryRequest,
    ) -> Result<CommittedEntry> {
        let artifact = match resource {
            BatchResource::Assessment(assessment) => {
                let outcome = Self::upsert_assessment(conn, assessment)?;
                return Ok(CommittedEntry {
                    id: assessment.id.clone(),
                    outcome,
                });
            }
            BatchResource::Artifact(artifact) => artifact,
        };

        let condition = request
            .if_none_exist
            .as_deref()
            .and_then(parse_idempotency_key);
        if let Some((url, version)) = condition {
            if let Some(existing) = Self::search_artifacts(conn, &url, version.as_deref(), None)?
                .into_iter()
                .next()
            {
                return Ok(CommittedEntry {
                    id: existing.id,
                    outcome: EntryOutcome::Unchanged,
                });
            }
        }

        let exists = Self::read_artifact(conn, &artifact.id)?.is_some();
        match (request.method, exists) {
            (WriteMethod::Put, true) => {
                let stored = Self::update_artifact(conn, artifact.clone())?;
                Ok(CommittedEntry {
                    id: stored.id,
                    outcome: EntryOutcome::Updated,
                })
            }
            (WriteMethod::Post, true) => Err(ExError::new(ExErrorKind::Conflict)
                .with_op("commit_batch")
                .with_artifact(artifact.id.clone())
                .with_message("an artifact with this id already exists")),
            (_, false) => {
                let stored = Self::insert_artifact(conn, artifact.clone())?;
                Ok(CommittedEntry {
                    id: stored.id,
                    outcome: EntryOutcome::Created,
                })
            }
        }
    }
}

/// `ArtifactRepository` over a borrowed SQLite connection
///
/// The connection must already be migrated (see [`crate::db::open_store`]).
pub struct SqliteArtifactRepository<'c> {
    conn: &'c mut Connection,
}

impl<'c> SqliteArtifactRepository<'c> {
    pub fn new(conn: &'c mut Connection) -> Self {
        Self { conn }
    }

    pub fn connection(&self) -> &Connection {
        self.conn
    }

    pub fn artifact_count(&self) -> Result<usize> {
        SqliteRepo::count_artifacts(self.conn)
    }
}

impl ArtifactRepository for SqliteArtifactRepository<'_> {
    fn read(&self, id: &str) -> Result<Option<Artifact>> {
        SqliteRepo::read_artifact(self.conn, id)
    }

    fn search_by_url(&self, url: &str, version: Option<&str>) -> Result<Vec<Artifact>> {
        SqliteRepo::search_artifacts(self.conn, url, version, None)
    }

    fn search_by_url_and_status(&self, url: &str, status: Status) -> Result<Vec<Artifact>> {
        SqliteRepo::search_artifacts(self.conn, url, None, Some(status))
    }

    fn create(&mut self, artifact: Artifact) -> Result<Artifact> {
        SqliteRepo::insert_artifact(self.conn, artifact)
    }

    fn update(&mut self, artifact: Artifact) -> Result<Artifact> {
        SqliteRepo::update_artifact(self.conn, artifact)
    }

    fn search_assessments_for_target(&self, target: &CanonicalRef) -> Result<Vec<Assessment>> {
        SqliteRepo::assessments_for_target(self.conn, target)
    }

    /// All entries run in one SQLite transaction; any failure rolls back
    fn commit_batch(&mut self, batch: &TransactionBatch) -> Result<BatchReceipt> {
        ensure_committable(batch)?;
        let (batch, id_map) = assign_batch_ids(batch);

        let tx = self.conn.transaction().map_err(from_rusqlite)?;
        let mut entries = Vec::with_capacity(batch.entries.len());
        for entry in &batch.entries {
            let request = entry.request.as_ref().ok_or_else(|| {
                ExError::new(ExErrorKind::InvalidInput).with_op("commit_batch")
            })?;
            entries.push(SqliteRepo::apply_entry(&tx, &entry.resource, request)?);
        }
        tx.commit().map_err(from_rusqlite)?;

        tracing::debug!(batch_len = entries.len(), "committed batch");
        Ok(BatchReceipt { entries, id_map })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_store_in_memory;
    use knowlex_core::model::ArtifactKind;

    fn list(id: &str, version: &str) -> Artifact {
        Artifact::new(id, "http://example.org/list", ArtifactKind::CodeList)
            .with_version(version)
            .with_status(Status::Active)
    }

    #[test]
    fn test_insert_and_read_round() {
        let conn = open_store_in_memory().unwrap();
        let stored = SqliteRepo::insert_artifact(&conn, list("a", "1.0.0")).unwrap();
        assert!(stored.meta.is_some());

        let read = SqliteRepo::read_artifact(&conn, "a").unwrap().unwrap();
        assert_eq!(read, stored);
    }

    #[test]
    fn test_unique_index_rejects_same_canonical() {
        let conn = open_store_in_memory().unwrap();
        SqliteRepo::insert_artifact(&conn, list("a", "1.0.0")).unwrap();
        let err = SqliteRepo::insert_artifact(&conn, list("b", "1.0.0")).unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::Conflict);
        assert_eq!(err.artifact(), Some("http://example.org/list|1.0.0"));
    }

    #[test]
    fn test_unversioned_artifacts_share_one_slot() {
        let conn = open_store_in_memory().unwrap();
        let unversioned = |id: &str| Artifact::new(id, "http://example.org/x", ArtifactKind::Library);
        SqliteRepo::insert_artifact(&conn, unversioned("a")).unwrap();
        let err = SqliteRepo::insert_artifact(&conn, unversioned("b")).unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::Conflict);
    }

    #[test]
    fn test_search_filters_version_and_status() {
        let conn = open_store_in_memory().unwrap();
        SqliteRepo::insert_artifact(&conn, list("a", "1.0.0")).unwrap();
        SqliteRepo::insert_artifact(&conn, list("b", "2.0.0").with_status(Status::Draft)).unwrap();

        let url = "http://example.org/list";
        assert_eq!(SqliteRepo::search_artifacts(&conn, url, None, None).unwrap().len(), 2);
        let pinned = SqliteRepo::search_artifacts(&conn, url, Some("2.0.0"), None).unwrap();
        assert_eq!(pinned[0].id, "b");
        let active = SqliteRepo::search_artifacts(&conn, url, None, Some(Status::Active)).unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, "a");
    }

    #[test]
    fn test_update_keeps_created_at() {
        let conn = open_store_in_memory().unwrap();
        let stored = SqliteRepo::insert_artifact(&conn, list("a", "1.0.0")).unwrap();
        let mut changed = stored.clone();
        changed.title = Some("Renamed".to_string());
        let updated = SqliteRepo::update_artifact(&conn, changed).unwrap();
        assert_eq!(
            updated.meta.as_ref().map(|m| m.created_at),
            stored.meta.as_ref().map(|m| m.created_at)
        );
    }

    #[test]
    fn test_update_unknown_is_not_found() {
        let conn = open_store_in_memory().unwrap();
        let err = SqliteRepo::update_artifact(&conn, list("ghost", "1.0.0")).unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::NotFound);
    }
}
