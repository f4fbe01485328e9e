//! Artifact store interface and the in-memory implementation
//!
//! Lifecycle operations only read through this trait; all writes go through
//! `commit_batch`, which must apply every entry or none.

#![allow(clippy::result_large_err)]

use std::collections::BTreeMap;

use chrono::Utc;
use uuid::Uuid;

use crate::batch::{
    is_placeholder, parse_idempotency_key, BatchResource, BatchType, EntryRequest,
    TransactionBatch, WriteMethod,
};
use crate::errors::{ExError, ExErrorKind, KnowlexError};
use crate::model::{Artifact, ArtifactMeta, Assessment, CanonicalRef, ContextValue, Status};

/// What happened to one committed entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryOutcome {
    Created,
    Updated,
    /// Conditional create matched an existing artifact
    Unchanged,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct CommittedEntry {
    pub id: String,
    pub outcome: EntryOutcome,
}

/// Result of an atomic batch commit
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct BatchReceipt {
    pub entries: Vec<CommittedEntry>,
    /// Placeholder id -> assigned id
    pub id_map: BTreeMap<String, String>,
}

impl BatchReceipt {
    pub fn created(&self) -> usize {
        self.count(EntryOutcome::Created)
    }

    pub fn updated(&self) -> usize {
        self.count(EntryOutcome::Updated)
    }

    pub fn unchanged(&self) -> usize {
        self.count(EntryOutcome::Unchanged)
    }

    fn count(&self, outcome: EntryOutcome) -> usize {
        self.entries.iter().filter(|e| e.outcome == outcome).count()
    }

    /// Real id for a placeholder, or the id itself
    pub fn resolve<'a>(&'a self, id: &'a str) -> &'a str {
        self.id_map.get(id).map(String::as_str).unwrap_or(id)
    }
}

/// Collaborator store consumed by the lifecycle engine
///
/// `(url, version)` is unique across stored artifacts; implementations
/// report a violation as `ExErrorKind::Conflict`.
pub trait ArtifactRepository {
    /// Read by store id
    ///
    /// # Errors
    ///
    /// Store failures only; a missing id is `Ok(None)`.
    fn read(&self, id: &str) -> Result<Option<Artifact>, ExError>;

    /// All artifacts with `url`, optionally restricted to one version
    ///
    /// # Errors
    ///
    /// Store failures.
    fn search_by_url(&self, url: &str, version: Option<&str>) -> Result<Vec<Artifact>, ExError>;

    /// All artifacts with `url` and `status`
    ///
    /// # Errors
    ///
    /// Store failures.
    fn search_by_url_and_status(&self, url: &str, status: Status)
        -> Result<Vec<Artifact>, ExError>;

    /// Store a new artifact, assigning an id when it has none or a placeholder
    ///
    /// # Errors
    ///
    /// `Conflict` when `(url, version)` is taken.
    fn create(&mut self, artifact: Artifact) -> Result<Artifact, ExError>;

    /// Overwrite an existing artifact
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown id, `Conflict` when `(url, version)` is taken.
    fn update(&mut self, artifact: Artifact) -> Result<Artifact, ExError>;

    /// Assessments targeting exactly this canonical
    ///
    /// # Errors
    ///
    /// Store failures.
    fn search_assessments_for_target(
        &self,
        target: &CanonicalRef,
    ) -> Result<Vec<Assessment>, ExError>;

    /// Apply a transaction batch atomically
    ///
    /// # Errors
    ///
    /// Any entry failure; nothing is written in that case.
    fn commit_batch(&mut self, batch: &TransactionBatch) -> Result<BatchReceipt, ExError>;
}

/// Replace placeholder ids with fresh UUIDv7s throughout a batch
///
/// Rewrites entry ids, `full_url`s, request urls and usage-context
/// references that point at placeholders.
pub fn assign_batch_ids(batch: &TransactionBatch) -> (TransactionBatch, BTreeMap<String, String>) {
    let mut id_map = BTreeMap::new();
    for entry in &batch.entries {
        for id in [entry.full_url.as_str(), entry.resource.id()] {
            if is_placeholder(id) && !id_map.contains_key(id) {
                id_map.insert(id.to_string(), Uuid::now_v7().to_string());
            }
        }
    }

    let swap = |id: &str| id_map.get(id).cloned().unwrap_or_else(|| id.to_string());

    let mut out = batch.clone();
    for entry in &mut out.entries {
        entry.full_url = swap(&entry.full_url);
        match &mut entry.resource {
            BatchResource::Artifact(a) => {
                a.id = swap(&a.id);
                for uc in &mut a.usage_contexts {
                    if let ContextValue::Reference(id) = &mut uc.value {
                        *id = swap(id);
                    }
                }
            }
            BatchResource::Assessment(a) => a.id = swap(&a.id),
        }
        if let Some(request) = &mut entry.request {
            for (placeholder, real) in &id_map {
                if request.url.contains(placeholder.as_str()) {
                    request.url = request.url.replace(placeholder.as_str(), real);
                }
            }
        }
    }
    (out, id_map)
}

/// Reject batches the store cannot apply
///
/// # Errors
///
/// `InvalidInput` for non-transaction batches or entries without a request.
pub fn ensure_committable(batch: &TransactionBatch) -> Result<(), ExError> {
    if batch.batch_type != BatchType::Transaction {
        return Err(ExError::new(ExErrorKind::InvalidInput)
            .with_op("commit_batch")
            .with_message(format!(
                "only transaction batches can be committed, got {:?}",
                batch.batch_type
            )));
    }
    if let Some(entry) = batch.entries.iter().find(|e| e.request.is_none()) {
        return Err(ExError::new(ExErrorKind::InvalidInput)
            .with_op("commit_batch")
            .with_artifact(entry.full_url.clone())
            .with_message("batch entry carries no request"));
    }
    Ok(())
}

/// Sort key for stable "creation order" listings
pub fn creation_order(a: &Artifact, b: &Artifact) -> std::cmp::Ordering {
    let created = |x: &Artifact| x.meta.as_ref().map(|m| m.created_at);
    created(a).cmp(&created(b)).then_with(|| a.id.cmp(&b.id))
}

/// In-memory repository
///
/// Single-threaded; `commit_batch` applies to a copy and swaps it in on
/// success.
#[derive(Debug, Clone, Default)]
pub struct MemoryRepository {
    artifacts: BTreeMap<String, Artifact>,
    assessments: BTreeMap<String, Assessment>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed artifacts, failing on the first conflict
    ///
    /// # Errors
    ///
    /// `Conflict` when two artifacts share `(url, version)`.
    pub fn with_artifacts(artifacts: impl IntoIterator<Item = Artifact>) -> Result<Self, ExError> {
        let mut repo = Self::new();
        for artifact in artifacts {
            repo.create(artifact)?;
        }
        Ok(repo)
    }

    pub fn artifact_count(&self) -> usize {
        self.artifacts.len()
    }

    pub fn assessment_count(&self) -> usize {
        self.assessments.len()
    }

    pub fn all_artifacts(&self) -> Vec<Artifact> {
        let mut all: Vec<_> = self.artifacts.values().cloned().collect();
        all.sort_by(creation_order);
        all
    }

    fn ensure_unique(&self, artifact: &Artifact) -> Result<(), ExError> {
        let clash = self.artifacts.values().any(|existing| {
            existing.id != artifact.id
                && existing.url == artifact.url
                && existing.version == artifact.version
        });
        if clash {
            return Err(KnowlexError::CanonicalConflict {
                canonical: artifact.canonical().key(),
            }
            .into());
        }
        Ok(())
    }

    fn put_assessment(&mut self, assessment: Assessment) -> EntryOutcome {
        match self.assessments.insert(assessment.id.clone(), assessment) {
            Some(_) => EntryOutcome::Updated,
            None => EntryOutcome::Created,
        }
    }

    fn apply_entry(
        &mut self,
        resource: &BatchResource,
        request: &EntryRequest,
    ) -> Result<CommittedEntry, ExError> {
        match resource {
            BatchResource::Artifact(artifact) => {
                if let Some((url, version)) =
                    request.if_none_exist.as_deref().and_then(parse_idempotency_key)
                {
                    if let Some(existing) =
                        self.search_by_url(&url, version.as_deref())?.into_iter().next()
                    {
                        return Ok(CommittedEntry {
                            id: existing.id,
                            outcome: EntryOutcome::Unchanged,
                        });
                    }
                }
                let exists = self.artifacts.contains_key(&artifact.id);
                match (request.method, exists) {
                    (WriteMethod::Put, true) => {
                        let stored = self.update(artifact.clone())?;
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
                        let stored = self.create(artifact.clone())?;
                        Ok(CommittedEntry {
                            id: stored.id,
                            outcome: EntryOutcome::Created,
                        })
                    }
                }
            }
            BatchResource::Assessment(assessment) => {
                let outcome = self.put_assessment(assessment.clone());
                Ok(CommittedEntry {
                    id: assessment.id.clone(),
                    outcome,
                })
            }
        }
    }
}

impl ArtifactRepository for MemoryRepository {
    fn read(&self, id: &str) -> Result<Option<Artifact>, ExError> {
        Ok(self.artifacts.get(id).cloned())
    }

    fn search_by_url(&self, url: &str, version: Option<&str>) -> Result<Vec<Artifact>, ExError> {
        let mut found: Vec<_> = self
            .artifacts
            .values()
            .filter(|a| a.url == url && version.map_or(true, |v| a.version.as_deref() == Some(v)))
            .cloned()
            .collect();
        found.sort_by(creation_order);
        Ok(found)
    }

    fn search_by_url_and_status(
        &self,
        url: &str,
        status: Status,
    ) -> Result<Vec<Artifact>, ExError> {
        Ok(self
            .search_by_url(url, None)?
            .into_iter()
            .filter(|a| a.status == status)
            .collect())
    }

    fn create(&mut self, mut artifact: Artifact) -> Result<Artifact, ExError> {
        if artifact.id.is_empty() || is_placeholder(&artifact.id) {
            artifact.id = Uuid::now_v7().to_string();
        }
        if self.artifacts.contains_key(&artifact.id) {
            return Err(ExError::new(ExErrorKind::Conflict)
                .with_op("create")
                .with_artifact(artifact.id.clone())
                .with_message("an artifact with this id already exists"));
        }
        self.ensure_unique(&artifact)?;

        let now = Utc::now();
        artifact.meta = Some(ArtifactMeta {
            created_at: now,
            updated_at: now,
        });
        self.artifacts.insert(artifact.id.clone(), artifact.clone());
        Ok(artifact)
    }

    fn update(&mut self, mut artifact: Artifact) -> Result<Artifact, ExError> {
        let created_at = match self.artifacts.get(&artifact.id) {
            Some(existing) => existing
                .meta
                .as_ref()
                .map(|m| m.created_at)
                .unwrap_or_else(Utc::now),
            None => {
                return Err(KnowlexError::ArtifactNotFound {
                    reference: artifact.id.clone(),
                }
                .into())
            }
        };
        self.ensure_unique(&artifact)?;

        artifact.meta = Some(ArtifactMeta {
            created_at,
            updated_at: Utc::now(),
        });
        self.artifacts.insert(artifact.id.clone(), artifact.clone());
        Ok(artifact)
    }

    fn search_assessments_for_target(
        &self,
        target: &CanonicalRef,
    ) -> Result<Vec<Assessment>, ExError> {
        Ok(self
            .assessments
            .values()
            .filter(|a| &a.target == target)
            .cloned()
            .collect())
    }

    fn commit_batch(&mut self, batch: &TransactionBatch) -> Result<BatchReceipt, ExError> {
        ensure_committable(batch)?;
        let (batch, id_map) = assign_batch_ids(batch);

        let mut working = self.clone();
        let mut entries = Vec::with_capacity(batch.entries.len());
        for entry in &batch.entries {
            let request = entry.request.as_ref().ok_or_else(|| {
                ExError::new(ExErrorKind::InvalidInput).with_op("commit_batch")
            })?;
            entries.push(working.apply_entry(&entry.resource, request)?);
        }

        *self = working;
        Ok(BatchReceipt { entries, id_map })
    }
}
