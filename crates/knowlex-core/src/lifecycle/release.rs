//! Release: promote a draft and its owned closure to active

#![allow(clippy::result_large_err)]

use std::collections::HashSet;
use std::str::FromStr;

use chrono::Utc;

use super::RetargetMap;
use crate::assessments;
use crate::batch::{BatchBuilder, BatchType, TransactionBatch, WriteMethod};
use crate::errors::{ExError, KnowlexError};
use crate::model::{Artifact, CanonicalRef, Reference, ReferenceKind, Status};
use crate::repository::ArtifactRepository;
use crate::resolver::CanonicalResolver;
use crate::traversal::{ClosureWalker, MissingTarget};
use crate::version::{select_release_version, validate_format, VersionBehavior};

/// What to do when a non-experimental root depends on experimental content
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExperimentalBehavior {
    #[default]
    None,
    Warn,
    Error,
}

impl FromStr for ExperimentalBehavior {
    type Err = KnowlexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(ExperimentalBehavior::None),
            "warn" => Ok(ExperimentalBehavior::Warn),
            "error" => Ok(ExperimentalBehavior::Error),
            other => Err(KnowlexError::UnknownParameterValue {
                parameter: "requireNonExperimental".to_string(),
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReleaseRequest {
    pub id: String,
    pub version: Option<String>,
    pub version_behavior: Option<VersionBehavior>,
    /// Terminology-server dependency resolution; unsupported
    pub latest_from_tx_server: bool,
    pub experimental_behavior: ExperimentalBehavior,
    pub release_label: Option<String>,
}

/// Build the update batch releasing `request.id`
///
/// Every draft in the owned closure becomes active under the selected
/// version. Component references are pinned to released versions, unpinned
/// dependencies to the latest active version. The root's dependency list
/// absorbs its own components and every reference of those components.
///
/// # Errors
///
/// `NotImplemented` for `latest_from_tx_server`, `InvalidArgument` for a
/// missing or malformed version or behavior, `NotFound` for the root or an
/// owned component, `PreconditionFailed` for a non-draft root, a missing or
/// stale approval, or a version already taken.
pub fn release<R: ArtifactRepository + ?Sized>(
    repo: &R,
    request: &ReleaseRequest,
) -> Result<TransactionBatch, ExError> {
    if request.latest_from_tx_server {
        return Err(KnowlexError::NotImplemented {
            feature: "latestFromTxServer".to_string(),
        }
        .into());
    }
    let requested = request
        .version
        .as_deref()
        .ok_or_else(|| KnowlexError::InvalidVersion {
            version: String::new(),
            reason: "version must be provided".to_string(),
        })?;
    validate_format(requested)?;
    let behavior = request
        .version_behavior
        .ok_or(KnowlexError::MissingVersionBehavior)?;

    let resolver = CanonicalResolver::new(repo);
    let root = resolver.read_required(&request.id)?;
    if !root.is_draft() {
        return Err(KnowlexError::NotDraft {
            artifact: root.id.clone(),
            status: root.status.to_string(),
        }
        .into());
    }
    ensure_approved(&root)?;

    let release_version =
        select_release_version(requested, Some(behavior), root.version.as_deref())?;
    let gate = if root.experimental {
        ExperimentalBehavior::None
    } else {
        request.experimental_behavior
    };
    let root_period = root.effective_period.clone().filter(|p| p.is_set());
    let root_canonical = root.canonical();
    let original_root_refs = root.references.clone();
    let now = Utc::now();

    let mut released = RetargetMap::default();
    let mut released_ids: HashSet<String> = HashSet::new();

    let closure = ClosureWalker::owned_only(repo)
        .on_missing(MissingTarget::Fail)
        .walk(root, |artifact| {
            if !artifact.is_draft() {
                return Ok(());
            }
            ensure_version_free(repo, artifact, &release_version)?;
            released.insert(
                artifact.canonical(),
                artifact.id.clone(),
                CanonicalRef::versioned(artifact.url.clone(), release_version.clone()),
            );
            released_ids.insert(artifact.id.clone());

            artifact.status = Status::Active;
            artifact.version = Some(release_version.clone());
            artifact.date = Some(now);
            if !artifact.has_effective_period() {
                if let Some(period) = &root_period {
                    artifact.effective_period = Some(period.clone());
                }
            }
            Ok(())
        })?;

    let mut artifacts = Vec::new();
    for artifact in closure {
        if released_ids.contains(&artifact.id) {
            artifacts.push(pin_references(&resolver, &released, artifact)?);
        }
    }

    if gate != ExperimentalBehavior::None {
        check_experimental(&resolver, &released, &artifacts, gate)?;
    }

    let promoted: Vec<Reference> = artifacts
        .iter()
        .enumerate()
        .flat_map(|(i, a)| {
            a.references
                .iter()
                .filter(move |r| i > 0 || r.kind == ReferenceKind::Component)
        })
        .filter(|r| r.target.url != root_canonical.url)
        .map(|r| Reference {
            kind: ReferenceKind::Dependency,
            owned: false,
            ..r.clone()
        })
        .collect();

    let new_root_canonical = match artifacts.first_mut() {
        Some(root) => {
            root.references.extend(promoted);
            root.references = dedup_references(&root.references, &original_root_refs);
            if request.release_label.is_some() {
                root.extensions.release_label = request.release_label.clone();
            }
            root.canonical()
        }
        None => {
            return Err(KnowlexError::Internal {
                message: "release closure is empty".to_string(),
            }
            .into())
        }
    };

    let moved = assessments::retarget(repo, &root_canonical, &new_root_canonical)?;

    let mut builder = BatchBuilder::new();
    for artifact in artifacts {
        builder = builder.update(artifact);
    }
    for assessment in moved {
        builder = builder.assessment(assessment, WriteMethod::Put);
    }
    Ok(builder.build(BatchType::Transaction))
}

fn ensure_approved(root: &Artifact) -> Result<(), ExError> {
    let approved = root
        .approval_date
        .ok_or_else(|| KnowlexError::MissingApprovalDate {
            artifact: root.id.clone(),
        })?;
    if let Some(modified) = root.date {
        if approved < modified.date_naive() {
            return Err(KnowlexError::ApprovalPredatesModification {
                artifact: root.id.clone(),
                approved: approved.to_string(),
                modified: modified.date_naive().to_string(),
            }
            .into());
        }
    }
    Ok(())
}

fn ensure_version_free<R: ArtifactRepository + ?Sized>(
    repo: &R,
    artifact: &Artifact,
    version: &str,
) -> Result<(), ExError> {
    let taken = repo
        .search_by_url(&artifact.url, Some(version))?
        .into_iter()
        .any(|existing| existing.id != artifact.id);
    if taken {
        return Err(KnowlexError::VersionAlreadyExists {
            url: artifact.url.clone(),
            version: version.to_string(),
        }
        .into());
    }
    Ok(())
}

fn pin_references<R: ArtifactRepository + ?Sized>(
    resolver: &CanonicalResolver<'_, R>,
    released: &RetargetMap,
    mut artifact: Artifact,
) -> Result<Artifact, ExError> {
    let mut pinned = Vec::with_capacity(artifact.references.len());
    for reference in &artifact.references {
        if let Some(rewritten) = released.rewrite(reference) {
            pinned.push(rewritten);
            continue;
        }
        if reference.target.is_pinned() {
            pinned.push(reference.clone());
            continue;
        }
        let resolved = match reference.kind {
            ReferenceKind::Component => resolver.resolve(&reference.target)?,
            ReferenceKind::Dependency => resolver.find_latest_active(&reference.target.url)?,
        };
        match resolved.and_then(|a| a.version) {
            Some(version) => pinned.push(reference.retargeted(reference.target.with_version(version))),
            None => {
                tracing::warn!(
                    artifact.url = %reference.target.url,
                    owner = %artifact.url,
                    "no active version to pin dependency to"
                );
                pinned.push(reference.clone());
            }
        }
    }
    artifact.references = pinned;
    Ok(artifact)
}

/// Deduplicate by `(target, kind)`, keeping first occurrence and any
/// priority carried by a duplicate or by the root's original reference
fn dedup_references(references: &[Reference], original: &[Reference]) -> Vec<Reference> {
    let mut out: Vec<Reference> = Vec::new();
    for reference in references {
        match out
            .iter_mut()
            .find(|r| r.target == reference.target && r.kind == reference.kind)
        {
            Some(existing) => {
                if existing.priority.is_none() {
                    existing.priority = reference.priority.clone();
                }
            }
            None => out.push(reference.clone()),
        }
    }
    for reference in &mut out {
        if reference.priority.is_some() {
            continue;
        }
        reference.priority = original
            .iter()
            .filter(|o| o.kind == reference.kind && o.target.url == reference.target.url)
            .find_map(|o| o.priority.clone());
    }
    out
}

fn check_experimental<R: ArtifactRepository + ?Sized>(
    resolver: &CanonicalResolver<'_, R>,
    released: &RetargetMap,
    artifacts: &[Artifact],
    gate: ExperimentalBehavior,
) -> Result<(), ExError> {
    let mut seen: HashSet<String> = HashSet::new();
    for artifact in artifacts.iter().skip(1) {
        flag_experimental(artifact, gate)?;
    }
    let mut pending: Vec<CanonicalRef> = artifacts
        .iter()
        .flat_map(|a| {
            a.references
                .iter()
                .filter(|r| released.lookup(&r.target).is_none() && !r.is_owned())
                .map(|r| r.target.clone())
                .chain(a.includes.iter().cloned())
        })
        .collect();

    while let Some(target) = pending.pop() {
        if !seen.insert(target.key()) {
            continue;
        }
        if let Some(found) = resolver.resolve(&target)? {
            flag_experimental(&found, gate)?;
            pending.extend(found.includes.iter().cloned());
        }
    }
    Ok(())
}

fn flag_experimental(artifact: &Artifact, gate: ExperimentalBehavior) -> Result<(), ExError> {
    if !artifact.experimental {
        return Ok(());
    }
    match gate {
        ExperimentalBehavior::None => Ok(()),
        ExperimentalBehavior::Warn => {
            tracing::warn!(
                artifact.url = %artifact.url,
                artifact.version = artifact.version.as_deref().unwrap_or(""),
                "non-experimental root references experimental artifact"
            );
            Ok(())
        }
        ExperimentalBehavior::Error => Err(KnowlexError::ExperimentalDependency {
            url: artifact.url.clone(),
        }
        .into()),
    }
}
