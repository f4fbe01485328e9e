//! Canonical reference resolution

#![allow(clippy::result_large_err)]

use std::cmp::Ordering;

use crate::errors::{ExError, KnowlexError};
use crate::model::{Artifact, CanonicalRef, Status};
use crate::repository::{creation_order, ArtifactRepository};
use crate::version::compare_optional_versions;

/// Order candidates for "latest"
///
/// Highest dotted-numeric version wins; versions whose segments compare
/// equal fall back to string order, and identical rankings fall back to
/// creation order (later created wins).
pub fn latest_order(a: &Artifact, b: &Artifact) -> Ordering {
    compare_optional_versions(a.version.as_deref(), b.version.as_deref())
        .then_with(|| creation_order(a, b))
}

/// Pick the latest candidate
pub fn select_latest(candidates: Vec<Artifact>) -> Option<Artifact> {
    candidates.into_iter().max_by(latest_order)
}

/// Resolves canonicals against a repository
pub struct CanonicalResolver<'r, R: ArtifactRepository + ?Sized> {
    repo: &'r R,
}

impl<'r, R: ArtifactRepository + ?Sized> CanonicalResolver<'r, R> {
    pub fn new(repo: &'r R) -> Self {
        Self { repo }
    }

    pub fn repository(&self) -> &'r R {
        self.repo
    }

    /// Resolve to zero or one artifact; unversioned picks the latest
    ///
    /// # Errors
    ///
    /// Store failures.
    pub fn resolve(&self, canonical: &CanonicalRef) -> Result<Option<Artifact>, ExError> {
        let matches = self
            .repo
            .search_by_url(&canonical.url, canonical.version.as_deref())?;
        Ok(select_latest(matches))
    }

    /// # Errors
    ///
    /// `NotFound` when nothing matches.
    pub fn resolve_required(&self, canonical: &CanonicalRef) -> Result<Artifact, ExError> {
        self.resolve(canonical)?.ok_or_else(|| {
            KnowlexError::ArtifactNotFound {
                reference: canonical.key(),
            }
            .into()
        })
    }

    /// # Errors
    ///
    /// `NotFound` for an unknown id.
    pub fn read_required(&self, id: &str) -> Result<Artifact, ExError> {
        self.repo.read(id)?.ok_or_else(|| {
            KnowlexError::ArtifactNotFound {
                reference: id.to_string(),
            }
            .into()
        })
    }

    /// Latest artifact with `status = Active` for `url`
    ///
    /// # Errors
    ///
    /// Store failures.
    pub fn find_latest_active(&self, url: &str) -> Result<Option<Artifact>, ExError> {
        let active = self.repo.search_by_url_and_status(url, Status::Active)?;
        if active.len() > 1 {
            tracing::debug!(
                artifact.url = url,
                candidates = active.len(),
                "selecting latest active version"
            );
        }
        Ok(select_latest(active))
    }
}
