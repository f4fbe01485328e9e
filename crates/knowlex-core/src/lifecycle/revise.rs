//! Revise: overwrite a draft in place

#![allow(clippy::result_large_err)]

use chrono::Utc;

use crate::errors::{ExError, KnowlexError};
use crate::model::{Artifact, Status};
use crate::repository::ArtifactRepository;
use crate::resolver::CanonicalResolver;

/// Validate `proposed` against the stored draft and return the artifact to
/// write back
///
/// Status is immutable under revise; the modification date is refreshed.
///
/// # Errors
///
/// `NotFound` for an unknown id, `PreconditionFailed` when the stored
/// artifact is not a draft or the proposed status is not draft.
pub fn revise<R: ArtifactRepository + ?Sized>(
    repo: &R,
    proposed: Artifact,
) -> Result<Artifact, ExError> {
    let existing = CanonicalResolver::new(repo).read_required(&proposed.id)?;
    if existing.status != Status::Draft {
        return Err(KnowlexError::NotDraft {
            artifact: existing.id,
            status: existing.status.to_string(),
        }
        .into());
    }
    if proposed.status != Status::Draft {
        return Err(KnowlexError::StatusChangeNotAllowed {
            proposed: proposed.status.to_string(),
        }
        .into());
    }

    let mut revised = proposed;
    revised.date = Some(Utc::now());
    revised.meta = existing.meta;
    Ok(revised)
}
