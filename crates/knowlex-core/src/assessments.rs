//! Assessment bookkeeping for release and approve

#![allow(clippy::result_large_err)]

use chrono::Utc;

use crate::batch::{new_placeholder, WriteMethod};
use crate::errors::ExError;
use crate::model::{Assessment, AssessmentEntry, AssessmentKind, CanonicalRef};
use crate::repository::ArtifactRepository;

/// Remark to record against an artifact
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AssessmentInput {
    pub summary: Option<String>,
    pub author: Option<String>,
    pub related_citation: Option<String>,
}

/// Assessments currently targeting `from`, moved onto `to`
///
/// The records keep their ids, so committing them as PUTs retargets rather
/// than duplicates.
///
/// # Errors
///
/// Store failures.
pub fn retarget<R: ArtifactRepository + ?Sized>(
    repo: &R,
    from: &CanonicalRef,
    to: &CanonicalRef,
) -> Result<Vec<Assessment>, ExError> {
    if from == to {
        return Ok(Vec::new());
    }
    Ok(repo
        .search_assessments_for_target(from)?
        .into_iter()
        .map(|mut a| {
            a.target = to.clone();
            a
        })
        .collect())
}

/// Record a remark of `kind` on `target`
///
/// A novel `(kind, target)` pair yields a new assessment (POST). For an
/// existing pair, comments gain an additional entry and other kinds have
/// their latest entry replaced; both are written back as a PUT.
///
/// # Errors
///
/// Store failures.
pub fn record<R: ArtifactRepository + ?Sized>(
    repo: &R,
    kind: AssessmentKind,
    target: &CanonicalRef,
    input: AssessmentInput,
) -> Result<(Assessment, WriteMethod), ExError> {
    let entry = AssessmentEntry {
        summary: input.summary,
        author: input.author,
        related_citation: input.related_citation,
        recorded_at: Utc::now(),
    };

    let existing = repo
        .search_assessments_for_target(target)?
        .into_iter()
        .find(|a| a.kind == kind);

    match existing {
        Some(mut assessment) => {
            if kind == AssessmentKind::Comment || assessment.entries.is_empty() {
                assessment.entries.push(entry);
            } else if let Some(last) = assessment.entries.last_mut() {
                *last = entry;
            }
            Ok((assessment, WriteMethod::Put))
        }
        None => {
            let mut assessment = Assessment::new(new_placeholder(), kind, target.clone());
            assessment.entries.push(entry);
            Ok((assessment, WriteMethod::Post))
        }
    }
}
