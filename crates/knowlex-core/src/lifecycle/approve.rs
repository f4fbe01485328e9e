//! Approve: stamp an approval date and record an assessment

#![allow(clippy::result_large_err)]

use chrono::{NaiveDate, Utc};

use crate::assessments::{self, AssessmentInput};
use crate::batch::{BatchBuilder, BatchType, TransactionBatch};
use crate::errors::{ExError, KnowlexError};
use crate::model::{AssessmentKind, CanonicalRef, Endorser};
use crate::repository::ArtifactRepository;
use crate::resolver::CanonicalResolver;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApproveRequest {
    pub id: String,
    /// Defaults to today
    pub approval_date: Option<NaiveDate>,
    /// No assessment is recorded without a kind
    pub assessment_kind: Option<AssessmentKind>,
    pub summary: Option<String>,
    /// Must designate the approved artifact; defaults to its canonical
    pub target: Option<CanonicalRef>,
    pub related_citation: Option<String>,
    pub author: Option<String>,
    pub endorser: Option<Endorser>,
}

/// Build the approval batch: the updated artifact, then the assessment
///
/// Allowed in any status.
///
/// # Errors
///
/// `NotFound` for an unknown id, `InvalidArgument` when the assessment
/// target names another artifact.
pub fn approve<R: ArtifactRepository + ?Sized>(
    repo: &R,
    request: &ApproveRequest,
) -> Result<TransactionBatch, ExError> {
    let mut artifact = CanonicalResolver::new(repo).read_required(&request.id)?;

    let target = match &request.target {
        Some(target) => {
            let version_matches = target.version.is_none() || target.version == artifact.version;
            if target.url != artifact.url || !version_matches {
                return Err(KnowlexError::AssessmentTargetMismatch {
                    target: target.key(),
                    artifact: artifact.canonical().key(),
                }
                .into());
            }
            target.clone()
        }
        None => artifact.canonical(),
    };

    let now = Utc::now();
    artifact.approval_date = Some(request.approval_date.unwrap_or_else(|| now.date_naive()));
    artifact.date = Some(now);
    if let Some(endorser) = &request.endorser {
        artifact.upsert_endorser(endorser.clone());
    }

    let mut builder = BatchBuilder::new().update(artifact);
    if let Some(kind) = request.assessment_kind {
        let (assessment, method) = assessments::record(
            repo,
            kind,
            &target,
            AssessmentInput {
                summary: request.summary.clone(),
                author: request.author.clone(),
                related_citation: request.related_citation.clone(),
            },
        )?;
        builder = builder.assessment(assessment, method);
    }
    Ok(builder.build(BatchType::Transaction))
}
