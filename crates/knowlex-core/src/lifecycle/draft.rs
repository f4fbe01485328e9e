//! Draft: copy an active artifact and its owned closure to `<version>-draft`

#![allow(clippy::result_large_err)]

use std::collections::BTreeMap;

use chrono::Utc;

use super::RetargetMap;
use crate::batch::{new_placeholder, BatchBuilder, BatchType, TransactionBatch};
use crate::errors::{ExError, KnowlexError};
use crate::model::{CanonicalRef, ContextValue, Status};
use crate::repository::ArtifactRepository;
use crate::resolver::CanonicalResolver;
use crate::traversal::{ClosureWalker, Step};
use crate::version::{draft_version, validate_format};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftRequest {
    /// Store id of the active root
    pub id: String,
    /// `MAJOR.MINOR.PATCH[.REVISION]`; stored as `<version>-draft`
    pub version: String,
}

/// Build the creation batch for a new draft of `request.id`
///
/// Owned components that already have a draft at the same version are
/// adopted: references point at the existing draft, no copy is made and the
/// walk does not descend below it.
///
/// # Errors
///
/// `InvalidArgument` for a malformed version, `NotFound` for an unknown
/// root, `PreconditionFailed` when the root is not active or a draft at the
/// requested version already exists.
pub fn draft<R: ArtifactRepository + ?Sized>(
    repo: &R,
    request: &DraftRequest,
) -> Result<TransactionBatch, ExError> {
    validate_format(&request.version)?;

    let resolver = CanonicalResolver::new(repo);
    let root = resolver.read_required(&request.id)?;
    if root.status != Status::Active {
        return Err(KnowlexError::NotActive {
            artifact: root.id.clone(),
            status: root.status.to_string(),
        }
        .into());
    }

    let new_version = draft_version(&request.version);
    if !repo.search_by_url(&root.url, Some(&new_version))?.is_empty() {
        return Err(KnowlexError::DraftAlreadyExists {
            url: root.url.clone(),
            version: new_version,
        }
        .into());
    }

    let root_id = root.id.clone();
    let mut targets = RetargetMap::default();
    let mut new_ids: BTreeMap<String, String> = BTreeMap::new();
    let mut to_copy: Vec<String> = Vec::new();

    let closure = ClosureWalker::owned_only(repo).walk_with(root, |artifact| {
        let adopted = if artifact.id == root_id {
            None
        } else {
            repo.search_by_url(&artifact.url, Some(&new_version))?
                .into_iter()
                .next()
        };
        let (new_id, new_canonical, step) = match adopted {
            Some(existing) => {
                tracing::debug!(
                    artifact.url = %artifact.url,
                    artifact.version = %new_version,
                    "adopting existing draft"
                );
                (existing.id.clone(), existing.canonical(), Step::Prune)
            }
            None => {
                to_copy.push(artifact.id.clone());
                (
                    new_placeholder(),
                    CanonicalRef::versioned(artifact.url.clone(), new_version.clone()),
                    Step::Descend,
                )
            }
        };
        targets.insert(artifact.canonical(), artifact.id.clone(), new_canonical);
        new_ids.insert(artifact.id.clone(), new_id);
        Ok(step)
    })?;

    let now = Utc::now();
    let mut builder = BatchBuilder::new();
    for original in closure {
        if !to_copy.contains(&original.id) {
            continue;
        }
        let mut copy = original;
        copy.id = new_ids.get(&copy.id).cloned().unwrap_or_else(new_placeholder);
        copy.status = Status::Draft;
        copy.version = Some(new_version.clone());
        copy.approval_date = None;
        copy.extensions.clear_release_tags();
        copy.date = Some(now);
        copy.meta = None;
        copy.references = copy
            .references
            .iter()
            .map(|r| targets.rewrite(r).unwrap_or_else(|| r.clone()))
            .collect();
        for uc in &mut copy.usage_contexts {
            if let ContextValue::Reference(id) = &mut uc.value {
                if targets.contains_id(id) {
                    if let Some(new_id) = new_ids.get(id.as_str()) {
                        *id = new_id.clone();
                    }
                }
            }
        }
        builder = builder.create(copy);
    }

    Ok(builder.build(BatchType::Transaction))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::{is_placeholder, WriteMethod};
    use crate::errors::ExErrorKind;
    use crate::model::{Artifact, ArtifactKind, Reference, UsageContext};
    use crate::repository::MemoryRepository;

    fn active(id: &str, url: &str, kind: ArtifactKind) -> Artifact {
        Artifact::new(id, url, kind)
            .with_version("1.0.0")
            .with_status(Status::Active)
    }

    fn repo() -> MemoryRepository {
        let mut spec = active("spec", "http://example.org/spec", ArtifactKind::Specification)
            .with_reference(Reference::owned_component(CanonicalRef::versioned(
                "http://example.org/rules",
                "1.0.0",
            )))
            .with_reference(Reference::dependency(CanonicalRef::versioned(
                "http://example.org/external",
                "3.0.0",
            )));
        spec.approval_date = chrono::NaiveDate::from_ymd_opt(2024, 1, 1);
        spec.extensions.release_label = Some("R1".to_string());
        spec.usage_contexts
            .push(UsageContext::reference("focus", "rules"));

        let rules = active("rules", "http://example.org/rules", ArtifactKind::RuleSet)
            .with_reference(Reference::owned_component(CanonicalRef::versioned(
                "http://example.org/spec",
                "1.0.0",
            )));
        MemoryRepository::with_artifacts([spec, rules]).unwrap()
    }

    fn request(version: &str) -> DraftRequest {
        DraftRequest {
            id: "spec".to_string(),
            version: version.to_string(),
        }
    }

    #[test]
    fn test_draft_copies_owned_closure() {
        let repo = repo();
        let batch = draft(&repo, &request("1.1.0")).unwrap();

        assert_eq!(batch.batch_type, BatchType::Transaction);
        assert_eq!(batch.len(), 2);
        for entry in &batch.entries {
            assert!(is_placeholder(&entry.full_url));
            assert_eq!(entry.request.as_ref().unwrap().method, WriteMethod::Post);
        }

        let copies: Vec<_> = batch.artifacts().collect();
        assert!(copies.iter().all(|a| a.status == Status::Draft));
        assert!(copies
            .iter()
            .all(|a| a.version.as_deref() == Some("1.1.0-draft")));

        let spec = copies[0];
        assert!(spec.approval_date.is_none());
        assert!(spec.extensions.release_label.is_none());
        assert_eq!(
            spec.references[0].target,
            CanonicalRef::versioned("http://example.org/rules", "1.1.0-draft")
        );
        // outside the drafted set
        assert_eq!(
            spec.references[1].target,
            CanonicalRef::versioned("http://example.org/external", "3.0.0")
        );
        // back-reference inside the set is rewritten too
        assert_eq!(
            copies[1].references[0].target,
            CanonicalRef::versioned("http://example.org/spec", "1.1.0-draft")
        );
        assert_eq!(
            spec.usage_contexts[0].value,
            ContextValue::Reference(copies[1].id.clone())
        );
    }

    #[test]
    fn test_draft_twice_is_precondition_failed() {
        let mut repo = repo();
        let batch = draft(&repo, &request("1.1.0")).unwrap();
        repo.commit_batch(&batch).unwrap();

        let err = draft(&repo, &request("1.1.0")).unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::PreconditionFailed);
    }

    #[test]
    fn test_draft_requires_active_root() {
        let mut repo = repo();
        let batch = draft(&repo, &request("1.1.0")).unwrap();
        let receipt = repo.commit_batch(&batch).unwrap();
        let new_root = receipt.entries[0].id.clone();

        let err = draft(
            &repo,
            &DraftRequest {
                id: new_root,
                version: "1.2.0".to_string(),
            },
        )
        .unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::PreconditionFailed);
    }

    #[test]
    fn test_draft_rejects_bad_version_before_reading() {
        let repo = MemoryRepository::new();
        let err = draft(&repo, &request("1.1")).unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::InvalidArgument);
    }

    #[test]
    fn test_existing_component_draft_is_adopted() {
        let mut repo = repo();
        repo.create(
            Artifact::new("rules-draft", "http://example.org/rules", ArtifactKind::RuleSet)
                .with_version("1.1.0-draft"),
        )
        .unwrap();

        let batch = draft(&repo, &request("1.1.0")).unwrap();
        assert_eq!(batch.len(), 1);
        let spec = batch.artifacts().next().unwrap();
        assert_eq!(
            spec.references[0].target,
            CanonicalRef::versioned("http://example.org/rules", "1.1.0-draft")
        );
        assert_eq!(
            spec.usage_contexts[0].value,
            ContextValue::Reference("rules-draft".to_string())
        );
    }

    #[test]
    fn test_adopted_draft_children_are_not_copied() {
        let spec = active("spec", "http://example.org/spec", ArtifactKind::Specification)
            .with_reference(Reference::owned_component(CanonicalRef::versioned(
                "http://example.org/rules",
                "1.0.0",
            )));
        let rules = active("rules", "http://example.org/rules", ArtifactKind::RuleSet)
            .with_reference(Reference::owned_component(CanonicalRef::versioned(
                "http://example.org/helper",
                "1.0.0",
            )));
        let helper = active("helper", "http://example.org/helper", ArtifactKind::Library);
        let mut repo = MemoryRepository::with_artifacts([spec, rules, helper]).unwrap();
        repo.create(
            Artifact::new("rules-draft", "http://example.org/rules", ArtifactKind::RuleSet)
                .with_version("1.1.0-draft"),
        )
        .unwrap();

        let batch = draft(&repo, &request("1.1.0")).unwrap();
        let urls: Vec<&str> = batch.artifacts().map(|a| a.url.as_str()).collect();
        assert_eq!(urls, vec!["http://example.org/spec"]);
    }
}
