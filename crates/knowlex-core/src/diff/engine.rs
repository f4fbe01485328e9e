//! Recursive diff over paired references.

#![allow(clippy::result_large_err)]

use std::collections::{HashMap, HashSet};

use crate::diff::model::ArtifactDiff;
use crate::diff::primitive::StructuralDiff;
use crate::errors::{ExError, KnowlexError};
use crate::model::{Artifact, Reference};
use crate::repository::ArtifactRepository;
use crate::resolver::CanonicalResolver;

type PairKey = (String, String);

/// Diff `source_id` against `target_id`, recursing into paired references
///
/// Component and dependency references of each side are sorted by target
/// canonical and paired by index up to the shorter list.
///
/// # Errors
///
/// `NotFound` when either root is missing, `InvalidArgument` when their
/// kinds differ, store or primitive failures.
pub fn artifact_diff<R, D>(
    repo: &R,
    differ: &D,
    source_id: &str,
    target_id: &str,
) -> Result<ArtifactDiff, ExError>
where
    R: ArtifactRepository + ?Sized,
    D: StructuralDiff + ?Sized,
{
    let resolver = CanonicalResolver::new(repo);
    let source = resolver.read_required(source_id)?;
    let target = resolver.read_required(target_id)?;
    if source.kind != target.kind {
        return Err(KnowlexError::KindMismatch {
            source_kind: source.kind.to_string(),
            target_kind: target.kind.to_string(),
        }
        .into());
    }

    let mut run = DiffRun {
        resolver,
        differ,
        memo: HashMap::new(),
        in_progress: HashSet::new(),
    };
    run.pair(&source, &target)
}

/// State for one top-level call
struct DiffRun<'a, R: ArtifactRepository + ?Sized, D: StructuralDiff + ?Sized> {
    resolver: CanonicalResolver<'a, R>,
    differ: &'a D,
    memo: HashMap<PairKey, ArtifactDiff>,
    in_progress: HashSet<PairKey>,
}

impl<'a, R: ArtifactRepository + ?Sized, D: StructuralDiff + ?Sized> DiffRun<'a, R, D> {
    fn pair(&mut self, source: &Artifact, target: &Artifact) -> Result<ArtifactDiff, ExError> {
        let key = (source.canonical().key(), target.canonical().key());
        if let Some(done) = self.memo.get(&key) {
            return Ok(done.clone());
        }
        self.in_progress.insert(key.clone());

        let mut node = ArtifactDiff {
            source: source.canonical(),
            target: target.canonical(),
            kind: target.kind,
            operations: self.differ.diff(source, target)?,
            children: Default::default(),
        };

        let source_refs = sorted_refs(source);
        let target_refs = sorted_refs(target);
        for (s_ref, t_ref) in source_refs.iter().zip(target_refs.iter()) {
            let url = s_ref.target.url.clone();
            if node.child(&url).is_some() {
                continue;
            }
            let (Some(child_source), Some(child_target)) = (
                self.resolve_branch(s_ref)?,
                self.resolve_branch(t_ref)?,
            ) else {
                continue;
            };
            let child_key = (
                child_source.canonical().key(),
                child_target.canonical().key(),
            );
            if self.in_progress.contains(&child_key) {
                continue;
            }
            let child = self.pair(&child_source, &child_target)?;
            node.children.push(child);
        }

        self.in_progress.remove(&key);
        self.memo.insert(key, node.clone());
        Ok(node)
    }

    fn resolve_branch(&self, reference: &Reference) -> Result<Option<Artifact>, ExError> {
        let found = self.resolver.resolve(&reference.target)?;
        if found.is_none() {
            tracing::warn!(
                artifact.url = %reference.target.url,
                artifact.version = reference.target.version.as_deref().unwrap_or(""),
                "referenced artifact not found, omitting diff branch"
            );
        }
        Ok(found)
    }
}

fn sorted_refs(artifact: &Artifact) -> Vec<&Reference> {
    let mut refs: Vec<&Reference> = artifact
        .components()
        .chain(artifact.dependencies())
        .collect();
    refs.sort_by(|a, b| a.target.key().cmp(&b.target.key()));
    refs
}
