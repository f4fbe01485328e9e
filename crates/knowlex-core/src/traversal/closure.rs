//! Reference closure walk
//!
//! Depth-first, preorder, over an explicit stack. The visited set is keyed
//! by canonical string and seeded with the root, so cyclic graphs terminate
//! and every `(url, version)` is visited at most once.

#![allow(clippy::result_large_err)]

use std::collections::HashSet;

use crate::errors::{ExError, KnowlexError};
use crate::model::{Artifact, CanonicalRef, Reference};
use crate::repository::ArtifactRepository;
use crate::resolver::CanonicalResolver;

/// Which edges the walk follows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkScope {
    /// Owned component references only
    OwnedComponents,
    /// Every component and dependency reference
    Full,
}

/// What to do with a reference that resolves to nothing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingTarget {
    Skip,
    Fail,
}

/// Returned by a visitor to say whether the walk continues below a node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Descend,
    Prune,
}

pub struct ClosureWalker<'r, R: ArtifactRepository + ?Sized> {
    resolver: CanonicalResolver<'r, R>,
    scope: WalkScope,
    missing: MissingTarget,
}

impl<'r, R: ArtifactRepository + ?Sized> ClosureWalker<'r, R> {
    pub fn new(repo: &'r R, scope: WalkScope) -> Self {
        Self {
            resolver: CanonicalResolver::new(repo),
            scope,
            missing: MissingTarget::Skip,
        }
    }

    pub fn owned_only(repo: &'r R) -> Self {
        Self::new(repo, WalkScope::OwnedComponents)
    }

    pub fn full(repo: &'r R) -> Self {
        Self::new(repo, WalkScope::Full)
    }

    pub fn on_missing(mut self, missing: MissingTarget) -> Self {
        self.missing = missing;
        self
    }

    fn follows(&self, reference: &Reference) -> bool {
        match self.scope {
            WalkScope::OwnedComponents => reference.is_owned(),
            WalkScope::Full => true,
        }
    }

    /// Walk from `root`, calling `visit` once per artifact in visit order
    ///
    /// Edges are enumerated from each artifact as stored, before `visit`
    /// runs, so the callback may rewrite references freely. Returns the
    /// visited artifacts (as left by `visit`) in order.
    ///
    /// # Errors
    ///
    /// Store failures, `NotFound` for missing targets under
    /// `MissingTarget::Fail`, or anything `visit` returns.
    pub fn walk<F>(&self, root: Artifact, mut visit: F) -> Result<Vec<Artifact>, ExError>
    where
        F: FnMut(&mut Artifact) -> Result<(), ExError>,
    {
        self.walk_with(root, |artifact| visit(artifact).map(|()| Step::Descend))
    }

    /// Like [`walk`](Self::walk), but `visit` decides whether the edges of
    /// each artifact are followed
    ///
    /// Targets of a pruned artifact stay unclaimed and can still be reached
    /// through another path.
    ///
    /// # Errors
    ///
    /// See [`walk`](Self::walk).
    pub fn walk_with<F>(&self, root: Artifact, mut visit: F) -> Result<Vec<Artifact>, ExError>
    where
        F: FnMut(&mut Artifact) -> Result<Step, ExError>,
    {
        let mut visited: HashSet<String> = HashSet::new();
        visited.insert(root.canonical().key());

        let mut stack = vec![root];
        let mut out = Vec::new();

        while let Some(mut current) = stack.pop() {
            let targets: Vec<CanonicalRef> = current
                .references
                .iter()
                .filter(|r| self.follows(r))
                .map(|r| r.target.clone())
                .collect();
            let owner = current.canonical();

            let step = visit(&mut current)?;

            let mut children = Vec::new();
            if step == Step::Descend {
                for target in targets {
                    if visited.contains(&target.key()) {
                        continue;
                    }
                    let Some(child) = self.resolve_target(&owner, &target)? else {
                        continue;
                    };
                    // An unpinned target key differs from the resolved
                    // canonical; both are claimed.
                    let fresh = visited.insert(child.canonical().key());
                    visited.insert(target.key());
                    if fresh {
                        children.push(child);
                    }
                }
            }

            out.push(current);

            // Reverse so the first reference is expanded first.
            stack.extend(children.into_iter().rev());
        }

        Ok(out)
    }

    fn resolve_target(
        &self,
        owner: &CanonicalRef,
        target: &CanonicalRef,
    ) -> Result<Option<Artifact>, ExError> {
        match self.resolver.resolve(target)? {
            Some(found) => Ok(Some(found)),
            None => match self.missing {
                MissingTarget::Skip => {
                    tracing::debug!(
                        artifact.url = %target.url,
                        artifact.version = target.version.as_deref().unwrap_or(""),
                        owner = %owner,
                        "skipping unresolved reference"
                    );
                    Ok(None)
                }
                MissingTarget::Fail => Err(KnowlexError::OwnedArtifactNotFound {
                    reference: target.key(),
                    owner: owner.key(),
                }
                .into()),
            },
        }
    }
}
