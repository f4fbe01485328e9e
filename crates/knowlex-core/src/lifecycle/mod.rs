//! Lifecycle operations
//!
//! Each operation reads through `ArtifactRepository` and returns the writes
//! it wants as a `TransactionBatch` (or a single artifact for revise). No
//! operation writes on its own; `apply()` commits the result.
//!
//! Legal transitions: `Active -> Draft` (draft, new artifacts),
//! `Draft -> Active` (release), `Draft -> Draft` (revise).

pub mod approve;
pub mod draft;
pub mod package;
pub mod release;
pub mod revise;

pub use approve::{approve, ApproveRequest};
pub use draft::{draft, DraftRequest};
pub use package::{package, IncludeKind, PackageRequest, DEFAULT_PRIORITY};
pub use release::{release, ExperimentalBehavior, ReleaseRequest};
pub use revise::revise;

use crate::model::{CanonicalRef, Reference};

/// Maps canonicals of an operation's working set to their rewritten form
///
/// Pinned references match on `url|version`; unpinned references match any
/// member with the same url.
#[derive(Debug, Default)]
pub(crate) struct RetargetMap {
    entries: Vec<(CanonicalRef, String, CanonicalRef)>,
}

impl RetargetMap {
    /// Record `from` (stored as `old_id`) -> `to`
    pub(crate) fn insert(&mut self, from: CanonicalRef, old_id: String, to: CanonicalRef) {
        self.entries.push((from, old_id, to));
    }

    pub(crate) fn lookup(&self, target: &CanonicalRef) -> Option<&CanonicalRef> {
        self.entries
            .iter()
            .find(|(from, _, _)| from == target)
            .or_else(|| {
                self.entries
                    .iter()
                    .find(|(from, _, _)| target.designates(&from.url, from.version.as_deref()))
            })
            .map(|(_, _, to)| to)
    }

    pub(crate) fn contains_id(&self, id: &str) -> bool {
        self.entries.iter().any(|(_, old_id, _)| old_id == id)
    }

    /// Rewrite one reference if its target is in the map
    pub(crate) fn rewrite(&self, reference: &Reference) -> Option<Reference> {
        self.lookup(&reference.target)
            .map(|to| reference.retargeted(to.clone()))
    }
}
