use std::cell::Cell;

use knowlex_core::diff::{DiffOperation, JsonStructuralDiff, StructuralDiff};
use knowlex_core::errors::ExError;
use knowlex_core::model::{Artifact, ArtifactKind, CanonicalRef, Reference, Status};
use knowlex_core::MemoryRepository;

/// `http://example.org/<name>`
#[allow(dead_code)]
pub fn url(name: &str) -> String {
    format!("http://example.org/{}", name)
}

#[allow(dead_code)]
pub fn pinned(name: &str, version: &str) -> CanonicalRef {
    CanonicalRef::versioned(url(name), version)
}

/// Active artifact whose id equals its name
#[allow(dead_code)]
pub fn active(name: &str, kind: ArtifactKind) -> Artifact {
    active_version(name, name, kind, "1.0.0")
}

#[allow(dead_code)]
pub fn active_version(id: &str, name: &str, kind: ArtifactKind, version: &str) -> Artifact {
    Artifact::new(id, url(name), kind)
        .with_version(version)
        .with_status(Status::Active)
}

/// Reference graph with both an owned-component cycle and a dependency cycle
///
/// ```text
/// spec --owned--> rules --owned--> helper --owned--> spec
///   \               \
///    dep(codes)      dep(codes|1.0.0)
/// codes --dep--> spec (unversioned)
/// ```
#[allow(dead_code)]
pub fn cyclic_repo() -> MemoryRepository {
    let spec = active("spec", ArtifactKind::Specification)
        .with_reference(Reference::owned_component(pinned("rules", "1.0.0")))
        .with_reference(
            Reference::dependency(CanonicalRef::unversioned(url("codes"))).with_priority("urgent"),
        );
    let rules = active("rules", ArtifactKind::RuleSet)
        .with_reference(Reference::owned_component(pinned("helper", "1.0.0")))
        .with_reference(Reference::dependency(pinned("codes", "1.0.0")));
    let helper = active("helper", ArtifactKind::Library)
        .with_reference(Reference::owned_component(pinned("spec", "1.0.0")));
    let codes = active("codes", ArtifactKind::CodeList)
        .with_reference(Reference::dependency(CanonicalRef::unversioned(url("spec"))));

    MemoryRepository::with_artifacts([spec, rules, helper, codes]).unwrap()
}

/// Root depending on four leaves `a`..`d`, five artifacts in total
#[allow(dead_code)]
pub fn flat_repo() -> MemoryRepository {
    let mut root = active("root", ArtifactKind::Library);
    let mut all = Vec::new();
    for name in ["a", "b", "c", "d"] {
        root = root.with_reference(Reference::dependency(pinned(name, "1.0.0")));
        all.push(active(name, ArtifactKind::Library));
    }
    all.insert(0, root);
    MemoryRepository::with_artifacts(all).unwrap()
}

/// JSON diff that counts how often each pair is compared
#[allow(dead_code)]
#[derive(Default)]
pub struct CountingDiff {
    inner: JsonStructuralDiff,
    calls: Cell<usize>,
    shared_calls: Cell<usize>,
    shared_url: String,
}

#[allow(dead_code)]
impl CountingDiff {
    pub fn watching(shared_url: impl Into<String>) -> Self {
        Self {
            shared_url: shared_url.into(),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.get()
    }

    pub fn shared_calls(&self) -> usize {
        self.shared_calls.get()
    }
}

impl StructuralDiff for CountingDiff {
    fn diff(&self, source: &Artifact, target: &Artifact) -> Result<Vec<DiffOperation>, ExError> {
        self.calls.set(self.calls.get() + 1);
        if source.url == self.shared_url {
            self.shared_calls.set(self.shared_calls.get() + 1);
        }
        self.inner.diff(source, target)
    }
}
