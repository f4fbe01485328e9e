use serde::{Deserialize, Serialize};

use super::canonical::CanonicalRef;

/// Edge kind between artifacts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReferenceKind {
    /// Lifecycle-coupled part of the source artifact
    Component,
    /// External artifact the source relies on
    Dependency,
}

/// Directed reference from one artifact to a canonical
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    pub kind: ReferenceKind,
    pub target: CanonicalRef,

    /// Source controls the target's lifecycle. Only meaningful on components.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub owned: bool,

    /// Author-assigned priority code carried to packaged terminology
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
}

impl Reference {
    pub fn new(kind: ReferenceKind, target: CanonicalRef) -> Self {
        Self {
            kind,
            target,
            owned: false,
            priority: None,
            display: None,
        }
    }

    pub fn component(target: CanonicalRef) -> Self {
        Self::new(ReferenceKind::Component, target)
    }

    pub fn owned_component(target: CanonicalRef) -> Self {
        Self {
            owned: true,
            ..Self::component(target)
        }
    }

    pub fn dependency(target: CanonicalRef) -> Self {
        Self::new(ReferenceKind::Dependency, target)
    }

    pub fn with_priority(mut self, priority: impl Into<String>) -> Self {
        self.priority = Some(priority.into());
        self
    }

    /// Owned component; an `owned` flag on a dependency is ignored
    pub fn is_owned(&self) -> bool {
        self.owned && self.kind == ReferenceKind::Component
    }

    pub fn is_component(&self) -> bool {
        self.kind == ReferenceKind::Component
    }

    pub fn is_dependency(&self) -> bool {
        self.kind == ReferenceKind::Dependency
    }

    /// Same edge, pointed at another canonical
    pub fn retargeted(&self, target: CanonicalRef) -> Self {
        Self {
            target,
            ..self.clone()
        }
    }
}
