//! Diff output types.
//!
//! Children keep the order in which their references were first paired.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::model::{ArtifactKind, CanonicalRef};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OpType {
    Add,
    Remove,
    Replace,
}

/// One structural change, addressed by JSON pointer
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DiffOperation {
    pub op: OpType,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_value: Option<Value>,
}

impl DiffOperation {
    pub fn add(path: impl Into<String>, value: Value) -> Self {
        Self {
            op: OpType::Add,
            path: path.into(),
            previous_value: None,
            new_value: Some(value),
        }
    }

    pub fn remove(path: impl Into<String>, previous: Value) -> Self {
        Self {
            op: OpType::Remove,
            path: path.into(),
            previous_value: Some(previous),
            new_value: None,
        }
    }

    pub fn replace(path: impl Into<String>, previous: Value, value: Value) -> Self {
        Self {
            op: OpType::Replace,
            path: path.into(),
            previous_value: Some(previous),
            new_value: Some(value),
        }
    }
}

/// Change tree rooted at one `(source, target)` pair
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ArtifactDiff {
    pub source: CanonicalRef,
    pub target: CanonicalRef,
    pub kind: ArtifactKind,
    pub operations: Vec<DiffOperation>,
    /// Paired referenced artifacts, at most one per source url
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ArtifactDiff>,
}

impl ArtifactDiff {
    pub fn is_unchanged(&self) -> bool {
        self.operations.is_empty() && self.children.iter().all(|c| c.is_unchanged())
    }

    /// Number of nodes in the tree, including this one
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(|c| c.node_count()).sum::<usize>()
    }

    /// Child paired from the reference to `url`
    pub fn child(&self, url: &str) -> Option<&ArtifactDiff> {
        self.children.iter().find(|c| c.source.url == url)
    }
}

/// Flattened operation with a dotted path (`a.b[0].c`)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChangelogOperation {
    pub op: OpType,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_value: Option<Value>,
}

/// All changes to one artifact url
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChangelogPage {
    pub url: String,
    pub old_version: Option<String>,
    pub new_version: Option<String>,
    pub kind: ArtifactKind,
    pub operations: Vec<ChangelogOperation>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Changelog {
    pub pages: Vec<ChangelogPage>,
}

impl Changelog {
    pub fn page(&self, url: &str) -> Option<&ChangelogPage> {
        self.pages.iter().find(|p| p.url == url)
    }
}
