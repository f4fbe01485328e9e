//! Command inventory for the lifecycle boundary
//!
//! Every operation the engine exposes is one `Command` variant, executed by
//! [`crate::apply::apply`].

use serde::Serialize;

use crate::batch::TransactionBatch;
use crate::diff::{ArtifactDiff, Changelog};
use crate::lifecycle::{ApproveRequest, DraftRequest, PackageRequest, ReleaseRequest};
use crate::model::Artifact;
use crate::repository::BatchReceipt;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Copy an active closure into a new draft version
    Draft(DraftRequest),

    /// Promote a draft closure to active
    Release(ReleaseRequest),

    /// Assemble the full closure into a bundle; nothing is written
    Package(PackageRequest),

    /// Overwrite a draft in place
    Revise(Artifact),

    /// Record approval and an optional assessment
    Approve(ApproveRequest),

    ArtifactDiff {
        source_id: String,
        target_id: String,
    },

    /// Artifact diff flattened into per-url pages
    Changelog {
        source_id: String,
        target_id: String,
    },
}

impl Command {
    /// Operation name used in structured log events
    pub fn op_name(&self) -> &'static str {
        match self {
            Command::Draft(_) => "draft",
            Command::Release(_) => "release",
            Command::Package(_) => "package",
            Command::Revise(_) => "revise",
            Command::Approve(_) => "approve",
            Command::ArtifactDiff { .. } => "artifact_diff",
            Command::Changelog { .. } => "changelog",
        }
    }

    /// Id of the artifact the command is rooted at
    pub fn root_id(&self) -> &str {
        match self {
            Command::Draft(r) => &r.id,
            Command::Release(r) => &r.id,
            Command::Package(r) => &r.id,
            Command::Revise(a) => &a.id,
            Command::Approve(r) => &r.id,
            Command::ArtifactDiff { source_id, .. } | Command::Changelog { source_id, .. } => {
                source_id
            }
        }
    }

    /// Whether applying the command writes to the store
    pub fn is_mutating(&self) -> bool {
        !matches!(
            self,
            Command::Package(_) | Command::ArtifactDiff { .. } | Command::Changelog { .. }
        )
    }
}

/// Result of applying a command
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CommandOutcome {
    /// The batch produced, with the receipt when it was committed
    Batch {
        batch: TransactionBatch,
        #[serde(skip_serializing_if = "Option::is_none")]
        receipt: Option<BatchReceipt>,
    },
    Artifact {
        artifact: Artifact,
    },
    Diff {
        diff: ArtifactDiff,
    },
    Changelog {
        changelog: Changelog,
    },
}

impl CommandOutcome {
    pub fn receipt(&self) -> Option<&BatchReceipt> {
        match self {
            CommandOutcome::Batch { receipt, .. } => receipt.as_ref(),
            _ => None,
        }
    }

    pub fn batch(&self) -> Option<&TransactionBatch> {
        match self {
            CommandOutcome::Batch { batch, .. } => Some(batch),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ArtifactKind;

    #[test]
    fn test_op_names_are_distinct() {
        let cmds = [
            Command::Draft(DraftRequest {
                id: "a".to_string(),
                version: "1.0.0".to_string(),
            }),
            Command::Release(ReleaseRequest::default()),
            Command::Package(PackageRequest::default()),
            Command::Revise(Artifact::new("a", "u", ArtifactKind::Library)),
            Command::Approve(ApproveRequest::default()),
            Command::ArtifactDiff {
                source_id: "a".to_string(),
                target_id: "b".to_string(),
            },
            Command::Changelog {
                source_id: "a".to_string(),
                target_id: "b".to_string(),
            },
        ];
        let mut names: Vec<_> = cmds.iter().map(|c| c.op_name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), cmds.len());
    }

    #[test]
    fn test_read_only_commands() {
        assert!(!Command::Package(PackageRequest::default()).is_mutating());
        assert!(Command::Approve(ApproveRequest::default()).is_mutating());
    }

    #[test]
    fn test_outcome_serializes_with_tag() {
        let outcome = CommandOutcome::Artifact {
            artifact: Artifact::new("a", "u", ArtifactKind::Library),
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["outcome"], "artifact");
        assert_eq!(json["artifact"]["id"], "a");
    }
}
