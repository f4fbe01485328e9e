//! Functional-boundary apply function
//!
//! `apply()` is the single entry point for lifecycle commands. Mutating
//! commands build a batch from a read-only view of the repository and commit
//! it through `commit_batch`, so either every write lands or none does.
//!
//! ```
//! use knowlex_core::{apply, Command, CommandOutcome, MemoryRepository};
//! use knowlex_core::diff::JsonStructuralDiff;
//! use knowlex_core::lifecycle::PackageRequest;
//! use knowlex_core::model::{Artifact, ArtifactKind, Status};
//!
//! let mut repo = MemoryRepository::with_artifacts([
//!     Artifact::new("lib", "http://example.org/lib", ArtifactKind::Library)
//!         .with_version("1.0.0")
//!         .with_status(Status::Active),
//! ])
//! .unwrap();
//!
//! let cmd = Command::Package(PackageRequest {
//!     id: "lib".to_string(),
//!     ..PackageRequest::default()
//! });
//! let outcome = apply(&mut repo, cmd, &JsonStructuralDiff::default()).unwrap();
//! assert_eq!(outcome.batch().map(|b| b.len()), Some(1));
//! ```

#![allow(clippy::result_large_err)]

use crate::commands::{Command, CommandOutcome};
use crate::diff::{artifact_diff, changelog, StructuralDiff};
use crate::errors::ExError;
use crate::lifecycle;
use crate::repository::ArtifactRepository;
use crate::{log_op_end, log_op_error, log_op_start};

/// Apply `cmd` against `repo`
///
/// # Errors
///
/// Whatever the underlying operation or the commit reports; the repository
/// is left untouched on error.
pub fn apply<R, D>(repo: &mut R, cmd: Command, differ: &D) -> Result<CommandOutcome, ExError>
where
    R: ArtifactRepository + ?Sized,
    D: StructuralDiff + ?Sized,
{
    let op = cmd.op_name();
    log_op_start!(op, artifact.id = cmd.root_id());
    let start = std::time::Instant::now();

    let result = apply_impl(repo, cmd, differ).map_err(|e| {
        log_op_error!(op, e.clone(), duration_ms = start.elapsed().as_millis() as u64);
        e
    })?;

    let duration_ms = start.elapsed().as_millis() as u64;
    match &result {
        CommandOutcome::Batch { batch, .. } => {
            log_op_end!(op, duration_ms = duration_ms, batch_len = batch.len());
        }
        _ => {
            log_op_end!(op, duration_ms = duration_ms);
        }
    }

    Ok(result)
}

fn apply_impl<R, D>(repo: &mut R, cmd: Command, differ: &D) -> Result<CommandOutcome, ExError>
where
    R: ArtifactRepository + ?Sized,
    D: StructuralDiff + ?Sized,
{
    match cmd {
        Command::Draft(request) => {
            let batch = lifecycle::draft(repo, &request)?;
            commit(repo, batch)
        }
        Command::Release(request) => {
            let batch = lifecycle::release(repo, &request)?;
            commit(repo, batch)
        }
        Command::Approve(request) => {
            let batch = lifecycle::approve(repo, &request)?;
            commit(repo, batch)
        }
        Command::Package(request) => Ok(CommandOutcome::Batch {
            batch: lifecycle::package(repo, &request)?,
            receipt: None,
        }),
        Command::Revise(proposed) => {
            let revised = lifecycle::revise(repo, proposed)?;
            let artifact = repo.update(revised)?;
            Ok(CommandOutcome::Artifact { artifact })
        }
        Command::ArtifactDiff {
            source_id,
            target_id,
        } => Ok(CommandOutcome::Diff {
            diff: artifact_diff(repo, differ, &source_id, &target_id)?,
        }),
        Command::Changelog {
            source_id,
            target_id,
        } => {
            let diff = artifact_diff(repo, differ, &source_id, &target_id)?;
            Ok(CommandOutcome::Changelog {
                changelog: changelog(repo, &diff)?,
            })
        }
    }
}

fn commit<R: ArtifactRepository + ?Sized>(
    repo: &mut R,
    batch: crate::batch::TransactionBatch,
) -> Result<CommandOutcome, ExError> {
    let receipt = repo.commit_batch(&batch)?;
    Ok(CommandOutcome::Batch {
        batch,
        receipt: Some(receipt),
    })
}
