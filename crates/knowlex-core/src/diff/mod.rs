//! Recursive artifact diff.
//!
//! ## Entry points
//!
//! ```ignore
//! use knowlex_core::diff::{artifact_diff, changelog, JsonStructuralDiff};
//!
//! let differ = JsonStructuralDiff::default();
//! let tree = artifact_diff(&repo, &differ, "spec-v1", "spec-v2")?;
//! let log = changelog(&repo, &tree)?;
//! ```
//!
//! ## Guarantees
//!
//! - **Memoization**: each `(source, target)` pair is diffed at most once per
//!   call; the memo table never outlives the call.
//! - **Cycle safety**: a pair already being diffed higher up the tree is not
//!   entered again.
//! - **Best effort**: a referenced artifact that cannot be resolved omits its
//!   branch (logged at `warn`) instead of failing the diff.

pub mod changelog;
pub mod engine;
pub mod model;
pub mod primitive;

pub use changelog::{changelog, dotted_path};
pub use engine::artifact_diff;
pub use model::{ArtifactDiff, Changelog, ChangelogPage, DiffOperation, OpType};
pub use primitive::{JsonStructuralDiff, StructuralDiff};
