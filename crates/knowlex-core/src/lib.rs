//! Knowlex Core - lifecycle and dependency-graph kernel for knowledge artifacts
//!
//! This crate provides:
//! - Artifact, reference and assessment models with canonical `url|version` identity
//! - Canonical resolution with a deterministic "latest" ordering
//! - Closure traversal over component and dependency references
//! - Lifecycle operations (draft, release, package, revise, approve) that
//!   compile to atomic transaction batches
//! - Recursive artifact diffs and changelog flattening
//!
//! Storage is abstracted behind [`ArtifactRepository`]; an in-memory
//! implementation ships here and a SQLite one lives in `knowlex-store`.

pub mod apply;
pub mod assessments;
pub mod batch;
pub mod commands;
pub mod diff;
pub mod errors;
pub mod lifecycle;
pub mod logging_facility;
pub mod model;
pub mod repository;
pub mod resolver;
pub mod traversal;
pub mod version;

#[doc(hidden)]
pub mod __private {
    pub use knowlex_core_types::schema;
    pub use tracing;
}

// Re-export commonly used types
pub use apply::apply;
pub use batch::{BatchBuilder, BatchType, TransactionBatch};
pub use commands::{Command, CommandOutcome};
pub use errors::{ExError, ExErrorKind, KnowlexError, Result};
pub use model::{Artifact, ArtifactKind, CanonicalRef, Reference, Status};
pub use repository::{ArtifactRepository, BatchReceipt, MemoryRepository};
pub use resolver::CanonicalResolver;
