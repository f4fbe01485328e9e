//! Knowlex Store - SQLite persistence for artifacts and assessments
//!
//! Provides:
//! - Connection helpers and pragmas
//! - Embedded, checksummed schema migrations
//! - `SqliteArtifactRepository`, the SQLite implementation of
//!   `knowlex_core::ArtifactRepository`, with a unique index on
//!   `(url, version)` and single-transaction batch commits

pub mod db;
pub mod errors;
pub mod migrations;
pub mod repo;

// Re-export key types
pub use errors::Result;
pub use repo::SqliteArtifactRepository;
