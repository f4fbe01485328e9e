//! Repository layer mapping knowlex-core models onto SQLite rows

pub mod sqlite_repo;

pub use sqlite_repo::{SqliteArtifactRepository, SqliteRepo};
