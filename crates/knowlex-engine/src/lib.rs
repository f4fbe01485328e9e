//! Knowlex Engine - Orchestration layer
//!
//! Coordinates the lifecycle kernel with the SQLite store: engine
//! configuration, artifact import, and retry-on-conflict around mutating
//! commands.

pub mod commands;
pub mod config;
pub mod import;
pub mod retry;

pub use commands::engine_command::{
    apply_engine_command, apply_in_context, EngineCommand, EngineCommandResult,
};
pub use config::EngineConfig;
