//! Command orchestration layer.
//!
//! Binds lifecycle commands to a SQLite connection and the engine
//! configuration.

pub mod engine_command;
