//! Subcommand implementations
//!
//! Every subcommand opens the store, runs one engine command and prints the
//! result as pretty JSON on stdout.

use std::error::Error;
use std::path::{Path, PathBuf};

use knowlex_core::logging_facility;
use knowlex_engine::{apply_engine_command, EngineCommand, EngineConfig};

pub mod diff;
pub mod import;
pub mod lifecycle;

pub type CliResult = Result<(), Box<dyn Error>>;

/// Resolved global options
pub struct Context {
    pub db: PathBuf,
    pub config: EngineConfig,
}

impl Context {
    pub fn load(db: PathBuf, config_path: Option<&Path>) -> Result<Self, Box<dyn Error>> {
        let config = EngineConfig::load(config_path)?;
        logging_facility::init(config.logging_profile()?);
        Ok(Self { db, config })
    }

    /// Run `cmd` against the store and print its result
    pub fn run(&self, cmd: EngineCommand) -> CliResult {
        let mut conn = knowlex_store::db::open_store(&self.db)?;
        let result = apply_engine_command(cmd, &mut conn, &self.config)?;
        println!("{}", serde_json::to_string_pretty(&result)?);
        Ok(())
    }
}
