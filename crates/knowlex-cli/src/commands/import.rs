//! Import command
//!
//! Usage: knowlex import <PATH>

use std::path::PathBuf;

use clap::Args;
use knowlex_engine::EngineCommand;

use super::{CliResult, Context};

#[derive(Debug, Args)]
pub struct ImportArgs {
    /// JSON or YAML file holding an artifact, a list, or an
    /// `artifacts`/`assessments` bundle
    pub path: PathBuf,
}

pub fn execute(ctx: &Context, args: ImportArgs) -> CliResult {
    ctx.run(EngineCommand::Import { path: args.path })
}
