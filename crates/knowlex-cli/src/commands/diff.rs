//! Diff and changelog commands
//!
//! Usage: knowlex diff <SOURCE_ID> <TARGET_ID>
//!        knowlex changelog <SOURCE_ID> <TARGET_ID>

use clap::Args;
use knowlex_core::Command;
use knowlex_engine::EngineCommand;

use super::{CliResult, Context};

#[derive(Debug, Args)]
pub struct DiffArgs {
    pub source_id: String,
    pub target_id: String,
}

pub fn execute_diff(ctx: &Context, args: DiffArgs) -> CliResult {
    ctx.run(EngineCommand::Lifecycle(Command::ArtifactDiff {
        source_id: args.source_id,
        target_id: args.target_id,
    }))
}

pub fn execute_changelog(ctx: &Context, args: DiffArgs) -> CliResult {
    ctx.run(EngineCommand::Lifecycle(Command::Changelog {
        source_id: args.source_id,
        target_id: args.target_id,
    }))
}
