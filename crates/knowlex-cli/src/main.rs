//! Knowlex CLI
//!
//! Command-line interface for the artifact lifecycle engine

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Debug, Parser)]
#[command(name = "knowlex")]
#[command(about = "Knowlex - knowledge artifact lifecycle and packaging", long_about = None)]
struct Cli {
    /// SQLite store path
    #[arg(long, global = true, env = "KNOWLEX_DB", default_value = ".knowlex/store.db")]
    db: PathBuf,

    /// Engine configuration (TOML); defaults apply when absent
    #[arg(long, global = true, env = "KNOWLEX_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Import artifacts from a JSON or YAML file
    Import(commands::import::ImportArgs),
    /// Draft a new version of an active artifact and its owned components
    Draft(commands::lifecycle::DraftArgs),
    /// Release a draft and its owned components
    Release(commands::lifecycle::ReleaseArgs),
    /// Bundle an artifact with everything it references
    Package(commands::lifecycle::PackageArgs),
    /// Overwrite a draft from a file
    Revise(commands::lifecycle::ReviseArgs),
    /// Record approval and an optional assessment
    Approve(commands::lifecycle::ApproveArgs),
    /// Structural diff of two artifacts and their references
    Diff(commands::diff::DiffArgs),
    /// Diff flattened into one page per artifact
    Changelog(commands::diff::DiffArgs),
}

fn main() {
    let cli = Cli::parse();

    let result = commands::Context::load(cli.db, cli.config.as_deref()).and_then(|ctx| {
        match cli.command {
            Commands::Import(args) => commands::import::execute(&ctx, args),
            Commands::Draft(args) => commands::lifecycle::execute_draft(&ctx, args),
            Commands::Release(args) => commands::lifecycle::execute_release(&ctx, args),
            Commands::Package(args) => commands::lifecycle::execute_package(&ctx, args),
            Commands::Revise(args) => commands::lifecycle::execute_revise(&ctx, args),
            Commands::Approve(args) => commands::lifecycle::execute_approve(&ctx, args),
            Commands::Diff(args) => commands::diff::execute_diff(&ctx, args),
            Commands::Changelog(args) => commands::diff::execute_changelog(&ctx, args),
        }
    });

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
