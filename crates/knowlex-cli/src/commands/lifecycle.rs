//! Lifecycle commands: draft, release, package, revise, approve

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::Args;
use knowlex_core::lifecycle::{
    ApproveRequest, DraftRequest, ExperimentalBehavior, IncludeKind, PackageRequest,
    ReleaseRequest,
};
use knowlex_core::model::{AssessmentKind, Endorser};
use knowlex_core::version::VersionBehavior;
use knowlex_core::{CanonicalRef, Command};
use knowlex_engine::import::{parse_import, ImportFormat};
use knowlex_engine::EngineCommand;

use super::{CliResult, Context};

#[derive(Debug, Args)]
pub struct DraftArgs {
    /// Id of the active root artifact
    pub id: String,

    /// MAJOR.MINOR.PATCH[.REVISION]
    #[arg(long)]
    pub version: String,
}

#[derive(Debug, Args)]
pub struct ReleaseArgs {
    /// Id of the draft root artifact
    pub id: String,

    #[arg(long)]
    pub version: Option<String>,

    /// default | force | check
    #[arg(long)]
    pub version_behavior: Option<VersionBehavior>,

    /// none | warn | error
    #[arg(long)]
    pub experimental_behavior: Option<ExperimentalBehavior>,

    #[arg(long)]
    pub release_label: Option<String>,

    /// Resolve dependencies against a terminology server (unsupported)
    #[arg(long)]
    pub latest_from_tx_server: bool,
}

#[derive(Debug, Args)]
pub struct PackageArgs {
    pub id: String,

    /// Allowed knowledge capability (repeatable)
    #[arg(long)]
    pub capability: Vec<String>,

    /// all | artifact | canonical | knowledge | terminology | conformance |
    /// extensions | profiles | tests | examples (repeatable)
    #[arg(long)]
    pub include: Vec<IncludeKind>,

    /// url|version filled in where the packaged artifact has no version
    #[arg(long)]
    pub canonical_version: Vec<CanonicalRef>,

    /// url|version the packaged artifact must match
    #[arg(long)]
    pub check_canonical_version: Vec<CanonicalRef>,

    /// url|version overriding the packaged version
    #[arg(long)]
    pub force_canonical_version: Vec<CanonicalRef>,

    #[arg(long, allow_hyphen_values = true)]
    pub count: Option<i64>,

    #[arg(long)]
    pub offset: Option<usize>,

    #[arg(long)]
    pub content_endpoint: Option<String>,

    #[arg(long)]
    pub terminology_endpoint: Option<String>,

    #[arg(long)]
    pub package_only: Option<bool>,

    /// Priority for terminology the author did not prioritize
    #[arg(long)]
    pub default_priority: Option<String>,
}

#[derive(Debug, Args)]
pub struct ReviseArgs {
    /// JSON or YAML file holding the revised draft
    pub path: PathBuf,
}

#[derive(Debug, Args)]
pub struct ApproveArgs {
    pub id: String,

    /// YYYY-MM-DD; defaults to today
    #[arg(long)]
    pub approval_date: Option<NaiveDate>,

    /// comment | classifier | rating | container | response | change-request
    #[arg(long)]
    pub assessment_type: Option<AssessmentKind>,

    #[arg(long)]
    pub summary: Option<String>,

    /// url or url|version of the approved artifact
    #[arg(long)]
    pub target: Option<CanonicalRef>,

    #[arg(long)]
    pub related_citation: Option<String>,

    #[arg(long)]
    pub author: Option<String>,

    #[arg(long)]
    pub endorser_name: Option<String>,

    #[arg(long, requires = "endorser_name")]
    pub endorser_contact: Option<String>,
}

pub fn execute_draft(ctx: &Context, args: DraftArgs) -> CliResult {
    ctx.run(EngineCommand::Lifecycle(Command::Draft(DraftRequest {
        id: args.id,
        version: args.version,
    })))
}

pub fn execute_release(ctx: &Context, args: ReleaseArgs) -> CliResult {
    ctx.run(EngineCommand::Lifecycle(Command::Release(ReleaseRequest {
        id: args.id,
        version: args.version,
        version_behavior: args.version_behavior,
        latest_from_tx_server: args.latest_from_tx_server,
        experimental_behavior: args.experimental_behavior.unwrap_or_default(),
        release_label: args.release_label,
    })))
}

pub fn execute_package(ctx: &Context, args: PackageArgs) -> CliResult {
    ctx.run(EngineCommand::Lifecycle(Command::Package(PackageRequest {
        id: args.id,
        capability: args.capability,
        include: args.include,
        canonical_version: args.canonical_version,
        check_canonical_version: args.check_canonical_version,
        force_canonical_version: args.force_canonical_version,
        count: args.count,
        offset: args.offset,
        content_endpoint: args.content_endpoint,
        terminology_endpoint: args.terminology_endpoint,
        package_only: args.package_only,
        default_priority: args.default_priority,
    })))
}

pub fn execute_revise(ctx: &Context, args: ReviseArgs) -> CliResult {
    let content = std::fs::read_to_string(&args.path)?;
    let mut bundle = parse_import(&content, ImportFormat::from_path(&args.path))?;
    if bundle.artifacts.len() != 1 {
        return Err(format!(
            "{} must hold exactly one artifact, found {}",
            args.path.display(),
            bundle.artifacts.len()
        )
        .into());
    }
    let artifact = bundle.artifacts.remove(0);
    ctx.run(EngineCommand::Lifecycle(Command::Revise(artifact)))
}

pub fn execute_approve(ctx: &Context, args: ApproveArgs) -> CliResult {
    let endorser = args.endorser_name.map(|name| Endorser {
        name,
        contact: args.endorser_contact,
    });
    ctx.run(EngineCommand::Lifecycle(Command::Approve(ApproveRequest {
        id: args.id,
        approval_date: args.approval_date,
        assessment_kind: args.assessment_type,
        summary: args.summary,
        target: args.target,
        related_citation: args.related_citation,
        author: args.author,
        endorser,
    })))
}
