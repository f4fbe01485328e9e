//! Engine-level commands that require I/O (database, import files).

#![allow(clippy::result_large_err)]

use std::path::PathBuf;

use knowlex_core::errors::ExError;
use knowlex_core::{apply, BatchReceipt, Command, CommandOutcome};
use knowlex_core_types::RequestContext;
use knowlex_store::SqliteArtifactRepository;
use rusqlite::Connection;
use serde::Serialize;

use crate::config::EngineConfig;
use crate::import::import_file;
use crate::retry::with_conflict_retry;

/// Engine-level commands that require I/O.
#[derive(Debug, Clone)]
pub enum EngineCommand {
    /// Load artifacts and assessments from a JSON or YAML file.
    Import { path: PathBuf },
    /// Run a lifecycle command against the store.
    Lifecycle(Command),
}

/// Result of applying an engine command.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum EngineCommandResult {
    Imported(BatchReceipt),
    Lifecycle(CommandOutcome),
}

/// Apply an engine command against a migrated connection.
///
/// Mutating lifecycle commands are re-run from a fresh read when the commit
/// hits a uniqueness conflict, up to `config.conflict_retries` times.
///
/// # Errors
///
/// Whatever the command reports, tagged with the request id; a failed
/// command leaves the store unchanged.
pub fn apply_engine_command(
    cmd: EngineCommand,
    conn: &mut Connection,
    config: &EngineConfig,
) -> Result<EngineCommandResult, ExError> {
    apply_in_context(cmd, conn, config, &RequestContext::new())
}

/// [`apply_engine_command`] under a caller-supplied request context
///
/// # Errors
///
/// See [`apply_engine_command`].
pub fn apply_in_context(
    cmd: EngineCommand,
    conn: &mut Connection,
    config: &EngineConfig,
    ctx: &RequestContext,
) -> Result<EngineCommandResult, ExError> {
    let span = tracing::info_span!(
        "request",
        request_id = %ctx.request_id,
        trace_id = ctx.trace_id.as_ref().map(|t| t.as_str()),
    );
    let _enter = span.enter();

    run(cmd, conn, config).map_err(|e| {
        let e = e.with_request_id(ctx.request_id.clone());
        match &ctx.trace_id {
            Some(trace_id) => e.with_trace_id(trace_id.clone()),
            None => e,
        }
    })
}

fn run(
    cmd: EngineCommand,
    conn: &mut Connection,
    config: &EngineConfig,
) -> Result<EngineCommandResult, ExError> {
    match cmd {
        EngineCommand::Import { path } => {
            let mut repo = SqliteArtifactRepository::new(conn);
            Ok(EngineCommandResult::Imported(import_file(&mut repo, &path)?))
        }
        EngineCommand::Lifecycle(cmd) => {
            let cmd = with_configured_defaults(cmd, config);
            let differ = config.differ();
            let retries = if cmd.is_mutating() {
                config.conflict_retries
            } else {
                0
            };
            let outcome = with_conflict_retry(cmd.op_name(), retries, |_| {
                let mut repo = SqliteArtifactRepository::new(&mut *conn);
                apply(&mut repo, cmd.clone(), &differ)
            })?;
            Ok(EngineCommandResult::Lifecycle(outcome))
        }
    }
}

fn with_configured_defaults(cmd: Command, config: &EngineConfig) -> Command {
    match cmd {
        Command::Package(mut request) => {
            if request.default_priority.is_none() {
                request.default_priority = Some(config.default_priority.clone());
            }
            Command::Package(request)
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use knowlex_core::lifecycle::PackageRequest;

    #[test]
    fn test_package_picks_up_configured_priority() {
        let config = EngineConfig {
            default_priority: "stat".to_string(),
            ..EngineConfig::default()
        };
        let cmd = with_configured_defaults(
            Command::Package(PackageRequest {
                id: "x".to_string(),
                ..PackageRequest::default()
            }),
            &config,
        );
        match cmd {
            Command::Package(request) => {
                assert_eq!(request.default_priority.as_deref(), Some("stat"))
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_explicit_priority_wins() {
        let cmd = with_configured_defaults(
            Command::Package(PackageRequest {
                default_priority: Some("asap".to_string()),
                ..PackageRequest::default()
            }),
            &EngineConfig::default(),
        );
        assert!(matches!(
            cmd,
            Command::Package(PackageRequest { default_priority: Some(ref p), .. }) if p == "asap"
        ));
    }
}
