//! Command dispatch and handlers.

pub mod compare;
pub mod history;
pub mod repos;

use std::env;
use std::path::{Path, PathBuf};

use crate::cassette::session::RecordingSession;
use crate::cli::{Cli, Command};
use crate::config::RepoRegistry;
use crate::context::ServiceContext;

/// Environment variable naming a directory to record port traffic into.
pub const RECORD_ENV: &str = "MODCOMPARE_RECORD";

/// Dispatch a parsed command line to its handler.
///
/// When `MODCOMPARE_RECORD` is set to a directory path, every port
/// interaction is recorded to per-port cassette files in that directory.
///
/// # Errors
///
/// Returns an error string if the selected command handler fails.
pub fn dispatch(cli: &Cli) -> Result<(), String> {
    let (ctx, session) = if let Ok(path) = env::var(RECORD_ENV) {
        let (ctx, session) = ServiceContext::recording_at(PathBuf::from(path))?;
        (ctx, Some(session))
    } else {
        (ServiceContext::live(), None)
    };

    let result = dispatch_with_context(cli, &ctx);

    // Recorders are shared with the adapters, so the context goes first.
    if let Some(session) = session {
        drop(ctx);
        finish_recording(session)?;
    }

    result
}

/// Dispatch a command line with the given service context, printing the
/// report to stdout.
///
/// # Errors
///
/// Returns an error string if the registry cannot be loaded or the
/// selected command handler fails.
pub fn dispatch_with_context(cli: &Cli, ctx: &ServiceContext) -> Result<(), String> {
    let registry = load_registry(ctx, cli.config.as_deref())?;
    let report = match &cli.command {
        Command::Compare { source, target, format, show_unchanged, cumulative } => compare::run_with_context(
            ctx,
            &registry,
            &compare::CompareArgs {
                source,
                target,
                format: *format,
                show_unchanged: *show_unchanged,
                cumulative: *cumulative,
            },
        )?,
        Command::History { repo, version, force_refresh, format } => history::run_with_context(
            ctx,
            &registry,
            &history::HistoryArgs {
                repo,
                version: version.as_deref(),
                force_refresh: *force_refresh,
                format: *format,
                cache_dir: &history::cache_dir(),
            },
        )?,
        Command::Repos => repos::run(&registry),
    };
    println!("{report}");
    Ok(())
}

/// Built-in repositories, extended by the registry file when one is given.
///
/// # Errors
///
/// Returns an error string if the file cannot be read or is invalid.
pub fn load_registry(ctx: &ServiceContext, path: Option<&Path>) -> Result<RepoRegistry, String> {
    RepoRegistry::load(ctx.fs.as_ref(), path).map_err(|e| e.to_string())
}

/// Finish a recording session and report where it was written.
fn finish_recording(session: RecordingSession) -> Result<(), String> {
    let output_dir = session.finish()?;
    eprintln!("Recording saved to: {}", output_dir.display());
    Ok(())
}
