//! `modcompare compare` command.

use crate::compare::{render_comparison, render_cumulative, Comparator, Format, Progress, ProgressFn};
use crate::config::RepoRegistry;
use crate::context::ServiceContext;
use crate::error::Error;
use crate::inventory::fetcher::HostInventoryFetcher;

/// Arguments of the `compare` command.
#[derive(Debug, Clone, Copy)]
pub struct CompareArgs<'a> {
    /// Source side as `repo:version`.
    pub source: &'a str,
    /// Target side as `repo:version`.
    pub target: &'a str,
    /// Report format.
    pub format: Format,
    /// Include unchanged modules in listings.
    pub show_unchanged: bool,
    /// Walk every release between the two versions.
    pub cumulative: bool,
}

/// Split `repo:version`. Both halves must be non-empty.
///
/// # Errors
///
/// Returns [`Error::InvalidArgument`] when the colon or either half is missing.
pub fn parse_side(value: &str) -> Result<(&str, &str), Error> {
    match value.split_once(':') {
        Some((repo, version)) if !repo.is_empty() && !version.is_empty() => Ok((repo, version)),
        _ => Err(Error::InvalidArgument(format!("expected <repo>:<version>, got '{value}'"))),
    }
}

fn print_progress(event: &Progress) {
    eprintln!("{event}...");
}

/// Execute the `compare` command and return the rendered report.
///
/// # Errors
///
/// Returns an error string for a malformed side, an unknown repository,
/// a cumulative request across two repositories, or a failed fetch.
pub fn run_with_context(
    ctx: &ServiceContext,
    registry: &RepoRegistry,
    args: &CompareArgs<'_>,
) -> Result<String, String> {
    let (source_key, source_version) = parse_side(args.source).map_err(|e| e.to_string())?;
    let (target_key, target_version) = parse_side(args.target).map_err(|e| e.to_string())?;

    let fetcher = HostInventoryFetcher::new(ctx.host.as_ref());
    let comparator = Comparator::new(registry, &fetcher);
    let progress: ProgressFn<'_> = &print_progress;

    if args.cumulative {
        let source_repo = registry.resolve(source_key).map_err(|e| e.to_string())?;
        let target_repo = registry.resolve(target_key).map_err(|e| e.to_string())?;
        if source_repo.repo != target_repo.repo {
            return Err(Error::InvalidArgument(format!(
                "--cumulative needs both sides in one repository, got {} and {}",
                source_repo.repo, target_repo.repo
            ))
            .to_string());
        }
        let result = comparator
            .compare_cumulative(source_key, source_version, target_version, Some(progress))
            .map_err(|e| e.to_string())?;
        return Ok(render_cumulative(&result, args.format));
    }

    let result = comparator
        .compare(source_key, source_version, target_key, target_version, Some(progress))
        .map_err(|e| e.to_string())?;
    Ok(render_comparison(&result, args.format, args.show_unchanged))
}
