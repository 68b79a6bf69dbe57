//! CLI argument definitions.

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

use crate::compare::Format;

/// Top-level CLI parser for `modcompare`.
#[derive(Debug, Parser)]
#[command(name = "modcompare", version, about = "Compare ad-tech module inventories across versions and repositories")]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Repository registry file extending the built-in repositories.
    #[arg(long, global = true, env = crate::config::CONFIG_ENV)]
    pub config: Option<PathBuf>,

    /// The command to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Supported top-level subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Compare the modules of two repository versions.
    Compare {
        /// Source side as `repo:version`.
        source: String,
        /// Target side as `repo:version`.
        target: String,
        /// Report format.
        #[arg(long, value_enum, default_value_t = Format::Table)]
        format: Format,
        /// List unchanged (or shared) modules too.
        #[arg(long)]
        show_unchanged: bool,
        /// Walk every release between the two versions of one repository.
        #[arg(long)]
        cumulative: bool,
    },
    /// Show when each module of a repository first appeared.
    History {
        /// Repository key or `owner/name`.
        repo: String,
        /// Snapshot to trace (default: newest analysed release).
        #[arg(long)]
        version: Option<String>,
        /// Ignore the cache and analyse from scratch.
        #[arg(long)]
        force_refresh: bool,
        /// Report format.
        #[arg(long, value_enum, default_value_t = Format::Table)]
        format: Format,
    },
    /// List configured repositories.
    Repos,
}

#[cfg(test)]
mod tests {
    use super::{Cli, Command};
    use crate::compare::Format;
    use clap::Parser;

    #[test]
    fn parses_compare_with_flags() {
        let cli = Cli::parse_from([
            "modcompare",
            "-vv",
            "compare",
            "prebid-js:9.0.0",
            "prebid-js:9.10.0",
            "--format",
            "json",
            "--show-unchanged",
        ]);
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Command::Compare { source, target, format, show_unchanged, cumulative } => {
                assert_eq!(source, "prebid-js:9.0.0");
                assert_eq!(target, "prebid-js:9.10.0");
                assert_eq!(format, Format::Json);
                assert!(show_unchanged);
                assert!(!cumulative);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn parses_history_defaults() {
        let cli = Cli::parse_from(["modcompare", "history", "prebid-server", "--force-refresh"]);
        match cli.command {
            Command::History { repo, version, force_refresh, format } => {
                assert_eq!(repo, "prebid-server");
                assert!(version.is_none());
                assert!(force_refresh);
                assert_eq!(format, Format::Table);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::parse_from(["modcompare", "repos", "--config", "repos.yaml", "-v"]);
        assert!(matches!(cli.command, Command::Repos));
        assert_eq!(cli.config.as_deref(), Some(std::path::Path::new("repos.yaml")));
        assert_eq!(cli.verbose, 1);
    }

    #[test]
    fn rejects_unknown_format() {
        assert!(Cli::try_parse_from(["modcompare", "compare", "a:1", "b:2", "--format", "xml"]).is_err());
    }
}
