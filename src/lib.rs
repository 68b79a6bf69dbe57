//! Core library entry for the `modcompare` CLI.
//!
//! Compares module inventories (bid adapters, analytics adapters, RTD and
//! user-ID modules, ...) between two versions of one repository or across
//! repositories, and traces when each module first appeared.

pub mod adapters;
pub mod cassette;
pub mod cli;
pub mod commands;
pub mod compare;
pub mod config;
pub mod context;
pub mod error;
pub mod history;
pub mod inventory;
pub mod logging;
pub mod ports;
pub mod versions;

use clap::Parser;

/// Run the CLI with the provided arguments.
///
/// Help and version requests print to stdout and succeed.
///
/// # Errors
///
/// Returns an error string when argument parsing fails or command execution fails.
pub fn run<I, T>(args: I) -> Result<(), String>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let cli = match cli::Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(err) if !err.use_stderr() => {
            print!("{err}");
            return Ok(());
        }
        Err(err) => return Err(err.to_string()),
    };
    logging::init(cli.verbose);
    commands::dispatch(&cli)
}
