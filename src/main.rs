//! Binary entrypoint for the `modcompare` CLI.

use std::process::ExitCode;

fn main() -> ExitCode {
    // A .env file may carry GITHUB_TOKEN; a missing file is fine.
    let _ = dotenvy::dotenv();

    // Recording is handled in commands::dispatch via MODCOMPARE_RECORD=<dir>.
    match modcompare::run(std::env::args()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}
