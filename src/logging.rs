//! Stderr logging set up from the `-v` count.

use log::LevelFilter;

/// Level for a given number of `-v` flags: warn, info, then debug.
#[must_use]
pub fn level_for(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    }
}

/// Install the global logger. `RUST_LOG` directives take precedence over
/// the verbosity level. Calling this twice is a no-op.
pub fn init(verbosity: u8) {
    let _ = env_logger::Builder::new()
        .filter_level(level_for(verbosity))
        .parse_env("RUST_LOG")
        .format_timestamp(None)
        .format_target(false)
        .try_init();
}
