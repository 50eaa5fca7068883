//! Log verbosity, from repeated `-v` flags or `ENTRA_RADIUS_LOG_LEVEL` (a level name or 0-4).

use clap::{Arg, ArgAction, ArgMatches, Command};
use tracing::Level;

pub const ARG_VERBOSITY: &str = "verbosity";

const LEVELS: [Level; 5] = [
    Level::ERROR,
    Level::WARN,
    Level::INFO,
    Level::DEBUG,
    Level::TRACE,
];

fn parse_verbosity(value: &str) -> Result<u8, String> {
    let value = value.trim();

    if let Ok(count) = value.parse::<u8>() {
        return Ok(count);
    }

    LEVELS
        .iter()
        .position(|level| level.as_str().eq_ignore_ascii_case(value))
        .and_then(|index| u8::try_from(index).ok())
        .ok_or_else(|| {
            format!("invalid log level '{value}', expected error, warn, info, debug or trace")
        })
}

/// Map a verbosity count to a tracing level. Counts past the last level saturate at TRACE.
#[must_use]
pub fn level_for(verbosity: u8) -> Level {
    LEVELS[usize::from(verbosity).min(LEVELS.len() - 1)]
}

/// Resolved log level, ERROR when nothing was given.
#[must_use]
pub fn level(matches: &ArgMatches) -> Level {
    level_for(matches.get_one::<u8>(ARG_VERBOSITY).copied().unwrap_or(0))
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command.arg(
        Arg::new(ARG_VERBOSITY)
            .short('v')
            .long("verbose")
            .help("Increase log verbosity, -v WARN up to -vvvv TRACE (default: ERROR)")
            .env("ENTRA_RADIUS_LOG_LEVEL")
            .global(true)
            .action(ArgAction::Count)
            .value_parser(parse_verbosity),
    )
}
