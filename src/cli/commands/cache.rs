use clap::{Arg, ArgMatches, Command};

pub const ARG_CACHE_TTL_MINUTES: &str = "cache-ttl-minutes";
pub const ARG_CACHE_SWEEP_SECONDS: &str = "cache-sweep-seconds";

/// One year.
const MAX_CACHE_TTL_MINUTES: u64 = 365 * 24 * 60;

#[derive(Debug)]
pub struct Options {
    pub ttl_minutes: u64,
    pub sweep_seconds: u64,
}

impl Options {
    #[must_use]
    pub fn parse(matches: &ArgMatches) -> Self {
        Self {
            ttl_minutes: matches
                .get_one::<u64>(ARG_CACHE_TTL_MINUTES)
                .copied()
                .unwrap_or(60),
            sweep_seconds: matches
                .get_one::<u64>(ARG_CACHE_SWEEP_SECONDS)
                .copied()
                .unwrap_or(300),
        }
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_CACHE_TTL_MINUTES)
                .long(ARG_CACHE_TTL_MINUTES)
                .help("Minutes a successful authentication stays usable for fallback")
                .env("ENTRA_RADIUS_CACHE_TTL_MINUTES")
                .default_value("60")
                .value_parser(clap::value_parser!(u64).range(1..=MAX_CACHE_TTL_MINUTES)),
        )
        .arg(
            Arg::new(ARG_CACHE_SWEEP_SECONDS)
                .long(ARG_CACHE_SWEEP_SECONDS)
                .help("Interval for purging expired cache entries, 0 disables the sweep")
                .env("ENTRA_RADIUS_CACHE_SWEEP_SECONDS")
                .default_value("300")
                .value_parser(clap::value_parser!(u64)),
        )
}
