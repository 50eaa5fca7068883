//! Map validated CLI arguments to the action to run.

use crate::auth::EntraConfig;
use crate::cli::actions::{server::Args, Action};
use crate::cli::commands::{cache, entra, ARG_PORT};
use anyhow::{Context, Result};

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>(ARG_PORT).copied().unwrap_or(8080);

    let entra_opts = entra::Options::parse(matches)?;
    let cache_opts = cache::Options::parse(matches);

    let entra_config = EntraConfig::new(entra_opts.tenant_id, entra_opts.client_id)
        .with_scopes(entra_opts.scopes)
        .with_authority_host(entra_opts.authority_host)
        .with_timeout_seconds(entra_opts.timeout_seconds);

    // Fail at startup rather than on the first request.
    entra_config
        .token_endpoint()
        .context("invalid ENTRA_RADIUS_AUTHORITY_HOST")?;

    Ok(Action::Server(Args {
        port,
        entra: entra_config,
        cache_ttl_minutes: cache_opts.ttl_minutes,
        cache_sweep_seconds: cache_opts.sweep_seconds,
    }))
}
