use crate::auth::entra::{DEFAULT_AUTHORITY_HOST, DEFAULT_SCOPE};
use anyhow::{bail, Result};
use clap::{Arg, ArgMatches, Command};

pub const ARG_TENANT_ID: &str = "tenant-id";
pub const ARG_CLIENT_ID: &str = "client-id";
pub const ARG_SCOPES: &str = "scopes";
pub const ARG_AUTHORITY_HOST: &str = "authority-host";
pub const ARG_PROVIDER_TIMEOUT_SECONDS: &str = "provider-timeout-seconds";

#[derive(Debug)]
pub struct Options {
    pub tenant_id: String,
    pub client_id: String,
    pub scopes: Vec<String>,
    pub authority_host: String,
    pub timeout_seconds: u64,
}

impl Options {
    /// Parse Entra arguments from matches.
    ///
    /// # Errors
    /// Returns an error if required arguments are missing or empty.
    pub fn parse(matches: &ArgMatches) -> Result<Self> {
        // clap passes through empty env vars, so filter them here
        let get_non_empty = |id: &str| {
            matches
                .get_one::<String>(id)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let Some(tenant_id) = get_non_empty(ARG_TENANT_ID) else {
            bail!("missing required argument: --{ARG_TENANT_ID}");
        };

        let Some(client_id) = get_non_empty(ARG_CLIENT_ID) else {
            bail!("missing required argument: --{ARG_CLIENT_ID}");
        };

        let scopes: Vec<String> = matches
            .get_many::<String>(ARG_SCOPES)
            .map(|values| {
                values
                    .map(|v| v.trim().to_string())
                    .filter(|v| !v.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        if scopes.is_empty() {
            bail!("at least one scope is required: --{ARG_SCOPES}");
        }

        let authority_host = get_non_empty(ARG_AUTHORITY_HOST)
            .unwrap_or_else(|| DEFAULT_AUTHORITY_HOST.to_string());

        let timeout_seconds = matches
            .get_one::<u64>(ARG_PROVIDER_TIMEOUT_SECONDS)
            .copied()
            .unwrap_or(10);

        Ok(Self {
            tenant_id,
            client_id,
            scopes,
            authority_host,
            timeout_seconds,
        })
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_TENANT_ID)
                .long(ARG_TENANT_ID)
                .help("Entra tenant (directory) id")
                .env("ENTRA_RADIUS_TENANT_ID")
                .required(true),
        )
        .arg(
            Arg::new(ARG_CLIENT_ID)
                .long(ARG_CLIENT_ID)
                .help("Entra application (client) id")
                .env("ENTRA_RADIUS_CLIENT_ID")
                .required(true),
        )
        .arg(
            Arg::new(ARG_SCOPES)
                .long(ARG_SCOPES)
                .help("Comma separated scopes requested with the password grant")
                .env("ENTRA_RADIUS_SCOPES")
                .value_delimiter(',')
                .default_value(DEFAULT_SCOPE),
        )
        .arg(
            Arg::new(ARG_AUTHORITY_HOST)
                .long(ARG_AUTHORITY_HOST)
                .help("Identity provider authority host")
                .env("ENTRA_RADIUS_AUTHORITY_HOST")
                .default_value(DEFAULT_AUTHORITY_HOST),
        )
        .arg(
            Arg::new(ARG_PROVIDER_TIMEOUT_SECONDS)
                .long(ARG_PROVIDER_TIMEOUT_SECONDS)
                .help("Seconds to wait for the identity provider before falling back to the cache")
                .env("ENTRA_RADIUS_PROVIDER_TIMEOUT_SECONDS")
                .default_value("10")
                .value_parser(clap::value_parser!(u64).range(1..)),
        )
}
