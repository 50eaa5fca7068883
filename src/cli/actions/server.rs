use crate::{
    auth::{
        cache::spawn_sweeper, Authenticator, AuthenticatorConfig, CredentialCache,
        EntraAuthenticator, EntraConfig,
    },
    radius,
};
use anyhow::Result;
use std::{sync::Arc, time::Duration};
use tracing::{debug, info};

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub entra: EntraConfig,
    pub cache_ttl_minutes: u64,
    pub cache_sweep_seconds: u64,
}

/// Execute the server action.
/// # Errors
/// Returns an error if the Entra client cannot be built or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    debug!("Server args: {:?}", args);

    let remote = Arc::new(EntraAuthenticator::new(&args.entra)?);
    let cache = Arc::new(CredentialCache::new());

    if args.cache_sweep_seconds > 0 {
        spawn_sweeper(cache.clone(), Duration::from_secs(args.cache_sweep_seconds));
    }

    let config = AuthenticatorConfig::new()
        .with_cache_ttl_minutes(args.cache_ttl_minutes)
        .with_verify_timeout(args.entra.timeout());

    info!(
        tenant_id = args.entra.tenant_id(),
        client_id = args.entra.client_id(),
        cache_ttl_minutes = args.cache_ttl_minutes,
        "Starting authentication service"
    );

    let authenticator = Arc::new(Authenticator::new(remote, cache, config));

    radius::new(args.port, authenticator).await
}
