//! Authentication decisions: remote verification first, cached fallback when the
//! identity provider cannot answer.
//!
//! ```text
//! verify ──Authenticated──────▶ remember ─▶ Success(remote)
//!   │ ───Rejected─────────────▶ Failure(invalid_credentials)
//!   └────ProviderUnavailable──▶ validate ─┬─ true ─▶ Success(cache)
//!                                         └─ false ▶ Failure(provider_unavailable_and_not_cached)
//! ```
//!
//! A rejection never touches the cache, and a verification that times out or is
//! abandoned never writes to it.

pub mod cache;
pub mod entra;
pub mod fingerprint;
pub mod remote;

pub use cache::{CredentialCache, CredentialStore, MemoryStore};
pub use entra::{EntraAuthenticator, EntraConfig};
pub use remote::{AuthenticationOutcome, ProviderError, RemoteAuthenticator};

use secrecy::SecretString;
use serde::Serialize;
use std::{fmt, sync::Arc, time::Duration};
use tracing::{info, instrument, warn};

const DEFAULT_CACHE_TTL_MINUTES: u64 = 60;
const DEFAULT_VERIFY_TIMEOUT_SECONDS: u64 = 10;

/// Where a successful decision came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Remote,
    Cache,
}

impl Source {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Remote => "remote",
            Self::Cache => "cache",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    InvalidCredentials,
    ProviderUnavailableAndNotCached,
}

/// Terminal state of one authentication attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Decision {
    Success(Source),
    Failure(FailureReason),
}

impl Decision {
    #[must_use]
    pub const fn is_success(self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// `None` for failures.
    #[must_use]
    pub const fn source(self) -> Option<Source> {
        match self {
            Self::Success(source) => Some(source),
            Self::Failure(_) => None,
        }
    }

    #[must_use]
    pub const fn detail(self) -> &'static str {
        match self {
            Self::Success(Source::Cache) => "Authentication successful (fallback)",
            Self::Success(Source::Remote) => "Authentication successful",
            Self::Failure(FailureReason::InvalidCredentials) => "Authentication failed",
            Self::Failure(FailureReason::ProviderUnavailableAndNotCached) => {
                "Authentication failed - identity provider is unreachable and user not found in cache"
            }
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct AuthenticatorConfig {
    cache_ttl: Duration,
    verify_timeout: Duration,
}

impl AuthenticatorConfig {
    /// Defaults: 60 minute cache TTL and a 10 second verification bound.
    #[must_use]
    pub fn new() -> Self {
        Self {
            cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_MINUTES * 60),
            verify_timeout: Duration::from_secs(DEFAULT_VERIFY_TIMEOUT_SECONDS),
        }
    }

    #[must_use]
    pub fn with_cache_ttl_minutes(mut self, minutes: u64) -> Self {
        self.cache_ttl = Duration::from_secs(minutes.saturating_mul(60));
        self
    }

    #[must_use]
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    #[must_use]
    pub fn with_verify_timeout(mut self, timeout: Duration) -> Self {
        self.verify_timeout = timeout;
        self
    }

    #[must_use]
    pub fn cache_ttl(&self) -> Duration {
        self.cache_ttl
    }

    #[must_use]
    pub fn verify_timeout(&self) -> Duration {
        self.verify_timeout
    }
}

impl Default for AuthenticatorConfig {
    fn default() -> Self {
        Self::new()
    }
}

pub struct Authenticator {
    remote: Arc<dyn RemoteAuthenticator>,
    cache: Arc<CredentialCache>,
    config: AuthenticatorConfig,
}

impl Authenticator {
    #[must_use]
    pub fn new(
        remote: Arc<dyn RemoteAuthenticator>,
        cache: Arc<CredentialCache>,
        config: AuthenticatorConfig,
    ) -> Self {
        Self {
            remote,
            cache,
            config,
        }
    }

    #[must_use]
    pub fn cache(&self) -> &Arc<CredentialCache> {
        &self.cache
    }

    /// Decide one authentication attempt. Both values must be non-empty.
    #[instrument(skip(self, password))]
    pub async fn authenticate(&self, username: &str, password: &SecretString) -> Decision {
        let outcome = match tokio::time::timeout(
            self.config.verify_timeout,
            self.remote.verify(username, password),
        )
        .await
        {
            Ok(outcome) => outcome,
            Err(_) => {
                warn!(
                    timeout_seconds = self.config.verify_timeout.as_secs(),
                    "identity provider verification timed out"
                );
                AuthenticationOutcome::ProviderUnavailable
            }
        };

        match outcome {
            AuthenticationOutcome::Authenticated => {
                self.cache.remember(username, password, self.config.cache_ttl);
                info!("user authenticated successfully via identity provider");

                Decision::Success(Source::Remote)
            }

            AuthenticationOutcome::Rejected => {
                warn!("user failed authentication via identity provider");

                Decision::Failure(FailureReason::InvalidCredentials)
            }

            AuthenticationOutcome::ProviderUnavailable => {
                warn!("identity provider is unreachable, attempting cache fallback");

                if self.cache.validate(username, password) {
                    info!("user authenticated successfully via cache fallback");

                    Decision::Success(Source::Cache)
                } else {
                    warn!("user failed authentication via cache fallback");

                    Decision::Failure(FailureReason::ProviderUnavailableAndNotCached)
                }
            }
        }
    }
}

impl fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Authenticator")
            .field("cache", &self.cache)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::cache::tests::ManualClock;
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Remote that replays a scripted outcome and counts calls.
    struct Scripted {
        outcome: Mutex<AuthenticationOutcome>,
        calls: AtomicUsize,
        delay: Option<Duration>,
    }

    impl Scripted {
        fn new(outcome: AuthenticationOutcome) -> Arc<Self> {
            Arc::new(Self {
                outcome: Mutex::new(outcome),
                calls: AtomicUsize::new(0),
                delay: None,
            })
        }

        fn slow(outcome: AuthenticationOutcome, delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                outcome: Mutex::new(outcome),
                calls: AtomicUsize::new(0),
                delay: Some(delay),
            })
        }

        fn set(&self, outcome: AuthenticationOutcome) {
            if let Ok(mut current) = self.outcome.lock() {
                *current = outcome;
            }
        }
    }

    #[async_trait]
    impl RemoteAuthenticator for Scripted {
        async fn verify(&self, _username: &str, _password: &SecretString) -> AuthenticationOutcome {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.outcome
                .lock()
                .map_or(AuthenticationOutcome::ProviderUnavailable, |o| *o)
        }
    }

    fn secret(value: &str) -> SecretString {
        SecretString::from(value.to_string())
    }

    fn authenticator(remote: Arc<Scripted>) -> (Authenticator, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        let cache = Arc::new(CredentialCache::with_parts(
            Arc::new(MemoryStore::new()),
            clock.clone(),
        ));
        let config = AuthenticatorConfig::new().with_verify_timeout(Duration::from_millis(200));
        (Authenticator::new(remote, cache, config), clock)
    }

    #[tokio::test]
    async fn authenticated_succeeds_remotely_and_caches() {
        let remote = Scripted::new(AuthenticationOutcome::Authenticated);
        let (auth, _) = authenticator(remote.clone());

        let decision = auth.authenticate("alice", &secret("pw")).await;

        assert_eq!(decision, Decision::Success(Source::Remote));
        assert!(auth.cache().validate("alice", &secret("pw")));
        assert!(!auth.cache().validate("alice", &secret("pw2")));
        assert_eq!(remote.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn rejected_fails_without_touching_cache() {
        let remote = Scripted::new(AuthenticationOutcome::Authenticated);
        let (auth, clock) = authenticator(remote.clone());
        auth.authenticate("alice", &secret("pw")).await;

        remote.set(AuthenticationOutcome::Rejected);
        clock.advance(Duration::from_secs(30 * 60));
        let decision = auth.authenticate("alice", &secret("wrong")).await;
        assert_eq!(
            decision,
            Decision::Failure(FailureReason::InvalidCredentials)
        );

        // The earlier entry keeps its fingerprint and original expiry.
        assert!(auth.cache().validate("alice", &secret("pw")));
        clock.advance(Duration::from_secs(30 * 60));
        assert!(!auth.cache().validate("alice", &secret("pw")));
    }

    #[tokio::test]
    async fn rejected_does_not_cache_new_user() {
        let (auth, _) = authenticator(Scripted::new(AuthenticationOutcome::Rejected));
        auth.authenticate("mallory", &secret("pw")).await;
        assert!(auth.cache().is_empty());
    }

    #[tokio::test]
    async fn unavailable_without_cache_entry_fails() {
        let (auth, _) = authenticator(Scripted::new(AuthenticationOutcome::ProviderUnavailable));

        let decision = auth.authenticate("alice", &secret("pw")).await;

        assert_eq!(
            decision,
            Decision::Failure(FailureReason::ProviderUnavailableAndNotCached)
        );
        assert_eq!(decision.source(), None);
    }

    #[tokio::test]
    async fn unavailable_with_cache_entry_succeeds_from_cache() {
        let remote = Scripted::new(AuthenticationOutcome::Authenticated);
        let (auth, _) = authenticator(remote.clone());
        auth.authenticate("Alice", &secret("pw")).await;

        remote.set(AuthenticationOutcome::ProviderUnavailable);

        for _ in 0..3 {
            let decision = auth.authenticate("alice", &secret("pw")).await;
            assert_eq!(decision, Decision::Success(Source::Cache));
        }

        let decision = auth.authenticate("alice", &secret("not-pw")).await;
        assert_eq!(
            decision,
            Decision::Failure(FailureReason::ProviderUnavailableAndNotCached)
        );
    }

    #[tokio::test]
    async fn unavailable_after_expiry_fails() {
        let remote = Scripted::new(AuthenticationOutcome::Authenticated);
        let (auth, clock) = authenticator(remote.clone());
        auth.authenticate("alice", &secret("pw")).await;

        remote.set(AuthenticationOutcome::ProviderUnavailable);
        clock.advance(Duration::from_secs(60 * 60));

        let decision = auth.authenticate("alice", &secret("pw")).await;
        assert_eq!(
            decision,
            Decision::Failure(FailureReason::ProviderUnavailableAndNotCached)
        );
    }

    #[tokio::test]
    async fn verification_timeout_is_unavailable_and_not_cached() {
        let remote = Scripted::slow(AuthenticationOutcome::Authenticated, Duration::from_secs(5));
        let (auth, _) = authenticator(remote);

        let decision = auth.authenticate("alice", &secret("pw")).await;

        assert_eq!(
            decision,
            Decision::Failure(FailureReason::ProviderUnavailableAndNotCached)
        );
        assert!(auth.cache().is_empty());
    }

    #[tokio::test]
    async fn abandoned_attempt_writes_nothing() {
        let remote = Scripted::slow(AuthenticationOutcome::Authenticated, Duration::from_secs(5));
        let clock = Arc::new(ManualClock::new());
        let cache = Arc::new(CredentialCache::with_parts(
            Arc::new(MemoryStore::new()),
            clock,
        ));
        let auth = Arc::new(Authenticator::new(
            remote,
            cache.clone(),
            AuthenticatorConfig::new(),
        ));

        let task = tokio::spawn({
            let auth = auth.clone();
            async move { auth.authenticate("alice", &secret("pw")).await }
        });
        tokio::time::sleep(Duration::from_millis(50)).await;
        task.abort();
        assert!(task.await.is_err());

        assert!(cache.is_empty());
    }

    #[test]
    fn decision_details() {
        assert_eq!(Decision::Success(Source::Remote).source(), Some(Source::Remote));
        assert_eq!(Source::Remote.as_str(), "remote");
        assert_eq!(Source::Cache.to_string(), "cache");
        assert_eq!(
            Decision::Failure(FailureReason::InvalidCredentials).source(),
            None
        );
        assert!(Decision::Success(Source::Cache).is_success());
        assert!(!Decision::Failure(FailureReason::InvalidCredentials).is_success());
        assert_eq!(
            Decision::Failure(FailureReason::InvalidCredentials).detail(),
            "Authentication failed"
        );
    }

    #[test]
    fn config_ttl_in_minutes() {
        let config = AuthenticatorConfig::new().with_cache_ttl_minutes(5);
        assert_eq!(config.cache_ttl(), Duration::from_secs(300));
        assert_eq!(
            AuthenticatorConfig::default().cache_ttl(),
            Duration::from_secs(3600)
        );
    }
}
