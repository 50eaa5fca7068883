//! Remote credential verification.

use async_trait::async_trait;
use reqwest::StatusCode;
use secrecy::SecretString;

/// Result of asking the identity provider about a credential pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuthenticationOutcome {
    Authenticated,
    /// The provider answered and the credentials are not acceptable.
    Rejected,
    /// The provider could not give an answer. Eligible for cache fallback.
    ProviderUnavailable,
}

/// Capability to verify a (username, password) pair against an identity provider.
///
/// Callers guarantee both values are non-empty.
#[async_trait]
pub trait RemoteAuthenticator: Send + Sync {
    async fn verify(&self, username: &str, password: &SecretString) -> AuthenticationOutcome;
}

/// OAuth2 error codes describing a provider-side condition (RFC 6749 section 5.2).
const TRANSIENT_ERROR_CODES: [&str; 2] = ["temporarily_unavailable", "server_error"];

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// Provider-side failure: 5xx, throttling, request timeout, or a transient OAuth error code.
    #[error("identity provider service error {status}: {code}")]
    Service { status: StatusCode, code: String },

    /// Caller-fixable failure: bad grant, scope, client or request.
    #[error("identity provider rejected the request {status}: {code}")]
    Client { status: StatusCode, code: String },

    #[error("identity provider unreachable: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected identity provider response: {0}")]
    Unexpected(String),
}

impl ProviderError {
    /// Classify a non-success HTTP status. Transient OAuth codes win over the status,
    /// since the token endpoint may send them with a 400.
    #[must_use]
    pub fn from_status(status: StatusCode, code: String) -> Self {
        if TRANSIENT_ERROR_CODES.contains(&code.as_str())
            || status.is_server_error()
            || status == StatusCode::TOO_MANY_REQUESTS
            || status == StatusCode::REQUEST_TIMEOUT
        {
            Self::Service { status, code }
        } else if status.is_client_error() {
            Self::Client { status, code }
        } else {
            Self::Unexpected(format!("{status}: {code}"))
        }
    }

    /// Only client errors are definitive; everything else falls through to the cache.
    #[must_use]
    pub fn outcome(&self) -> AuthenticationOutcome {
        match self {
            Self::Client { .. } => AuthenticationOutcome::Rejected,
            Self::Service { .. } | Self::Transport(_) | Self::Unexpected(_) => {
                AuthenticationOutcome::ProviderUnavailable
            }
        }
    }
}
