//! Microsoft Entra ID verification via the OAuth2 resource owner password grant.

use super::remote::{AuthenticationOutcome, ProviderError, RemoteAuthenticator};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::time::Duration;
use tracing::{error, info, instrument, warn};
use url::Url;

pub const DEFAULT_AUTHORITY_HOST: &str = "https://login.microsoftonline.com";
pub const DEFAULT_SCOPE: &str = "https://graph.microsoft.com/.default";
const DEFAULT_TIMEOUT_SECONDS: u64 = 10;

#[derive(Clone, Debug)]
pub struct EntraConfig {
    tenant_id: String,
    client_id: String,
    scopes: Vec<String>,
    authority_host: String,
    timeout: Duration,
}

impl EntraConfig {
    #[must_use]
    pub fn new(tenant_id: String, client_id: String) -> Self {
        Self {
            tenant_id,
            client_id,
            scopes: vec![DEFAULT_SCOPE.to_string()],
            authority_host: DEFAULT_AUTHORITY_HOST.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECONDS),
        }
    }

    #[must_use]
    pub fn with_scopes(mut self, scopes: Vec<String>) -> Self {
        self.scopes = scopes;
        self
    }

    #[must_use]
    pub fn with_authority_host(mut self, authority_host: String) -> Self {
        self.authority_host = authority_host;
        self
    }

    #[must_use]
    pub fn with_timeout_seconds(mut self, seconds: u64) -> Self {
        self.timeout = Duration::from_secs(seconds);
        self
    }

    #[must_use]
    pub fn tenant_id(&self) -> &str {
        &self.tenant_id
    }

    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    #[must_use]
    pub fn scopes(&self) -> &[String] {
        &self.scopes
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// `{authority_host}/{tenant_id}/oauth2/v2.0/token`
    /// # Errors
    /// Returns an error if the authority host is not an http(s) URL.
    pub fn token_endpoint(&self) -> Result<Url> {
        let base = Url::parse(&format!("{}/", self.authority_host.trim_end_matches('/')))
            .with_context(|| format!("Invalid authority host: {}", self.authority_host))?;

        match base.scheme() {
            "http" | "https" => {}
            scheme => return Err(anyhow!("Unsupported authority scheme: {scheme}")),
        }

        base.join(&format!("{}/oauth2/v2.0/token", self.tenant_id))
            .context("Failed to build token endpoint")
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: Option<String>,
}

#[derive(Deserialize, Default)]
struct TokenErrorResponse {
    #[serde(default)]
    error: String,
    #[serde(default)]
    error_description: String,
}

#[derive(Debug)]
pub struct EntraAuthenticator {
    client: Client,
    token_url: Url,
    client_id: String,
    scope: String,
}

impl EntraAuthenticator {
    /// # Errors
    /// Returns an error if the token endpoint is invalid or the HTTP client cannot be built.
    pub fn new(config: &EntraConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(crate::APP_USER_AGENT)
            .timeout(config.timeout())
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            token_url: config.token_endpoint()?,
            client_id: config.client_id().to_string(),
            scope: config.scopes().join(" "),
        })
    }

    /// Run the token request and report whether a non-empty access token came back.
    async fn acquire_token(
        &self,
        username: &str,
        password: &SecretString,
    ) -> Result<bool, ProviderError> {
        let form = [
            ("client_id", self.client_id.as_str()),
            ("scope", self.scope.as_str()),
            ("username", username),
            ("password", password.expose_secret()),
            ("grant_type", "password"),
        ];

        let response = self
            .client
            .post(self.token_url.as_str())
            .form(&form)
            .send()
            .await?;

        let status = response.status();

        if !status.is_success() {
            let body: TokenErrorResponse = response.json().await.unwrap_or_default();

            if !body.error_description.is_empty() {
                warn!(
                    status = %status,
                    code = %body.error,
                    "token endpoint error: {}",
                    first_line(&body.error_description)
                );
            }

            return Err(ProviderError::from_status(status, body.error));
        }

        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Unexpected(e.to_string()))?;

        Ok(body.access_token.is_some_and(|token| !token.is_empty()))
    }
}

#[async_trait]
impl RemoteAuthenticator for EntraAuthenticator {
    #[instrument(skip(self, password))]
    async fn verify(&self, username: &str, password: &SecretString) -> AuthenticationOutcome {
        match self.acquire_token(username, password).await {
            Ok(true) => {
                info!("Successfully authenticated user with Entra");
                AuthenticationOutcome::Authenticated
            }

            Ok(false) => {
                warn!("Authentication failed - no access token received");
                AuthenticationOutcome::Rejected
            }

            Err(e) => {
                match &e {
                    ProviderError::Client { .. } => {
                        error!("Client error during authentication: {}", e);
                    }
                    _ => error!("Entra service error during authentication: {}", e),
                }

                e.outcome()
            }
        }
    }
}

// Entra descriptions carry trace ids and timestamps on later lines.
fn first_line(description: &str) -> &str {
    description.lines().next().unwrap_or_default()
}
