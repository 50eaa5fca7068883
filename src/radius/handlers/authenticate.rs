use crate::auth::{Authenticator, Decision, FailureReason, Source};
use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::{fmt, sync::Arc};
use tracing::{instrument, warn};
use utoipa::ToSchema;

/// Credentials relayed by the RADIUS server. The password arrives in clear text
/// (EAP-TTLS with PAP).
#[derive(ToSchema, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RadiusRequest {
    #[serde(default, alias = "UserName", alias = "username")]
    user_name: Option<String>,
    #[serde(default, alias = "Password")]
    password: Option<String>,
}

impl fmt::Debug for RadiusRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RadiusRequest")
            .field("user_name", &self.user_name)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct AuthenticateResponse {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl AuthenticateResponse {
    fn from_decision(decision: Decision) -> Self {
        Self {
            message: decision.detail().to_string(),
            source: Some(decision.source().map_or("none", Source::as_str).to_string()),
        }
    }
}

fn status_for(decision: Decision) -> StatusCode {
    match decision {
        Decision::Success(_) => StatusCode::OK,
        Decision::Failure(FailureReason::InvalidCredentials) => StatusCode::UNAUTHORIZED,
        Decision::Failure(FailureReason::ProviderUnavailableAndNotCached) => {
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

#[utoipa::path(
    post,
    path= "/api/radius/authenticate",
    request_body = RadiusRequest,
    responses (
        (status = 200, description = "Authenticated by the identity provider or by cache fallback", body = AuthenticateResponse, content_type = "application/json"),
        (status = 400, description = "Username and password are required", body = AuthenticateResponse),
        (status = 401, description = "Identity provider rejected the credentials", body = AuthenticateResponse),
        (status = 503, description = "Identity provider unreachable and no cached credentials", body = AuthenticateResponse),
    ),
    tag= "radius"
)]
// axum handler for authenticate
#[instrument(skip(authenticator, payload))]
pub async fn authenticate(
    authenticator: Extension<Arc<Authenticator>>,
    payload: Option<Json<RadiusRequest>>,
) -> impl IntoResponse {
    let (username, password) = match payload {
        Some(Json(RadiusRequest {
            user_name: Some(username),
            password: Some(password),
        })) if !username.is_empty() && !password.is_empty() => (username, password),

        _ => {
            warn!("Authentication attempt with missing username or password");

            return (
                StatusCode::BAD_REQUEST,
                Json(AuthenticateResponse {
                    message: "Username and password are required".to_string(),
                    source: None,
                }),
            );
        }
    };

    let password = SecretString::from(password);
    let decision = authenticator.authenticate(&username, &password).await;

    (
        status_for(decision),
        Json(AuthenticateResponse::from_decision(decision)),
    )
}
