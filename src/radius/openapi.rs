use super::handlers::{authenticate, health, AuthenticateResponse, Health, RadiusRequest};
use axum::{response::IntoResponse, Json};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(authenticate::authenticate, health::health),
    components(schemas(RadiusRequest, AuthenticateResponse, Health)),
    tags(
        (name = "radius", description = "RADIUS credential verification"),
        (name = "health", description = "Service health")
    )
)]
pub struct ApiDoc;

#[must_use]
pub fn openapi() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}

pub async fn openapi_json() -> impl IntoResponse {
    Json(openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn documents_every_route() {
        let doc = openapi();
        assert!(doc.paths.paths.contains_key("/api/radius/authenticate"));
        assert!(doc.paths.paths.contains_key("/health"));
    }
}
