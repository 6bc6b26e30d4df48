use axum::{
    body::Body,
    extract::State,
    http::{header, Request, StatusCode},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

/// Require `Authorization: Bearer <key>` on every control request.
pub async fn control_auth_middleware(
    State(api_key): State<Arc<str>>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    if let Some(token) = auth_header.and_then(|v| v.strip_prefix("Bearer ")) {
        if token == &*api_key {
            return Ok(next.run(request).await);
        }
    }

    tracing::warn!(path = %request.uri().path(), "Rejected unauthenticated control request");
    Err(StatusCode::UNAUTHORIZED)
}
