//! Request identification.
//!
//! # Responsibilities
//! - Attach a UUID `x-request-id` to every user-plane request
//! - Echo it back to the client and record it on the request span
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - Client-supplied IDs are kept, not replaced

use axum::{
    body::Body,
    http::{HeaderName, Request},
};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tracing::Span;

pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// The request ID, or `"unknown"` when the layer has not run.
pub fn request_id<B>(request: &Request<B>) -> &str {
    request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
}

pub fn set_request_id_layer() -> SetRequestIdLayer<MakeRequestUuid> {
    SetRequestIdLayer::new(X_REQUEST_ID, MakeRequestUuid)
}

pub fn propagate_request_id_layer() -> PropagateRequestIdLayer {
    PropagateRequestIdLayer::new(X_REQUEST_ID)
}

/// Span for one user-plane request.
pub fn request_span(request: &Request<Body>) -> Span {
    tracing::info_span!(
        "request",
        request_id = %request_id(request),
        method = %request.method(),
        path = %request.uri().path(),
    )
}
