//! Control plane: operator-facing route management.
//!
//! # Endpoints
//! ```text
//! GET    /routes        → 200 + JSON array of routes
//! POST   /routes        → 201 + stored route | 400 bad JSON | 422 invalid route
//! GET    /routes/{id}   → 200 + route | 404
//! DELETE /routes/{id}   → 204 | 404
//! ```
//!
//! Every successful mutation rebuilds the router from a fresh snapshot.

pub mod auth;
pub mod handlers;

use std::sync::Arc;

use axum::{middleware, routing::get, Router};
use tower_http::trace::TraceLayer;

use crate::routing::{RouteRegistry, SwappableRouter};
use self::auth::control_auth_middleware;
use self::handlers::*;

/// State shared by the control handlers.
#[derive(Clone)]
pub struct ControlState {
    pub registry: Arc<RouteRegistry>,
    pub router: Arc<SwappableRouter>,
}

/// Build the control plane router, optionally guarded by a bearer key.
pub fn setup_control_router(state: ControlState, api_key: Option<&str>) -> Router {
    let router = Router::new()
        .route("/routes", get(list_routes).post(add_route))
        .route("/routes/{id}", get(get_route).delete(remove_route))
        .with_state(state);

    let router = match api_key {
        Some(key) => router.layer(middleware::from_fn_with_state(
            Arc::<str>::from(key),
            control_auth_middleware,
        )),
        None => router,
    };

    router.layer(TraceLayer::new_for_http())
}
