use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::control::ControlState;
use crate::routing::Route;

pub async fn list_routes(State(state): State<ControlState>) -> Json<Vec<Route>> {
    Json(state.registry.snapshot())
}

pub async fn get_route(
    State(state): State<ControlState>,
    Path(id): Path<String>,
) -> Response {
    match state.registry.get(&id) {
        Some(route) => Json(route).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// Parse the body by hand: any JSON error is a 400, a well-formed route
/// missing method or pattern is a 422.
pub async fn add_route(State(state): State<ControlState>, body: Bytes) -> Response {
    let route: Route = match serde_json::from_slice(&body) {
        Ok(route) => route,
        Err(e) => {
            tracing::debug!(error = %e, "Rejected malformed route JSON");
            return (StatusCode::BAD_REQUEST, e.to_string()).into_response();
        }
    };

    if let Err(e) = route.validate() {
        tracing::debug!(error = %e, "Rejected invalid route");
        return (StatusCode::UNPROCESSABLE_ENTITY, e.to_string()).into_response();
    }

    let created = state.registry.append(route);
    state.router.rebuild(&state.registry);

    tracing::info!(route_id = %created.id, method = %created.method, pattern = %created.pattern, "Route added");
    (StatusCode::CREATED, Json(created)).into_response()
}

pub async fn remove_route(
    State(state): State<ControlState>,
    Path(id): Path<String>,
) -> StatusCode {
    match state.registry.delete(&id) {
        Ok(()) => {
            state.router.rebuild(&state.registry);
            tracing::info!(route_id = %id, "Route removed");
            StatusCode::NO_CONTENT
        }
        Err(e) => {
            tracing::debug!(error = %e, "Route removal missed");
            StatusCode::NOT_FOUND
        }
    }
}
