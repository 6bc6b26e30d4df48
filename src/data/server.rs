//! Data plane router.
//!
//! Every route is keyed by the handler ID in the path. Unknown or malformed
//! IDs answer 404 before any accessor runs.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Path, State},
    response::Response,
    routing::{get, put},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::broker::{Handler, HandlerRegistry};
use crate::data::resource::{self, DataError};

/// State shared by the data plane handlers.
#[derive(Clone)]
pub struct DataState {
    pub handlers: Arc<HandlerRegistry>,
}

impl DataState {
    fn handler(&self, id: &str) -> Result<Arc<Handler>, DataError> {
        Ok(self.handlers.lookup_str(id)?)
    }
}

/// Build the data plane router.
pub fn router(handlers: Arc<HandlerRegistry>, max_body_size: usize) -> Router {
    Router::new()
        .route("/handlers/{id}/request/body", get(request_body))
        .route("/handlers/{id}/request/method", get(request_method))
        .route("/handlers/{id}/request/host", get(request_host))
        .route("/handlers/{id}/request/path", get(request_path))
        .route("/handlers/{id}/request/matches/{name}", get(request_match))
        .route("/handlers/{id}/request/params/{name}", get(request_param))
        .route("/handlers/{id}/request/headers/{name}", get(request_header))
        .route("/handlers/{id}/request/cookies/{name}", get(request_cookie))
        .route("/handlers/{id}/response/status", put(response_status))
        .route("/handlers/{id}/response/headers/{name}", put(response_header))
        .route("/handlers/{id}/response/body", put(response_body))
        .layer(DefaultBodyLimit::max(max_body_size))
        .layer(TraceLayer::new_for_http())
        .with_state(DataState { handlers })
}

async fn request_body(
    State(state): State<DataState>,
    Path(id): Path<String>,
) -> Result<Response, DataError> {
    let handler = state.handler(&id)?;
    resource::get_request_body(&handler).await
}

async fn request_method(
    State(state): State<DataState>,
    Path(id): Path<String>,
) -> Result<Response, DataError> {
    Ok(resource::get_request_method(&*state.handler(&id)?))
}

async fn request_host(
    State(state): State<DataState>,
    Path(id): Path<String>,
) -> Result<Response, DataError> {
    Ok(resource::get_request_host(&*state.handler(&id)?))
}

async fn request_path(
    State(state): State<DataState>,
    Path(id): Path<String>,
) -> Result<Response, DataError> {
    Ok(resource::get_request_path(&*state.handler(&id)?))
}

async fn request_match(
    State(state): State<DataState>,
    Path((id, name)): Path<(String, String)>,
) -> Result<Response, DataError> {
    resource::get_request_match(&*state.handler(&id)?, &name)
}

async fn request_param(
    State(state): State<DataState>,
    Path((id, name)): Path<(String, String)>,
) -> Result<Response, DataError> {
    resource::get_request_param(&*state.handler(&id)?, &name)
}

async fn request_header(
    State(state): State<DataState>,
    Path((id, name)): Path<(String, String)>,
) -> Result<Response, DataError> {
    resource::get_request_header(&*state.handler(&id)?, &name)
}

async fn request_cookie(
    State(state): State<DataState>,
    Path((id, name)): Path<(String, String)>,
) -> Result<Response, DataError> {
    resource::get_request_cookie(&*state.handler(&id)?, &name)
}

async fn response_status(
    State(state): State<DataState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Response, DataError> {
    resource::set_response_status(&*state.handler(&id)?, &body)
}

async fn response_header(
    State(state): State<DataState>,
    Path((id, name)): Path<(String, String)>,
    body: Bytes,
) -> Result<Response, DataError> {
    resource::set_response_header(&*state.handler(&id)?, &name, &body)
}

async fn response_body(
    State(state): State<DataState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Response, DataError> {
    Ok(resource::set_response_body(&*state.handler(&id)?, &body))
}
