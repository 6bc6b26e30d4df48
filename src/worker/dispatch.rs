//! Dispatch of matched requests to workers.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
};

use crate::broker::{Handler, HandlerRegistry};
use crate::observability::metrics;
use crate::routing::{Dispatcher, RouteMatch};
use crate::worker::{Spawner, WorkerError, WorkerJob};

/// Registers the live request, runs a worker for it and answers with the
/// response the worker composed.
#[derive(Clone)]
pub struct WorkerDispatcher {
    handlers: Arc<HandlerRegistry>,
    spawner: Arc<dyn Spawner>,
}

impl WorkerDispatcher {
    pub fn new(handlers: Arc<HandlerRegistry>, spawner: Arc<dyn Spawner>) -> Self {
        Self { handlers, spawner }
    }
}

impl Dispatcher for WorkerDispatcher {
    async fn dispatch(&self, matched: RouteMatch, request: Request<Body>) -> Response {
        let start_time = Instant::now();
        let route = matched.route.clone();

        // Dropping the guard deregisters the handler, also when the client
        // goes away and this future is cancelled.
        let guard = self.handlers.register_scoped(Handler::new(matched, request));
        let handler_id = guard.id();

        let job = WorkerJob {
            route: route.clone(),
            handler_id,
        };

        let response = match self.spawner.spawn(job).await {
            Ok(exit) => {
                if exit.success() {
                    metrics::record_worker_run("success");
                } else {
                    metrics::record_worker_run("failure");
                    tracing::warn!(handler_id = %handler_id, route_id = %route.id, code = ?exit.code, "Worker exited unsuccessfully");
                }
                guard.handler().take_response()
            }
            Err(WorkerError::Timeout(secs)) => {
                metrics::record_worker_run("timeout");
                tracing::warn!(handler_id = %handler_id, route_id = %route.id, timeout_secs = secs, "Worker timed out");
                (StatusCode::GATEWAY_TIMEOUT, "Worker timed out").into_response()
            }
            Err(e) => {
                metrics::record_worker_run("error");
                tracing::error!(handler_id = %handler_id, route_id = %route.id, error = %e, "Worker failed to run");
                (StatusCode::INTERNAL_SERVER_ERROR, "Worker failed to run").into_response()
            }
        };

        tracing::debug!(
            handler_id = %handler_id,
            route_id = %route.id,
            status = %response.status(),
            elapsed_ms = start_time.elapsed().as_millis() as u64,
            "Request served"
        );
        response
    }
}
