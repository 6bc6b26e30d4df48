//! Hot-swappable router.
//!
//! # Responsibilities
//! - Hold the routing table currently in effect
//! - Swap in rebuilt tables while requests are in flight
//! - Dispatch matched requests, answer 404 otherwise
//!
//! # Design Decisions
//! - Fair reader/writer lock around a single `Arc<RoutingTable>`
//! - The lock only covers cloning the `Arc`; dispatch runs unlocked on the
//!   captured table so long requests never delay a swap
//! - Rebuilds only install tables newer than the current one

use std::future::Future;
use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
};
use parking_lot::RwLock;

use crate::routing::registry::RouteRegistry;
use crate::routing::table::{RouteMatch, RoutingTable};

/// Runs a request that matched a route.
pub trait Dispatcher: Send + Sync {
    fn dispatch(
        &self,
        matched: RouteMatch,
        request: Request<Body>,
    ) -> impl Future<Output = Response> + Send;
}

/// Concurrency-safe holder of the current routing table.
#[derive(Debug, Default)]
pub struct SwappableRouter {
    table: RwLock<Arc<RoutingTable>>,
}

impl SwappableRouter {
    pub fn new(table: RoutingTable) -> Self {
        Self {
            table: RwLock::new(Arc::new(table)),
        }
    }

    /// The table in effect right now.
    pub fn get(&self) -> Arc<RoutingTable> {
        Arc::clone(&self.table.read())
    }

    /// Replace the table unconditionally.
    pub fn set(&self, table: RoutingTable) {
        *self.table.write() = Arc::new(table);
    }

    /// Replace the table unless the current one was built from a newer
    /// registry generation. Returns whether the table was installed.
    pub fn set_if_newer(&self, table: RoutingTable) -> bool {
        let mut current = self.table.write();
        if table.generation() < current.generation() {
            return false;
        }
        *current = Arc::new(table);
        true
    }

    /// Rebuild from the registry and install the result.
    ///
    /// The registry lock is released before the router lock is taken.
    pub fn rebuild(&self, registry: &RouteRegistry) {
        let (generation, routes) = registry.versioned_snapshot();
        let count = routes.len();
        let installed = self.set_if_newer(RoutingTable::with_generation(routes, generation));

        crate::observability::metrics::record_route_count(count);
        tracing::info!(generation, routes = count, installed, "Routing table rebuilt");
    }

    /// Match the request against the current table and dispatch it.
    pub async fn serve<D: Dispatcher>(&self, request: Request<Body>, dispatcher: &D) -> Response {
        let table = self.get();
        let matched = table.find(request.method(), request.uri().path());

        match matched {
            Some(matched) => dispatcher.dispatch(matched, request).await,
            None => {
                tracing::debug!(method = %request.method(), path = %request.uri().path(), "No route matched");
                (StatusCode::NOT_FOUND, "No matching route found").into_response()
            }
        }
    }
}
