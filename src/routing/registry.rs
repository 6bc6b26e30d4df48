//! Concurrency-safe route collection.
//!
//! # Responsibilities
//! - Keep routes in insertion order
//! - Assign IDs to routes registered without one
//! - Hand out deep-copied snapshots to readers
//!
//! # Design Decisions
//! - One fair reader/writer lock (`parking_lot::RwLock`) guards the whole list
//! - Snapshots are owned `Vec<Route>` clones, never views into the live list
//! - Every mutation bumps a generation so rebuilt tables can be ordered

use parking_lot::RwLock;
use thiserror::Error;
use uuid::Uuid;

use crate::routing::route::Route;

/// Errors returned by registry mutations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("route {0:?} not found")]
    RouteNotFound(String),
}

#[derive(Debug, Default)]
struct RouteList {
    routes: Vec<Route>,
    generation: u64,
}

/// Ordered, shared collection of routes.
#[derive(Debug, Default)]
pub struct RouteRegistry {
    inner: RwLock<RouteList>,
}

impl RouteRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a route at the end of the list, assigning an ID if it has none.
    pub fn append(&self, mut route: Route) -> Route {
        if route.id.is_empty() {
            route.id = Uuid::new_v4().to_string();
        }

        let mut list = self.inner.write();
        list.routes.push(route.clone());
        list.generation += 1;
        drop(list);

        tracing::debug!(route_id = %route.id, method = %route.method, pattern = %route.pattern, "Route appended");
        route
    }

    /// Remove the route with the given ID.
    pub fn delete(&self, id: &str) -> Result<(), RegistryError> {
        let mut list = self.inner.write();
        let position = list
            .routes
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| RegistryError::RouteNotFound(id.to_string()))?;
        list.routes.remove(position);
        list.generation += 1;
        drop(list);

        tracing::debug!(route_id = %id, "Route deleted");
        Ok(())
    }

    /// Copy of the route with the given ID.
    pub fn get(&self, id: &str) -> Option<Route> {
        self.inner.read().routes.iter().find(|r| r.id == id).cloned()
    }

    /// Independent copy of the current route list.
    pub fn snapshot(&self) -> Vec<Route> {
        self.inner.read().routes.clone()
    }

    /// Snapshot together with the generation it was taken at.
    pub fn versioned_snapshot(&self) -> (u64, Vec<Route>) {
        let list = self.inner.read();
        (list.generation, list.routes.clone())
    }

    pub fn len(&self) -> usize {
        self.inner.read().routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
