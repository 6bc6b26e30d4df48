//! Registry of live handlers keyed by an unguessable ID.
//!
//! # Responsibilities
//! - Mint a unique ID per in-flight request
//! - Serve lookups from the data plane (hot path)
//! - Deregister exactly once per request, on every exit path
//!
//! # Design Decisions
//! - `DashMap` shards the map, lookups on unrelated IDs never serialize
//! - IDs are random UUID v4 values, they act as capability tokens
//! - Lookups hand out `Arc<Handler>`; a late lookup after deregistration
//!   fails cleanly while earlier holders keep a valid reference
//! - `HandlerGuard` deregisters on drop, including cancellation and panics

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use dashmap::{mapref::entry::Entry, DashMap};
use thiserror::Error;
use uuid::Uuid;

use crate::broker::handler::Handler;
use crate::observability::metrics;

/// Identifier of a live handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(Uuid);

impl HandlerId {
    fn random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for HandlerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for HandlerId {
    type Err = BrokerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|_| BrokerError::HandlerNotFound(s.to_string()))
    }
}

/// Errors returned by the handler registry.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BrokerError {
    #[error("handler {0} not found")]
    HandlerNotFound(String),
}

/// Concurrent map of live handlers.
#[derive(Debug, Default)]
pub struct HandlerRegistry {
    handlers: DashMap<HandlerId, Arc<Handler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a handler under a freshly minted ID.
    pub fn register(&self, handler: Handler) -> HandlerId {
        self.insert(Arc::new(handler))
    }

    fn insert(&self, handler: Arc<Handler>) -> HandlerId {
        loop {
            let id = HandlerId::random();
            if let Entry::Vacant(slot) = self.handlers.entry(id) {
                slot.insert(Arc::clone(&handler));
                metrics::record_active_handlers(self.handlers.len());
                tracing::debug!(handler_id = %id, route_id = %handler.route().id, "Handler registered");
                return id;
            }
        }
    }

    /// Register a handler and tie its lifetime to the returned guard.
    pub fn register_scoped(self: &Arc<Self>, handler: Handler) -> HandlerGuard {
        let handler = Arc::new(handler);
        let id = self.insert(Arc::clone(&handler));
        HandlerGuard {
            registry: Arc::clone(self),
            handler,
            id,
        }
    }

    /// Find a live handler.
    pub fn lookup(&self, id: &HandlerId) -> Result<Arc<Handler>, BrokerError> {
        self.handlers
            .get(id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| BrokerError::HandlerNotFound(id.to_string()))
    }

    /// Find a live handler by its textual ID.
    pub fn lookup_str(&self, id: &str) -> Result<Arc<Handler>, BrokerError> {
        self.lookup(&id.parse()?)
    }

    /// Remove a handler. Removing an absent ID is a no-op.
    /// Returns whether an entry was removed.
    pub fn deregister(&self, id: &HandlerId) -> bool {
        let removed = self.handlers.remove(id).is_some();
        if removed {
            metrics::record_active_handlers(self.handlers.len());
            tracing::debug!(handler_id = %id, "Handler deregistered");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

/// Keeps a handler registered for as long as it lives.
#[derive(Debug)]
pub struct HandlerGuard {
    registry: Arc<HandlerRegistry>,
    handler: Arc<Handler>,
    id: HandlerId,
}

impl HandlerGuard {
    pub fn id(&self) -> HandlerId {
        self.id
    }

    pub fn handler(&self) -> &Handler {
        &self.handler
    }
}

impl Drop for HandlerGuard {
    fn drop(&mut self) {
        self.registry.deregister(&self.id);
    }
}
