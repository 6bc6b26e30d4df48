//! Route definition shared by the control plane, the registry and the router.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::routing::matcher::{PathPattern, PatternError};

/// A (method, pattern, command) triple registered through the control plane.
///
/// Missing JSON fields deserialize to empty strings so that the control plane
/// can tell "malformed JSON" (400) apart from "missing method/pattern" (422).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Route {
    /// Opaque identifier, assigned by the registry when empty.
    pub id: String,

    /// HTTP method to match (e.g. "GET").
    pub method: String,

    /// URL template, may contain `{name}` segments.
    pub pattern: String,

    /// Program and leading arguments used to run `command`.
    /// Empty means the configured default entrypoint.
    pub entrypoint: String,

    /// Passed unmodified as the last argument of the entrypoint.
    pub command: String,
}

/// Reasons a route is rejected before it reaches the registry.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RouteValidationError {
    #[error("route method must not be empty")]
    EmptyMethod,

    #[error("route pattern must not be empty")]
    EmptyPattern,

    #[error("route method {0:?} is not a valid HTTP method")]
    InvalidMethod(String),

    #[error("route pattern is invalid: {0}")]
    InvalidPattern(#[from] PatternError),
}

impl Route {
    /// Convenience constructor used by tests and config seeding.
    pub fn new(method: impl Into<String>, pattern: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            pattern: pattern.into(),
            command: command.into(),
            ..Default::default()
        }
    }

    /// Check the fields the router depends on.
    pub fn validate(&self) -> Result<(), RouteValidationError> {
        if self.method.is_empty() {
            return Err(RouteValidationError::EmptyMethod);
        }
        if self.pattern.is_empty() {
            return Err(RouteValidationError::EmptyPattern);
        }
        if axum::http::Method::from_bytes(self.method.as_bytes()).is_err() {
            return Err(RouteValidationError::InvalidMethod(self.method.clone()));
        }
        PathPattern::parse(&self.pattern)?;
        Ok(())
    }
}
