//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, addresses parse)
//! - Validate startup routes like the control plane would
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::GatewayConfig;
use crate::routing::route::RouteValidationError;

/// A single semantic problem in the configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{field}: {value:?} is not a socket address")]
    InvalidAddress { field: &'static str, value: String },

    #[error("worker.timeout_secs must be greater than zero")]
    ZeroTimeout,

    #[error("worker.entrypoint must not be empty")]
    EmptyEntrypoint,

    #[error("limits.max_body_size must be greater than zero")]
    ZeroBodyLimit,

    #[error("routes[{index}]: {source}")]
    InvalidRoute {
        index: usize,
        source: RouteValidationError,
    },
}

pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let mut addresses = vec![
        ("listener.user_address", &config.listener.user_address),
        ("listener.control_address", &config.listener.control_address),
        ("listener.data_address", &config.listener.data_address),
    ];
    if config.observability.metrics_enabled {
        addresses.push(("observability.metrics_address", &config.observability.metrics_address));
    }
    for (field, value) in addresses {
        if value.parse::<SocketAddr>().is_err() {
            errors.push(ValidationError::InvalidAddress {
                field,
                value: value.clone(),
            });
        }
    }

    if config.worker.timeout_secs == 0 {
        errors.push(ValidationError::ZeroTimeout);
    }
    if config.worker.entrypoint.trim().is_empty() {
        errors.push(ValidationError::EmptyEntrypoint);
    }
    if config.limits.max_body_size == 0 {
        errors.push(ValidationError::ZeroBodyLimit);
    }

    for (index, route) in config.routes.iter().enumerate() {
        if let Err(source) = route.validate() {
            errors.push(ValidationError::InvalidRoute { index, source });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
