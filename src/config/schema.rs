//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::routing::Route;

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Bind addresses of the three planes.
    pub listener: ListenerConfig,

    /// How workers are started.
    pub worker: WorkerConfig,

    /// Control plane settings.
    pub control: ControlConfig,

    /// Request size limits.
    pub limits: LimitConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Routes registered at startup, in order.
    pub routes: Vec<Route>,
}

impl GatewayConfig {
    /// Base URL handed to workers for the data plane.
    pub fn data_url(&self) -> String {
        self.worker
            .data_url
            .clone()
            .unwrap_or_else(|| format!("http://{}", self.listener.data_address))
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Public address clients call (e.g., "0.0.0.0:8080").
    pub user_address: String,

    /// Operator-facing route management address.
    pub control_address: String,

    /// Worker-facing data plane address. Keep it on loopback.
    pub data_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            user_address: "0.0.0.0:8080".to_string(),
            control_address: "127.0.0.1:8081".to_string(),
            data_address: "127.0.0.1:8082".to_string(),
        }
    }
}

/// Worker configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// Program and leading arguments used when a route has no entrypoint.
    pub entrypoint: String,

    /// Maximum run time of one worker in seconds.
    pub timeout_secs: u64,

    /// Data plane URL given to workers. Defaults to `http://<data_address>`.
    pub data_url: Option<String>,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            entrypoint: "/bin/sh -c".to_string(),
            timeout_secs: 60,
            data_url: None,
        }
    }
}

/// Control plane configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ControlConfig {
    /// Bearer token required on control requests when set.
    pub api_key: Option<String>,
}

/// Size limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LimitConfig {
    /// Maximum body size in bytes (user requests and data plane writes).
    pub max_body_size: usize,
}

impl Default for LimitConfig {
    fn default() -> Self {
        Self {
            max_body_size: 2 * 1024 * 1024, // 2MB
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
