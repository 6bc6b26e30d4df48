//! Shellgate: expose shell commands as HTTP endpoints.
//!
//! A request on the user plane is matched against the current routing table.
//! On a match it is registered as a live handler and a worker process is
//! started for the route's command. The worker reads the request and composes
//! the response through the data plane, addressed by its handler ID. Routes
//! are added and removed at runtime through the control plane.

pub mod broker;
pub mod config;
pub mod control;
pub mod data;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;
pub mod worker;

pub use config::GatewayConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
