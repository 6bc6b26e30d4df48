//! HTTP serving subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection (user plane)
//!     → request.rs (add request ID, open request span)
//!     → server.rs (body limit, panic guard, metrics)
//!     → routing::SwappableRouter (match against current table)
//!     → worker::WorkerDispatcher (register handler, run worker)
//!     → Send composed response to client
//! ```
//!
//! The control and data planes are served from the same `HttpServer` on
//! their own listeners.

pub mod request;
pub mod server;

pub use request::X_REQUEST_ID;
pub use server::{GatewayState, HttpServer, Listeners};
