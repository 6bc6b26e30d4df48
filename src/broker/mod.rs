//! Live request brokering subsystem.
//!
//! # Data Flow
//! ```text
//! Client request matched by the router
//!     → handler.rs (Handler wraps request head, body, response draft)
//!     → registry.rs (register, mint HandlerId, return guard)
//!     → worker receives the HandlerId
//!     → data plane looks the Handler up by ID (0..n times, concurrently)
//!     → guard dropped → deregistered, later lookups answer 404
//! ```
//!
//! # Handler Lifecycle
//! ```text
//! registered → queried 0..n times → deregistered (no resurrection)
//! ```

pub mod handler;
pub mod registry;

pub use handler::{Handler, ResponseDraft};
pub use registry::{BrokerError, HandlerGuard, HandlerId, HandlerRegistry};
