//! Data plane: the worker-facing view of an in-flight request.
//!
//! # Data Flow
//! ```text
//! Worker (knows SHELLGATE_HANDLER_ID)
//!     → GET/PUT /handlers/{id}/...  (server.rs)
//!     → HandlerRegistry lookup (404 when not registered)
//!     → resource.rs accessor on the Handler
//!     → octet-stream answer, or response draft updated
//! ```
//!
//! # Design Decisions
//! - Internal-only surface, bind it to loopback
//! - All reads answer `application/octet-stream`
//! - Repeated query parameters: the first value wins

pub mod resource;
pub mod server;

pub use resource::DataError;
pub use server::router;
