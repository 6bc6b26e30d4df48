//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events via `tracing`)
//!     → metrics.rs (counters, gauges, histograms via `metrics`)
//!
//! Consumers:
//!     → stdout (fmt layer)
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```
//!
//! # Design Decisions
//! - Request ID (`x-request-id`) is attached to every user-plane span
//! - Expected outcomes (404, validation) log at debug, faults at warn/error

pub mod logging;
pub mod metrics;
