//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Control plane (POST/DELETE /routes)
//!     → registry.rs (ordered route list, fair RW lock)
//!     → versioned snapshot (deep copy)
//!     → table.rs (compile matchers)
//!     → router.rs (atomic swap of Arc<RoutingTable>)
//!
//! Incoming Request (method, path)
//!     → router.rs (capture current table, release lock)
//!     → matcher.rs (evaluate method + pattern)
//!     → Return: RouteMatch or 404
//! ```
//!
//! # Design Decisions
//! - Tables are immutable; changes produce a new table
//! - Deterministic: first registered match wins
//! - No component holds two of the shared locks at once

pub mod matcher;
pub mod registry;
pub mod route;
pub mod router;
pub mod table;

pub use matcher::Matches;
pub use registry::{RegistryError, RouteRegistry};
pub use route::Route;
pub use router::{Dispatcher, SwappableRouter};
pub use table::{RouteMatch, RoutingTable};
