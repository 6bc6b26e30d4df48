//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → GatewayConfig (validated, immutable)
//!     → CLI flags override listener addresses and log level
//!     → startup routes appended to the RouteRegistry
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; routes change through the control plane
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::GatewayConfig;
pub use schema::{ControlConfig, LimitConfig, ListenerConfig, ObservabilityConfig, WorkerConfig};
