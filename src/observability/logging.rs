//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber once per process
//! - Honour `RUST_LOG`, falling back to the configured level
//!
//! # Design Decisions
//! - Uses the `tracing` crate for structured logging
//! - A second initialisation is ignored, which keeps tests and embedders safe

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global subscriber. Returns `false` if one was already set.
pub fn init(log_level: &str) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(log_level)));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .is_ok()
}

fn default_directives(log_level: &str) -> String {
    format!("shellgate={log_level},tower_http={log_level}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directives_cover_crate_and_http_layer() {
        assert_eq!(default_directives("debug"), "shellgate=debug,tower_http=debug");
    }
}
