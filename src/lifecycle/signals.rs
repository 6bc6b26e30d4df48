//! OS signal handling.
//!
//! # Responsibilities
//! - Wait for SIGINT (Ctrl-C) and, on unix, SIGTERM
//! - Hand control back to the caller, which triggers [`Shutdown`](super::Shutdown)
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - A failure to install a handler is logged and that signal is ignored

use tokio::signal;

/// Resolve once the process is asked to stop.
pub async fn wait_for_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received SIGINT"),
        _ = terminate => tracing::info!("Received SIGTERM"),
    }
}
