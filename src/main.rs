//! Shellgate server.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client ──▶ user plane ──▶ SwappableRouter ──▶ WorkerDispatcher ──▶ worker process
//!                                     ▲                    │                   │
//!                                     │ rebuild            │ register          │ GET/PUT
//!                                     │                    ▼                   ▼
//!     Operator ──▶ control plane ──▶ RouteRegistry    HandlerRegistry ◀── data plane
//! ```

use std::path::PathBuf;

use clap::Parser;

use shellgate::config::{load_config, GatewayConfig};
use shellgate::http::{HttpServer, Listeners};
use shellgate::lifecycle::{wait_for_signal, Shutdown};
use shellgate::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "shellgate")]
#[command(about = "Expose shell commands as HTTP endpoints", long_about = None)]
struct Args {
    /// Path to a TOML configuration file.
    #[arg(short, long, env = "SHELLGATE_CONFIG")]
    config: Option<PathBuf>,

    /// User plane bind address.
    #[arg(long)]
    user_bind: Option<String>,

    /// Control plane bind address.
    #[arg(long)]
    control_bind: Option<String>,

    /// Data plane bind address.
    #[arg(long)]
    data_bind: Option<String>,

    /// Log level when RUST_LOG is unset.
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => GatewayConfig::default(),
    };
    if let Some(addr) = args.user_bind {
        config.listener.user_address = addr;
    }
    if let Some(addr) = args.control_bind {
        config.listener.control_address = addr;
    }
    if let Some(addr) = args.data_bind {
        config.listener.data_address = addr;
    }
    if let Some(level) = args.log_level {
        config.observability.log_level = level;
    }

    logging::init(&config.observability.log_level);

    tracing::info!("shellgate v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        user_address = %config.listener.user_address,
        control_address = %config.listener.control_address,
        data_address = %config.listener.data_address,
        worker_timeout_secs = config.worker.timeout_secs,
        routes = config.routes.len(),
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let listeners = Listeners::bind(&config.listener).await?;

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config);
    let mut running = tokio::spawn(server.run(listeners, shutdown.subscribe()));

    tokio::select! {
        result = &mut running => {
            result??;
            return Ok(());
        }
        _ = wait_for_signal() => {}
    }

    tracing::info!("Shutting down");
    shutdown.trigger();
    running.await??;

    tracing::info!("Shutdown complete");
    Ok(())
}
