//! Worker execution subsystem.
//!
//! # Data Flow
//! ```text
//! RouteMatch + client request
//!     → dispatch.rs (register Handler, scoped guard)
//!     → Spawner::spawn(WorkerJob { route, handler_id })
//!         → process.rs (entrypoint + command, env, timeout)
//!     → worker talks to the data plane with its handler ID
//!     → exit: composed response sent to the client, guard deregisters
//! ```
//!
//! # Design Decisions
//! - One worker per request, no pooling
//! - `Spawner` is object safe so tests can inject fakes
//! - The guard deregisters on every exit path, including client disconnect

pub mod dispatch;
pub mod process;

use futures_util::future::BoxFuture;
use thiserror::Error;

use crate::broker::HandlerId;
use crate::routing::Route;

pub use dispatch::WorkerDispatcher;
pub use process::ProcessSpawner;

/// Environment variable carrying the handler ID.
pub const HANDLER_ID_ENV: &str = "SHELLGATE_HANDLER_ID";

/// Environment variable carrying the data plane base URL.
pub const DATA_URL_ENV: &str = "SHELLGATE_DATA_URL";

/// Everything a spawner needs to start one worker.
#[derive(Debug, Clone)]
pub struct WorkerJob {
    pub route: Route,
    pub handler_id: HandlerId,
}

/// How a worker finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerExit {
    /// Exit code, `None` when terminated by a signal.
    pub code: Option<i32>,
}

impl WorkerExit {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Errors raised while running a worker.
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("route {0:?} has no usable entrypoint")]
    InvalidEntrypoint(String),

    #[error("failed to spawn worker: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("worker timed out after {0} seconds")]
    Timeout(u64),
}

/// Starts workers for matched routes.
pub trait Spawner: Send + Sync {
    fn spawn(&self, job: WorkerJob) -> BoxFuture<'static, Result<WorkerExit, WorkerError>>;
}
