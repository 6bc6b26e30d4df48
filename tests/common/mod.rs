//! Shared utilities for integration tests.
#![allow(dead_code)]

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::Request;
use axum::response::Response;
use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use tokio::net::TcpListener;

use shellgate::config::GatewayConfig;
use shellgate::http::{HttpServer, Listeners};
use shellgate::lifecycle::Shutdown;
use shellgate::worker::{Spawner, WorkerError, WorkerExit, WorkerJob};

/// Spawner that runs an async closure instead of a process.
pub struct FnSpawner<F>(pub F);

impl<F, Fut> Spawner for FnSpawner<F>
where
    F: Fn(WorkerJob) -> Fut + Send + Sync,
    Fut: Future<Output = Result<WorkerExit, WorkerError>> + Send + 'static,
{
    fn spawn(&self, job: WorkerJob) -> BoxFuture<'static, Result<WorkerExit, WorkerError>> {
        (self.0)(job).boxed()
    }
}

/// Wrap a closure as a shared spawner.
pub fn spawner<F, Fut>(f: F) -> Arc<dyn Spawner>
where
    F: Fn(WorkerJob) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<WorkerExit, WorkerError>> + Send + 'static,
{
    Arc::new(FnSpawner(f))
}

/// A worker that exits cleanly without touching the data plane.
pub fn noop_spawner() -> Arc<dyn Spawner> {
    spawner(|_job| async { Ok(WorkerExit { code: Some(0) }) })
}

/// Addresses of a running gateway.
pub struct Gateway {
    pub user: SocketAddr,
    pub control: SocketAddr,
    pub data: SocketAddr,
    pub shutdown: Shutdown,
}

impl Gateway {
    pub fn user_url(&self, path: &str) -> String {
        format!("http://{}{}", self.user, path)
    }

    pub fn control_url(&self, path: &str) -> String {
        format!("http://{}{}", self.control, path)
    }
}

impl Drop for Gateway {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Bind all three planes on ephemeral loopback ports and point the config at
/// them, so the data URL handed to workers is the real one.
pub async fn bind_listeners(config: &mut GatewayConfig) -> Listeners {
    let user = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let control = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let data = TcpListener::bind("127.0.0.1:0").await.unwrap();

    config.listener.user_address = user.local_addr().unwrap().to_string();
    config.listener.control_address = control.local_addr().unwrap().to_string();
    config.listener.data_address = data.local_addr().unwrap().to_string();

    Listeners { user, control, data }
}

/// Run `server` on `listeners` in the background.
pub fn spawn_gateway(server: HttpServer, listeners: Listeners) -> Gateway {
    let shutdown = Shutdown::new();
    let gateway = Gateway {
        user: listeners.user.local_addr().unwrap(),
        control: listeners.control.local_addr().unwrap(),
        data: listeners.data.local_addr().unwrap(),
        shutdown: shutdown.clone(),
    };

    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listeners, server_shutdown).await;
    });

    gateway
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .timeout(Duration::from_secs(10))
        .build()
        .unwrap()
}

pub fn request(method: &str, uri: &str, body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(body.into())
        .unwrap()
}

pub async fn body_string(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}
