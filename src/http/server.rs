//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Own the shared state (route registry, router, handler registry)
//! - Seed startup routes and build the first routing table
//! - Build the user, control and data plane routers
//! - Serve all three planes until shutdown
//!
//! # Design Decisions
//! - State is constructed here and passed down, there is no global registry
//! - The user plane is wrapped in `CatchPanicLayer` so a failing exchange
//!   never takes the process or shared locks down with it

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::State,
    http::Request,
    response::Response,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, oneshot};
use tower_http::{catch_panic::CatchPanicLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};

use crate::broker::HandlerRegistry;
use crate::config::{GatewayConfig, ListenerConfig};
use crate::control::{setup_control_router, ControlState};
use crate::http::request::{propagate_request_id_layer, request_span, set_request_id_layer};
use crate::observability::metrics;
use crate::routing::{RouteRegistry, SwappableRouter};
use crate::worker::{ProcessSpawner, Spawner, WorkerDispatcher};

/// Shared state of one gateway instance.
#[derive(Clone, Default)]
pub struct GatewayState {
    pub registry: Arc<RouteRegistry>,
    pub router: Arc<SwappableRouter>,
    pub handlers: Arc<HandlerRegistry>,
}

#[derive(Clone)]
struct UserState {
    router: Arc<SwappableRouter>,
    dispatcher: WorkerDispatcher,
}

/// Pre-bound listeners for the three planes.
pub struct Listeners {
    pub user: TcpListener,
    pub control: TcpListener,
    pub data: TcpListener,
}

impl Listeners {
    pub async fn bind(config: &ListenerConfig) -> Result<Self, std::io::Error> {
        Ok(Self {
            user: TcpListener::bind(&config.user_address).await?,
            control: TcpListener::bind(&config.control_address).await?,
            data: TcpListener::bind(&config.data_address).await?,
        })
    }
}

/// The gateway: user plane, control plane and data plane.
pub struct HttpServer {
    config: GatewayConfig,
    state: GatewayState,
    spawner: Arc<dyn Spawner>,
}

impl HttpServer {
    /// Create a server that runs workers as local processes.
    pub fn new(config: GatewayConfig) -> Self {
        let spawner = Arc::new(ProcessSpawner::new(
            config.worker.entrypoint.clone(),
            config.data_url(),
            Duration::from_secs(config.worker.timeout_secs),
        ));
        Self::with_spawner(config, spawner)
    }

    /// Create a server with a custom spawner.
    pub fn with_spawner(config: GatewayConfig, spawner: Arc<dyn Spawner>) -> Self {
        let state = GatewayState::default();

        for route in &config.routes {
            state.registry.append(route.clone());
        }
        state.router.rebuild(&state.registry);

        Self {
            config,
            state,
            spawner,
        }
    }

    pub fn state(&self) -> &GatewayState {
        &self.state
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Client-facing router: everything goes through the swappable table.
    pub fn user_router(&self) -> Router {
        let state = UserState {
            router: Arc::clone(&self.state.router),
            dispatcher: WorkerDispatcher::new(
                Arc::clone(&self.state.handlers),
                Arc::clone(&self.spawner),
            ),
        };

        Router::new()
            .fallback(user_handler)
            .with_state(state)
            .layer(RequestBodyLimitLayer::new(self.config.limits.max_body_size))
            .layer(CatchPanicLayer::new())
            .layer(propagate_request_id_layer())
            .layer(TraceLayer::new_for_http().make_span_with(request_span))
            .layer(set_request_id_layer())
    }

    pub fn control_router(&self) -> Router {
        setup_control_router(
            ControlState {
                registry: Arc::clone(&self.state.registry),
                router: Arc::clone(&self.state.router),
            },
            self.config.control.api_key.as_deref(),
        )
    }

    pub fn data_router(&self) -> Router {
        crate::data::router(
            Arc::clone(&self.state.handlers),
            self.config.limits.max_body_size,
        )
    }

    /// Serve all planes until the shutdown signal fires.
    ///
    /// The user and control planes stop accepting at once. The data plane
    /// keeps serving until the user plane has drained, because the workers of
    /// in-flight exchanges still need it to read requests and write responses.
    pub async fn run(
        self,
        listeners: Listeners,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        tracing::info!(
            user = %listeners.user.local_addr()?,
            control = %listeners.control.local_addr()?,
            data = %listeners.data.local_addr()?,
            routes = self.state.registry.len(),
            "HTTP server starting"
        );

        let (user_drained, data_shutdown) = oneshot::channel::<()>();

        let user = axum::serve(listeners.user, self.user_router())
            .with_graceful_shutdown(wait_for(shutdown.resubscribe()));
        let control = axum::serve(listeners.control, self.control_router())
            .with_graceful_shutdown(wait_for(shutdown));
        let data = axum::serve(listeners.data, self.data_router()).with_graceful_shutdown(async move {
            let _ = data_shutdown.await;
        });

        let handlers = Arc::clone(&self.state.handlers);
        tokio::try_join!(
            async move {
                let result = user.await;
                tracing::info!(
                    active_handlers = handlers.len(),
                    "User plane drained, stopping data plane"
                );
                let _ = user_drained.send(());
                result
            },
            async { control.await },
            async { data.await },
        )?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

async fn wait_for(mut shutdown: broadcast::Receiver<()>) {
    let _ = shutdown.recv().await;
}

/// Main user-plane handler.
async fn user_handler(State(state): State<UserState>, request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let method = request.method().to_string();

    let response = state.router.serve(request, &state.dispatcher).await;

    metrics::record_request(&method, response.status().as_u16(), start_time);
    response
}
