//! HTTP server setup.
//!
//! # Responsibilities
//! - Create the axum Router that feeds every request to the dispatcher
//! - Wire up middleware (request id, tracing, panic capture, timeout, body limit)
//! - Bind a listener and serve until the shutdown signal
//! - Expose the `listen` → `ServerHandle { close }` contract

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::any,
    Router as AxumRouter,
};
use std::any::Any;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tower::ServiceBuilder;
use tower_http::{
    catch_panic::CatchPanicLayer,
    limit::RequestBodyLimitLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::ServerConfig;
use crate::http::dispatch::{dispatch_handler, Dispatcher};
use crate::http::request::{request_id_header, UuidRequestId};
use crate::lifecycle::Shutdown;
use crate::routing::Router;

/// Errors from binding or running the server.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("server I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("server task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// HTTP server for a compiled route table.
pub struct HttpServer {
    app: AxumRouter,
    config: ServerConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(router: impl Into<Arc<Router>>, config: ServerConfig) -> Self {
        let dispatcher = Dispatcher::new(router.into(), config.limits.max_body_bytes);
        let app = Self::build_router(&config, dispatcher);
        Self { app, config }
    }

    /// Build the axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ServerConfig, dispatcher: Dispatcher) -> AxumRouter {
        AxumRouter::new()
            .route("/{*path}", any(dispatch_handler))
            .route("/", any(dispatch_handler))
            .with_state(dispatcher)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::new(request_id_header(), UuidRequestId))
                    .layer(TraceLayer::new_for_http())
                    .layer(PropagateRequestIdLayer::new(request_id_header()))
                    .layer(CatchPanicLayer::custom(handle_panic))
                    .layer(RequestBodyLimitLayer::new(config.limits.max_body_bytes))
                    .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs))),
            )
    }

    /// Run the server on `listener` until `shutdown` fires.
    ///
    /// In-flight requests are allowed to finish.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            request_timeout_secs = self.config.timeouts.request_secs,
            max_body_bytes = self.config.limits.max_body_bytes,
            "HTTP server starting"
        );

        axum::serve(listener, self.app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// The configured axum router, for embedding or in-memory testing.
    pub fn into_router(self) -> AxumRouter {
        self.app
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    tracing::error!(error = %detail, "Handler panicked");
    (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
}

/// A running server.
#[derive(Debug)]
pub struct ServerHandle {
    local_addr: SocketAddr,
    shutdown: Shutdown,
    task: JoinHandle<Result<(), std::io::Error>>,
}

impl ServerHandle {
    /// The bound address (useful with port 0).
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stop accepting new connections. In-flight requests are not interrupted.
    pub fn close(&self) {
        self.shutdown.trigger();
    }

    /// A handle on the shutdown signal, e.g. to wire up OS signals.
    pub fn shutdown_signal(&self) -> Shutdown {
        self.shutdown.clone()
    }

    /// Wait for the server task to finish.
    pub async fn wait(self) -> Result<(), ServerError> {
        self.task.await??;
        Ok(())
    }

    /// Close and wait.
    pub async fn shutdown(self) -> Result<(), ServerError> {
        self.close();
        self.wait().await
    }
}

/// Bind `config.listener.bind_address` and serve `router` in the background.
pub async fn listen(
    router: impl Into<Arc<Router>>,
    config: ServerConfig,
) -> Result<ServerHandle, ServerError> {
    let address = config.listener.bind_address.clone();
    let listener = TcpListener::bind(&address)
        .await
        .map_err(|source| ServerError::Bind { address, source })?;
    let local_addr = listener.local_addr()?;

    let shutdown = Shutdown::new();
    let signal = shutdown.subscribe();
    let server = HttpServer::new(router, config);
    let task = tokio::spawn(server.run(listener, signal));

    Ok(ServerHandle {
        local_addr,
        shutdown,
        task,
    })
}

impl Router {
    /// Serve this router; see [`listen`].
    pub async fn listen(self, config: ServerConfig) -> Result<ServerHandle, ServerError> {
        listen(self, config).await
    }
}
