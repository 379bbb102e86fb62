//! HTTP surface.
//!
//! A single catch-all route hands every `GET`/`HEAD` request to the
//! [`Dispatcher`]. [`HttpServer`] owns the listening socket and runs until a
//! shutdown signal arrives.

pub mod content;
pub mod dispatcher;
pub mod error;

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::State;
use axum::http::{HeaderMap, Uri};
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::files::ServedRoot;
use crate::render::HtmlRenderer;

pub use content::{parse_range, serve_content, ByteRange};
pub use dispatcher::{content_disposition, Dispatcher};
pub use error::DispatchError;

/// Build the application router around `dispatcher`.
pub fn router(dispatcher: Arc<Dispatcher>) -> Router {
    Router::new()
        .route("/", get(handle))
        .route("/{*path}", get(handle))
        .layer(TraceLayer::new_for_http())
        .with_state(dispatcher)
}

async fn handle(
    State(dispatcher): State<Arc<Dispatcher>>,
    headers: HeaderMap,
    uri: Uri,
) -> Response {
    dispatcher.dispatch(uri.path(), &headers).await
}

/// A bound HTTP listener serving one directory tree.
pub struct HttpServer {
    listener: TcpListener,
    dispatcher: Arc<Dispatcher>,
}

impl HttpServer {
    /// Bind `addr` and serve through `dispatcher`.
    pub async fn bind(addr: SocketAddr, dispatcher: Arc<Dispatcher>) -> Result<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind {addr}"))?;
        Ok(Self {
            listener,
            dispatcher,
        })
    }

    /// Bind using validated configuration and the built-in HTML renderer.
    pub async fn from_config(config: &Config) -> Result<Self> {
        let root = ServedRoot::new(&config.server.root).with_context(|| {
            format!("Failed to open served root: {}", config.server.root.display())
        })?;
        let addr = config.socket_addr()?;
        let dispatcher = Arc::new(Dispatcher::new(root, Arc::new(HtmlRenderer::new())));
        Self::bind(addr, dispatcher).await
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.listener
            .local_addr()
            .context("Failed to read listener address")
    }

    /// Serve until `shutdown` completes, letting in-flight requests finish.
    pub async fn run_until<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        tracing::info!(
            addr = %self.local_addr()?,
            root = %self.dispatcher.root().path().display(),
            "Serving directory"
        );

        axum::serve(self.listener, router(self.dispatcher))
            .with_graceful_shutdown(shutdown)
            .await
            .context("HTTP server failed")
    }

    /// Serve until SIGINT or SIGTERM.
    pub async fn run(self) -> Result<()> {
        self.run_until(wait_for_shutdown_signal()).await
    }
}

/// Wait for a shutdown signal (SIGTERM or SIGINT).
pub async fn wait_for_shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for SIGINT: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to register SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received SIGINT");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM");
        }
    }
}
