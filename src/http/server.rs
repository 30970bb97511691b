//! HTTP server for a composed router.
//!
//! # Responsibilities
//! - Wrap the composed router with request ids, tracing and a request timeout
//! - Serve it on a listener until Ctrl-C, SIGTERM or a
//!   [`Shutdown`](crate::lifecycle::Shutdown) trigger
//!
//! # Design Decisions
//! - A trailing slash is trimmed before routing, so a nested index answers
//!   both `/blog` and `/blog/`
//! - Timed out requests answer 408

use std::time::Duration;

use axum::extract::Request;
use axum::http::{HeaderName, StatusCode};
use axum::{Router, ServiceExt};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::{Layer, ServiceBuilder};
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::config::BurrowConfig;
use crate::http::request::{request_id, UuidRequestId, X_REQUEST_ID};
use crate::lifecycle::signals::shutdown_signal;

/// HTTP server for a composed route tree.
pub struct HttpServer {
    router: Router,
    config: BurrowConfig,
}

impl HttpServer {
    pub fn new(router: Router, config: BurrowConfig) -> Self {
        let router = Self::build_router(router, &config);
        Self { router, config }
    }

    /// Apply the serving middleware stack.
    fn build_router(router: Router, config: &BurrowConfig) -> Router {
        let header = HeaderName::from_static(X_REQUEST_ID);
        let timeout = Duration::from_secs(config.timeouts.request_secs);
        router.layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(header.clone(), UuidRequestId))
                .layer(TraceLayer::new_for_http().make_span_with(|req: &Request| {
                    tracing::info_span!(
                        "request",
                        method = %req.method(),
                        uri = %req.uri(),
                        request_id = request_id(req).unwrap_or("-"),
                    )
                }))
                .layer(PropagateRequestIdLayer::new(header))
                .layer(TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, timeout)),
        )
    }

    /// The router with the serving middleware applied.
    pub fn router(&self) -> &Router {
        &self.router
    }

    /// The service actually served: the router behind trailing-slash trimming.
    pub fn service(&self) -> NormalizePath<Router> {
        NormalizePathLayer::trim_trailing_slash().layer(self.router.clone())
    }

    pub fn config(&self) -> &BurrowConfig {
        &self.config
    }

    /// Serve until an OS shutdown signal or a message on `shutdown`.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let service = self.service();
        axum::serve(listener, ServiceExt::<Request>::into_make_service(service))
            .with_graceful_shutdown(async move {
                tokio::select! {
                    () = shutdown_signal() => {}
                    _ = shutdown.recv() => {}
                }
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
