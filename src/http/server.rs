//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (tracing, timeout)
//! - Bind server to listener
//! - Dispatch every unmatched request to the error page responder
//! - Expose liveness and Prometheus endpoints

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode, Version},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use tokio::net::TcpListener;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::ServiceConfig;
use crate::lifecycle::shutdown_signal;
use crate::pages::ErrorPageResponder;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub responder: Arc<ErrorPageResponder>,
    pub metrics: Option<PrometheusHandle>,
}

/// HTTP server for the error page backend.
pub struct HttpServer {
    router: Router,
    config: ServiceConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    ///
    /// The metrics route is mounted only when a handle is supplied.
    pub fn new(config: ServiceConfig, metrics: Option<PrometheusHandle>) -> Self {
        let state = AppState {
            responder: Arc::new(ErrorPageResponder::from_config(&config)),
            metrics,
        };

        let router = Self::build_router(&config, state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ServiceConfig, state: AppState) -> Router {
        let mut router = Router::new().route("/healthz", any(healthz));
        if state.metrics.is_some() {
            router = router.route(&config.observability.metrics_path, any(metrics_handler));
        }

        router
            .fallback(error_page_handler)
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(TraceLayer::new_for_http())
    }

    /// A copy of the router, for driving the service without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until SIGINT or SIGTERM.
    pub async fn run(self, listener: TcpListener) -> Result<(), std::io::Error> {
        self.run_until(listener, shutdown_signal()).await
    }

    /// Run the server until `shutdown` completes, then drain in-flight requests.
    pub async fn run_until<F>(self, listener: TcpListener, shutdown: F) -> Result<(), std::io::Error>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            error_files_path = %self.config.pages.error_files_path,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Serve an error page for any request not claimed by another route.
async fn error_page_handler(
    State(state): State<AppState>,
    version: Version,
    headers: HeaderMap,
) -> Response {
    let responder = state.responder.clone();

    // File reads and template rendering are synchronous.
    let result = tokio::task::spawn_blocking(move || responder.respond(&headers, version)).await;

    match result {
        Ok(response) => response,
        Err(e) => {
            tracing::error!(error = %e, "Error page task failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "Cannot render response").into_response()
        }
    }
}

async fn healthz() -> &'static str {
    "ok"
}

async fn metrics_handler(State(state): State<AppState>) -> Response {
    match state.metrics {
        Some(handle) => handle.render().into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}
