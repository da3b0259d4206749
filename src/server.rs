//! Axum server setup, shared application state, and graceful shutdown.
//!
//! Contains [`AppState`] (the `Arc`-shared state), [`build_router`] for
//! constructing the Axum router with its middleware stack, and
//! [`shutdown_signal`] for SIGTERM / Ctrl+C handling.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::http::StatusCode;
use axum::middleware;
use axum::routing::get;
use axum::Router;
use tower::ServiceBuilder;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::health::health_handler;
use crate::middleware::correlation::correlation_id;
use crate::sample::sample_handler;

#[derive(Debug)]
pub struct AppState {
    pub start_time: Instant,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl AppState {
    #[must_use]
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
        }
    }
}

/// Build the application router: the route table wrapped in the
/// middleware stack from [`apply_middleware`].
pub fn build_router(state: Arc<AppState>, max_body: usize, timeout: Duration) -> Router {
    let routes = Router::new()
        .route("/health", get(health_handler))
        .route("/api/sample", get(sample_handler));

    apply_middleware(routes, max_body, timeout).with_state(state)
}

/// Wrap `router` (routes and fallback) in the service's middleware stack.
///
/// Layers run top to bottom on the way in. Everything below the
/// correlation middleware turns failures into responses (408 on timeout,
/// 500 on panic, 413 on oversized bodies), so those responses still leave
/// with the correlation header set.
pub fn apply_middleware<S>(router: Router<S>, max_body: usize, timeout: Duration) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router.layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(middleware::from_fn(correlation_id))
            .layer(TimeoutLayer::with_status_code(
                StatusCode::REQUEST_TIMEOUT,
                timeout,
            ))
            .layer(CatchPanicLayer::new())
            .layer(RequestBodyLimitLayer::new(max_body)),
    )
}

pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("received Ctrl+C"),
        () = terminate => tracing::info!("received SIGTERM"),
    }
}
