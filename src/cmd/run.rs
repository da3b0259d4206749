//! `api-template run` — start the HTTP server.
//!
//! Initialises logging, builds the router with its middleware stack and
//! serves it until SIGTERM / Ctrl+C, draining in-flight requests.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use crate::cli::RunArgs;
use crate::error::ApiError;
use crate::logging;
use crate::server::{self, AppState};

pub async fn execute(args: RunArgs) -> Result<(), ApiError> {
    let log_format = logging::resolve_format(args.pretty, args.json);
    logging::init(&args.log_level, log_format);

    let state = Arc::new(AppState::new());
    let router = server::build_router(
        state,
        args.max_body,
        Duration::from_millis(args.timeout),
    );

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;

    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!(
        addr = %addr,
        timeout_ms = args.timeout,
        max_body = args.max_body,
        "api-template started"
    );

    axum::serve(listener, router)
        .with_graceful_shutdown(server::shutdown_signal())
        .await?;

    tracing::info!("api-template stopped");
    Ok(())
}
