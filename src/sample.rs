//! `GET /api/sample` endpoint handler.
//!
//! Serves a fixed list of values. It exists as the starting point for real
//! endpoints and shows how a handler picks up the request's
//! [`CorrelationId`].

use axum::{Extension, Json};

use crate::middleware::correlation::CorrelationId;

pub const SAMPLE_VALUES: [&str; 2] = ["value1", "value2"];

pub async fn sample_handler(
    Extension(correlation_id): Extension<CorrelationId>,
) -> Json<[&'static str; 2]> {
    tracing::debug!(correlation_id = %correlation_id, "serving sample values");
    Json(SAMPLE_VALUES)
}
