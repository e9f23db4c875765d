use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
};
use prometheus::TEXT_FORMAT;
use std::sync::Arc;

use crate::error::Result;
use crate::AppState;

// ─── GET /metrics ────────────────────────────────────────────────
/// Pull endpoint scraped by Prometheus.

pub async fn get_metrics(State(state): State<Arc<AppState>>) -> Result<Response> {
    let body = state.metrics.encode()?;
    Ok(([(header::CONTENT_TYPE, TEXT_FORMAT)], body).into_response())
}
