use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use std::time::Instant;

use crate::metrics::ApiMetrics;

/// State carried by one instrumented route.
#[derive(Clone)]
pub struct Timed {
    pub api: ApiMetrics,
    /// Histogram label identifying the wrapped handler.
    pub handler: &'static str,
}

impl Timed {
    pub fn new(api: ApiMetrics, handler: &'static str) -> Self {
        Self { api, handler }
    }
}

/// Route middleware that observes the wrapped handler's wall time into the
/// request-duration histogram under the route's handler label.
///
/// The response is passed through untouched: no headers are added and the
/// body is never buffered.
pub async fn timing_middleware(
    State(timed): State<Timed>,
    req: Request,
    next: Next,
) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_owned();

    let start = Instant::now();
    let response = next.run(req).await;
    let elapsed = start.elapsed();

    timed.api.observe(timed.handler, elapsed.as_secs_f64());

    tracing::debug!(
        handler = timed.handler,
        %method,
        path = %path,
        status = response.status().as_u16(),
        elapsed_us = elapsed.as_micros() as u64,
        "request timed"
    );

    response
}
