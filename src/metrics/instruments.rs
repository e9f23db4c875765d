use super::collector::{Counter, Gauge, Histogram, MetricsCollector, Unit};
use crate::error::Result;

// ─── Configuration ───────────────────────────────────────────────

/// Request duration bucket bounds, in seconds.
pub const REQUEST_DURATION_BUCKETS: &[f64] = &[0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0];

/// Label carrying the name of the handler that produced a sample.
pub const HANDLER_LABEL: &str = "handler";

// ─── Demo API ────────────────────────────────────────────────────

/// Instruments written by the request-timing middleware.
#[derive(Clone)]
pub struct ApiMetrics {
    pub request_durations: Histogram,
}

impl ApiMetrics {
    pub fn new(metrics: &MetricsCollector) -> Result<Self> {
        let request_durations = metrics.histogram(
            "http.server.request.duration",
            "A histogram of HTTP request durations.",
            Some(Unit::Seconds),
            REQUEST_DURATION_BUCKETS,
            HANDLER_LABEL,
        )?;

        Ok(Self { request_durations })
    }

    pub fn observe(&self, handler: &str, seconds: f64) {
        self.request_durations.observe(handler, seconds);
    }

    /// Number of samples recorded for `handler` so far.
    #[cfg(test)]
    pub fn sample_count(&self, handler: &str) -> u64 {
        self.request_durations.sample_count(handler)
    }
}

// ─── Background task ─────────────────────────────────────────────

/// Instruments updated once per background task iteration.
#[derive(Clone)]
pub struct BackgroundTaskMetrics {
    pub runs: Counter,
    pub failures: Counter,
    /// Unix timestamp (seconds) of the last run, successful or not.
    pub last_run: Gauge,
    /// Unix timestamp (seconds) of the last successful run.
    pub last_success: Gauge,
}

impl BackgroundTaskMetrics {
    pub fn new(metrics: &MetricsCollector) -> Result<Self> {
        Ok(Self {
            runs: metrics.counter(
                "background_task.runs",
                "The total number of background task runs.",
            )?,
            failures: metrics.counter(
                "background_task.failures",
                "The total number of background task failures.",
            )?,
            last_run: metrics.gauge(
                "background_task.last_run_timestamp",
                "The Unix timestamp in seconds of the last background task run.",
                Some(Unit::Seconds),
            )?,
            last_success: metrics.gauge(
                "background_task.last_success_timestamp",
                "The Unix timestamp in seconds of the last successful background task run.",
                Some(Unit::Seconds),
            )?,
        })
    }
}
