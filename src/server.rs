use axum::{
    middleware as axum_mw,
    routing::any,
    Router,
};
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;

use crate::background_task;
use crate::error::{Error, Result};
use crate::handlers;
use crate::metrics::{ApiMetrics, BackgroundTaskMetrics, MetricsCollector};
use crate::middleware::timing::{timing_middleware, Timed};
use crate::simulation::Simulation;
use crate::AppState;

/// Builds the full Axum `Router`: the timed demo API plus, in the pull
/// build, the scrape endpoint.
pub fn create_router(state: Arc<AppState>) -> Router {
    let api = state.api.clone();
    let timed = move |handler: &'static str| {
        axum_mw::from_fn_with_state(Timed::new(api.clone(), handler), timing_middleware)
    };

    // ── Demo API ────────────────────────────────────────────────
    let router = Router::new()
        .route("/api/foo", any(handlers::api::foo).layer(timed("foo")))
        .route("/api/bar", any(handlers::api::bar).layer(timed("bar")));

    // ── Metrics ─────────────────────────────────────────────────
    #[cfg(not(feature = "otlp"))]
    let router = router.route(
        "/metrics",
        axum::routing::get(crate::metrics::exposition::get_metrics),
    );

    router
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Binds the first address that accepts a listener.
pub async fn bind(addrs: &[String]) -> Result<TcpListener> {
    let mut last_err = None;
    for addr in addrs {
        match TcpListener::bind(addr.as_str()).await {
            Ok(listener) => {
                tracing::info!(addr = %addr, "listening");
                return Ok(listener);
            }
            Err(source) => {
                tracing::debug!(addr = %addr, error = %source, "bind failed");
                last_err = Some(Error::Bind {
                    addr: addr.clone(),
                    source,
                });
            }
        }
    }
    Err(last_err.unwrap_or_else(|| Error::Bind {
        addr: String::new(),
        source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "no listen address"),
    }))
}

// ─── Service ─────────────────────────────────────────────────────

/// The demo API and its background task, wired to one metrics context.
pub struct Service {
    state: Arc<AppState>,
    task_metrics: BackgroundTaskMetrics,
}

impl Service {
    /// Creates every instrument; any registration error is fatal to startup.
    pub fn new(metrics: MetricsCollector, simulation: Arc<dyn Simulation>) -> Result<Self> {
        let metrics = Arc::new(metrics);
        let api = ApiMetrics::new(&metrics)?;
        let task_metrics = BackgroundTaskMetrics::new(&metrics)?;

        Ok(Self {
            state: Arc::new(AppState {
                metrics,
                api,
                simulation,
            }),
            task_metrics,
        })
    }

    /// Starts the background task, then serves `listener` until `shutdown`
    /// resolves. Returns once the server has drained and the background task
    /// has been joined.
    pub async fn run<F>(self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let cancel = CancellationToken::new();
        let background = tokio::spawn(background_task::run(
            self.task_metrics,
            self.state.simulation.clone(),
            cancel.clone(),
        ));

        let app = create_router(self.state);
        let stop = cancel.clone();
        let served = axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                shutdown.await;
                stop.cancel();
            })
            .await;

        tracing::info!("Shutting down...");
        cancel.cancel();
        served.map_err(Error::Serve)?;
        background.await?;

        Ok(())
    }
}
