use clap::Parser;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod background_task;
mod config;
mod error;
mod handlers;
mod metrics;
mod middleware;
mod server;
mod simulation;
#[cfg(test)]
mod test_support;

use crate::config::Args;
use crate::error::Result;
use crate::metrics::{ApiMetrics, MetricsCollector};
#[cfg(feature = "otlp")]
use crate::metrics::PushPipeline;
use crate::server::Service;
use crate::simulation::{RandomSimulation, Simulation};

/// Shared application state available to every handler via `State<Arc<AppState>>`.
pub struct AppState {
    /// Registry behind `/metrics`; every instrument is created through it.
    #[cfg_attr(feature = "otlp", allow(dead_code))]
    pub metrics: Arc<MetricsCollector>,

    /// Request-duration histogram fed by the timing middleware.
    pub api: ApiMetrics,

    /// Source of simulated work durations.
    pub simulation: Arc<dyn Simulation>,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    if let Err(err) = run(args).await {
        tracing::error!(error = %err, "fatal error");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    let simulation: Arc<dyn Simulation> = match args.seed {
        Some(seed) => Arc::new(RandomSimulation::with_seed(seed)),
        None => Arc::new(RandomSimulation::new()),
    };

    // ── 1. Instruments ───────────────────────────────────────────
    #[cfg(feature = "otlp")]
    let push = PushPipeline::new()?;
    #[cfg(feature = "otlp")]
    let metrics = MetricsCollector::with_meter(push.meter());
    #[cfg(not(feature = "otlp"))]
    let metrics = MetricsCollector::new();

    let service = Service::new(metrics, simulation)?;

    // ── 2. Bind & serve until a signal arrives ───────────────────
    let listener = server::bind(&args.bind_addrs()).await?;
    let served = service.run(listener, shutdown_signal()).await;

    // ── 3. Flush pushed metrics ──────────────────────────────────
    #[cfg(feature = "otlp")]
    let flushed = push.shutdown().await;
    served?;
    #[cfg(feature = "otlp")]
    flushed?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("signal received, starting graceful shutdown");
}
