use opentelemetry::metrics::{Meter, MeterProvider};
use opentelemetry_otlp::{MetricExporter, WithExportConfig};
use opentelemetry_sdk::metrics::{PeriodicReader, SdkMeterProvider};
use std::time::Duration;

use crate::error::{Error, Result};

// ─── Configuration ───────────────────────────────────────────────

/// OTLP/HTTP receiver of the local Prometheus server.
pub const OTLP_ENDPOINT: &str = "http://localhost:9090/api/v1/otlp/v1/metrics";

pub const EXPORT_INTERVAL: Duration = Duration::from_secs(5);

const METER_NAME: &str = "metrics-instrumentation-demo";

// ─── Pipeline ────────────────────────────────────────────────────

/// Periodic OTLP export of every instrument created through [`Self::meter`].
///
/// Must be shut down explicitly; the final export happens there and its
/// failure is reported to the caller.
pub struct PushPipeline {
    provider: SdkMeterProvider,
}

impl PushPipeline {
    pub fn new() -> Result<Self> {
        let exporter = MetricExporter::builder()
            .with_http()
            .with_endpoint(OTLP_ENDPOINT)
            .build()
            .map_err(|e| Error::Export(e.to_string()))?;

        let reader = PeriodicReader::builder(exporter)
            .with_interval(EXPORT_INTERVAL)
            .build();

        tracing::info!(endpoint = OTLP_ENDPOINT, "OTLP metrics export initialized");
        Ok(Self::from_provider(
            SdkMeterProvider::builder().with_reader(reader).build(),
        ))
    }

    pub fn from_provider(provider: SdkMeterProvider) -> Self {
        Self { provider }
    }

    pub fn meter(&self) -> Meter {
        self.provider.meter(METER_NAME)
    }

    /// Export whatever the reader still holds, then stop it.
    pub async fn shutdown(self) -> Result<()> {
        tracing::info!("Shutting down OpenTelemetry...");
        let provider = self.provider;

        tokio::task::spawn_blocking(move || provider.shutdown())
            .await
            .map_err(|e| Error::Flush(e.to_string()))?
            .map_err(|e| Error::Flush(e.to_string()))
    }
}
