use prometheus::{Encoder, HistogramOpts, HistogramVec, IntCounter, Opts, Registry, TextEncoder};

#[cfg(feature = "otlp")]
use opentelemetry::{metrics::Meter, KeyValue};

use crate::error::Result;

// ─── Units ───────────────────────────────────────────────────────

/// Prometheus has no unit field; the unit travels as a name suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    Seconds,
}

impl Unit {
    pub fn suffix(self) -> &'static str {
        match self {
            Unit::Seconds => "seconds",
        }
    }

    /// UCUM symbol used by OpenTelemetry.
    pub fn symbol(self) -> &'static str {
        match self {
            Unit::Seconds => "s",
        }
    }
}

/// Prometheus name for an OpenTelemetry-style dotted name: dots become
/// underscores and the unit (or `total` for counters) becomes a suffix.
fn prometheus_name(name: &str, suffix: Option<&str>) -> String {
    let base = name.replace('.', "_");
    match suffix {
        Some(suffix) => format!("{base}_{suffix}"),
        None => base,
    }
}

// ─── Instruments ─────────────────────────────────────────────────

/// Histogram keyed by a single label.
///
/// Every instrument keeps its value in the Prometheus registry. With the
/// `otlp` feature it also mirrors each update into an OpenTelemetry
/// instrument read by the push pipeline.
#[derive(Clone)]
pub struct Histogram {
    prom: HistogramVec,
    #[cfg(feature = "otlp")]
    otel: Option<(&'static str, opentelemetry::metrics::Histogram<f64>)>,
}

impl Histogram {
    pub fn observe(&self, label: &str, value: f64) {
        self.prom.with_label_values(&[label]).observe(value);

        #[cfg(feature = "otlp")]
        {
            if let Some((key, otel)) = &self.otel {
                otel.record(value, &[KeyValue::new(*key, label.to_owned())]);
            }
        }
    }

    #[cfg(test)]
    pub fn sample_count(&self, label: &str) -> u64 {
        self.prom.with_label_values(&[label]).get_sample_count()
    }

    #[cfg(test)]
    pub fn sample_sum(&self, label: &str) -> f64 {
        self.prom.with_label_values(&[label]).get_sample_sum()
    }
}

/// Monotonically increasing integer counter.
#[derive(Clone)]
pub struct Counter {
    prom: IntCounter,
    #[cfg(feature = "otlp")]
    otel: Option<opentelemetry::metrics::Counter<u64>>,
}

impl Counter {
    pub fn inc(&self) {
        self.prom.inc();

        #[cfg(feature = "otlp")]
        {
            if let Some(otel) = &self.otel {
                otel.add(1, &[]);
            }
        }
    }

    #[cfg(test)]
    pub fn get(&self) -> u64 {
        self.prom.get()
    }
}

/// Last-value gauge.
#[derive(Clone)]
pub struct Gauge {
    prom: prometheus::Gauge,
    #[cfg(feature = "otlp")]
    otel: Option<opentelemetry::metrics::Gauge<f64>>,
}

impl Gauge {
    pub fn set(&self, value: f64) {
        self.prom.set(value);

        #[cfg(feature = "otlp")]
        {
            if let Some(otel) = &self.otel {
                otel.record(value, &[]);
            }
        }
    }

    #[cfg(test)]
    pub fn get(&self) -> f64 {
        self.prom.get()
    }
}

// ─── Public types ────────────────────────────────────────────────

/// Metrics context shared by every component.
///
/// Owns its own registry instead of the process-wide default one, so each
/// instance (and each test) sees only the instruments created through it.
/// Instruments returned by the factory methods are cheap handles that are
/// safe to update from any task.
pub struct MetricsCollector {
    registry: Registry,
    #[cfg(feature = "otlp")]
    meter: Option<Meter>,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self {
            registry: Registry::new(),
            #[cfg(feature = "otlp")]
            meter: None,
        }
    }

    /// Collector whose instruments are also recorded through `meter`.
    #[cfg(feature = "otlp")]
    pub fn with_meter(meter: Meter) -> Self {
        Self {
            registry: Registry::new(),
            meter: Some(meter),
        }
    }

    /// Create and register a histogram with fixed bucket bounds, keyed by
    /// `label`.
    pub fn histogram(
        &self,
        name: &str,
        help: &str,
        unit: Option<Unit>,
        buckets: &[f64],
        label: &'static str,
    ) -> Result<Histogram> {
        let opts = HistogramOpts::new(prometheus_name(name, unit.map(Unit::suffix)), help)
            .buckets(buckets.to_vec());
        let prom = HistogramVec::new(opts, &[label])?;
        self.registry.register(Box::new(prom.clone()))?;

        Ok(Histogram {
            prom,
            #[cfg(feature = "otlp")]
            otel: self.meter.as_ref().map(|meter| {
                let mut builder = meter
                    .f64_histogram(name.to_owned())
                    .with_description(help.to_owned())
                    .with_boundaries(buckets.to_vec());
                if let Some(unit) = unit {
                    builder = builder.with_unit(unit.symbol());
                }
                (label, builder.build())
            }),
        })
    }

    /// Create and register a monotonically increasing integer counter.
    pub fn counter(&self, name: &str, help: &str) -> Result<Counter> {
        let prom = IntCounter::with_opts(Opts::new(prometheus_name(name, Some("total")), help))?;
        self.registry.register(Box::new(prom.clone()))?;

        Ok(Counter {
            prom,
            #[cfg(feature = "otlp")]
            otel: self.meter.as_ref().map(|meter| {
                meter
                    .u64_counter(name.to_owned())
                    .with_description(help.to_owned())
                    .build()
            }),
        })
    }

    /// Create and register a last-value gauge.
    pub fn gauge(&self, name: &str, help: &str, unit: Option<Unit>) -> Result<Gauge> {
        let prom = prometheus::Gauge::with_opts(Opts::new(
            prometheus_name(name, unit.map(Unit::suffix)),
            help,
        ))?;
        self.registry.register(Box::new(prom.clone()))?;

        Ok(Gauge {
            prom,
            #[cfg(feature = "otlp")]
            otel: self.meter.as_ref().map(|meter| {
                let mut builder = meter
                    .f64_gauge(name.to_owned())
                    .with_description(help.to_owned());
                if let Some(unit) = unit {
                    builder = builder.with_unit(unit.symbol());
                }
                builder.build()
            }),
        })
    }

    /// Render every registered metric in the Prometheus text format.
    #[cfg_attr(feature = "otlp", allow(dead_code))]
    pub fn encode(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let families = self.registry.gather();
        let mut buf = Vec::new();
        encoder.encode(&families, &mut buf)?;
        Ok(String::from_utf8(buf)?)
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}
