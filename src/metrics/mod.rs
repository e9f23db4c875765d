pub mod collector;
#[cfg(not(feature = "otlp"))]
pub mod exposition;
pub mod instruments;
#[cfg(feature = "otlp")]
pub mod push;

pub use collector::MetricsCollector;
pub use instruments::{ApiMetrics, BackgroundTaskMetrics};
#[cfg(feature = "otlp")]
pub use push::PushPipeline;
