use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Instrument creation, registration or exposition failed.
    #[error("metrics: {0}")]
    Metrics(#[from] prometheus::Error),

    #[error("exposition is not valid UTF-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("server exited with error: {0}")]
    Serve(#[source] std::io::Error),

    #[error("background task did not stop cleanly: {0}")]
    BackgroundTask(#[from] tokio::task::JoinError),

    #[cfg(feature = "otlp")]
    #[error("failed to create OTLP exporter: {0}")]
    Export(String),

    /// Final export on shutdown failed; unflushed samples are lost.
    #[cfg(feature = "otlp")]
    #[error("failed to flush metrics on shutdown: {0}")]
    Flush(String),
}

// Only exposition failures ever reach a response; everything else is fatal.
impl IntoResponse for Error {
    fn into_response(self) -> Response {
        tracing::error!(error = %self, "request failed");
        (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()).into_response()
    }
}
