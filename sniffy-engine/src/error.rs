use sniffy_capture::CaptureError;
use sniffy_config::ConfigError;
use sniffy_core::field::FieldError;
use sniffy_telemetry::MetricsError;
use thiserror::Error;
use tokio::task::JoinError;

/// Setup and runtime failures that end the process.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Field selection error: {0}")]
    Field(#[from] FieldError),

    #[error("Capture error: {0}")]
    Capture(#[from] CaptureError),

    #[error("Metrics error: {0}")]
    Metrics(#[from] MetricsError),

    #[error("Task failed: {0}")]
    Task(String),
}

impl From<JoinError> for EngineError {
    fn from(err: JoinError) -> Self {
        EngineError::Task(err.to_string())
    }
}
