//! # sniffy Telemetry
//!
//! Logging setup, the flow counter families, sniffy's own pipeline metrics
//! and the HTTP exporter that serves them.

pub mod error;
pub mod exporter;
pub mod logging;
pub mod metrics;
pub mod router;

pub use error::MetricsError;
pub use exporter::MetricsExporter;
pub use logging::EventLogger;
pub use metrics::{gather_metrics, DropReason, MetricsRecorder};
pub use router::FlowMetrics;
