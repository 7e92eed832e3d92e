//! ## sniffy-telemetry::logging
//! **Subscriber setup and structured lifecycle events**
//!
//! `RUST_LOG` selects the filter, `info` when unset. Lifecycle events
//! (startup, sweep completion, shutdown) carry their metadata as
//! OpenTelemetry key/values inside a `lifecycle_event` span.

use opentelemetry::KeyValue;
use tracing::{info_span, Instrument};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Clone)]
pub struct EventLogger;

impl EventLogger {
    /// Installs the global fmt subscriber. Calling it twice is a no-op.
    pub fn init() {
        let _ = fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
            )
            .with_thread_names(true)
            .with_span_events(FmtSpan::NONE)
            .try_init();
    }

    #[inline]
    pub async fn log_event(event_type: &str, metadata: Vec<KeyValue>) {
        let span = info_span!(
            "lifecycle_event",
            event_type = event_type,
            otel.kind = "INTERNAL"
        );

        async {
            tracing::info!(metadata = ?metadata, "Lifecycle event");
        }
        .instrument(span)
        .await
    }
}
