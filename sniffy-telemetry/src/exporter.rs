//! ## sniffy-telemetry::exporter
//! **Prometheus text exposition over HTTP**
//!
//! `GET /metrics` renders the shared registry: the three flow families plus
//! sniffy's own counters. Binding is split from serving so a taken port
//! fails startup before the capture device is opened.

use std::net::SocketAddr;

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use prometheus::Registry;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::error::MetricsError;
use crate::metrics::gather_metrics;

async fn metrics_handler(State(registry): State<Registry>) -> impl IntoResponse {
    match tokio::task::spawn_blocking(move || gather_metrics(&registry)).await {
        Ok(Ok(body)) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, prometheus::TEXT_FORMAT)],
            body,
        ),
        Ok(Err(e)) => {
            error!(error = %e, "Failed to encode metrics");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [(header::CONTENT_TYPE, "text/plain")],
                format!("Failed to encode metrics: {e}"),
            )
        }
        Err(e) => {
            error!(error = %e, "Metrics gathering task panicked");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [(header::CONTENT_TYPE, "text/plain")],
                "Failed to gather metrics".to_string(),
            )
        }
    }
}

fn router(registry: Registry) -> Router {
    Router::new()
        .route("/metrics", get(metrics_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(registry)
}

/// An exporter whose listener is bound but not yet serving.
pub struct MetricsExporter {
    listener: TcpListener,
    registry: Registry,
}

impl MetricsExporter {
    /// Binds `0.0.0.0:<port>`. Port 0 picks a free port.
    pub async fn bind(port: u16, registry: Registry) -> Result<Self, MetricsError> {
        let address = format!("0.0.0.0:{}", port);
        let listener = TcpListener::bind(&address)
            .await
            .map_err(|e| MetricsError::bind_address(&address, e))?;
        Ok(Self { listener, registry })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, MetricsError> {
        Ok(self.listener.local_addr()?)
    }

    /// Serves until the listener fails.
    pub async fn serve(self) -> Result<(), MetricsError> {
        if let Ok(addr) = self.listener.local_addr() {
            info!(address = %addr, "Metrics exporter listening");
        }
        axum::serve(self.listener, router(self.registry)).await?;
        Ok(())
    }
}
