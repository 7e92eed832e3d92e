use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("Failed to bind metrics exporter to {address}: {source}")]
    BindAddress {
        address: String,
        #[source]
        source: io::Error,
    },

    #[error("Metrics exporter error: {0}")]
    Serve(#[from] io::Error),

    #[error("Prometheus registry error: {0}")]
    Prometheus(#[from] prometheus::Error),
}

impl MetricsError {
    pub fn bind_address(address: impl Into<String>, source: io::Error) -> Self {
        Self::BindAddress {
            address: address.into(),
            source,
        }
    }
}
