//! Prometheus exporter configuration (`prometheus_output` section).
//!
//! Controls the `/metrics` listener and the cardinality guard: how long an idle
//! flow keeps its series and how often the expiry sweep runs.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use validator::{self, Validate};

/// Exporter and flow expiry configuration.
#[derive(Debug, Serialize, Deserialize, Validate, Clone, PartialEq)]
pub struct ExporterConfig {
    /// Serve `/metrics`. When disabled there is no output and sniffy exits.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Seconds a flow may stay idle before its series is retracted.
    #[validate(range(min = 1))]
    #[serde(default = "default_expire_after")]
    pub prometheus_expire_after: u64,

    /// Seconds between expiry sweeps.
    #[validate(range(min = 1))]
    #[serde(default = "default_expiration_interval")]
    pub prometheus_expiration_interval: u64,

    /// TCP port of the metrics listener.
    #[validate(range(min = 1))]
    #[serde(default = "default_metrics_port")]
    pub prometheus_metrics_port: u16,

    /// Flow fields left out of keys and labels.
    #[serde(default)]
    pub prometheus_exclude_fields: Vec<String>,
}

fn default_true() -> bool {
    true
}

fn default_expire_after() -> u64 {
    900
}

fn default_expiration_interval() -> u64 {
    60
}

fn default_metrics_port() -> u16 {
    8080
}

impl ExporterConfig {
    pub fn expiration_interval(&self) -> Duration {
        Duration::from_secs(self.prometheus_expiration_interval)
    }
}

impl Default for ExporterConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            prometheus_expire_after: default_expire_after(),
            prometheus_expiration_interval: default_expiration_interval(),
            prometheus_metrics_port: default_metrics_port(),
            prometheus_exclude_fields: Vec::new(),
        }
    }
}
