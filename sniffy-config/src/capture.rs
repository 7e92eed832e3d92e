// sniffy-config/src/capture.rs
//! Packet capture configuration (`pcap_input` section).
//!
//! Defines how frames are acquired from the live interface:
//! - Interface and snap length handed to libpcap
//! - Read timeout derived from the flush interval
//! - Local hardware address used for traffic direction

use std::time::Duration;

use serde::{Deserialize, Serialize};
use validator::{self, Validate};

use crate::error::ConfigError;
use crate::validation;

/// Packet capture configuration.
#[derive(Debug, Serialize, Deserialize, Validate, Clone, PartialEq)]
pub struct CaptureConfig {
    /// Network interface for live capture.
    #[validate(custom(function = validation::validate_interface))]
    #[serde(default = "default_interface")]
    pub interface_name: String,

    /// Maximum number of bytes captured per frame.
    #[validate(range(min = 64, max = 262144))]
    #[serde(default = "default_snap_len")]
    pub snap_len: u32,

    /// Log every decoded frame. Very noisy, debugging only.
    #[serde(default)]
    pub log_all_packets: bool,

    /// Statistics/flush interval in humantime syntax (e.g. `10s`, `1m30s`).
    /// Half of it becomes the capture read timeout.
    #[validate(custom(function = validation::validate_duration))]
    #[serde(default = "default_flush_after")]
    pub flush_after: String,

    /// Hardware address of this host. Empty means detect from the interface.
    #[validate(custom(function = validation::validate_mac_address))]
    #[serde(default)]
    pub local_mac_address: String,
}

fn default_interface() -> String {
    "eth0".into()
}

fn default_snap_len() -> u32 {
    65536
}

fn default_flush_after() -> String {
    "10s".into()
}

impl CaptureConfig {
    /// Parsed `flush_after`.
    pub fn flush_duration(&self) -> Result<Duration, ConfigError> {
        humantime::parse_duration(self.flush_after.trim()).map_err(|source| {
            ConfigError::InvalidDuration {
                value: self.flush_after.clone(),
                source,
            }
        })
    }

    /// Read timeout applied to the capture handle: half the flush interval,
    /// never below one millisecond.
    pub fn read_timeout(&self) -> Result<Duration, ConfigError> {
        Ok((self.flush_duration()? / 2).max(Duration::from_millis(1)))
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            interface_name: default_interface(),
            snap_len: default_snap_len(),
            log_all_packets: false,
            flush_after: default_flush_after(),
            local_mac_address: String::new(),
        }
    }
}
