//! # sniffy Configuration System
//!
//! One immutable snapshot, loaded once at process start.
//!
//! ## Sources
//! - **Defaults**: every field has one, so an almost empty file is valid
//! - **YAML file**: the path given on the command line
//! - **Environment**: `SNIFFY_<SECTION>__<KEY>` overrides
//!
//! There is no hot reload.

#![warn(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

mod capture;
mod error;
mod exporter;
mod validation;

pub use capture::CaptureConfig;
pub use error::ConfigError;
pub use exporter::ExporterConfig;

/// Top‑level configuration container.
#[derive(Debug, Serialize, Deserialize, Validate, Default, Clone, PartialEq)]
pub struct SniffyConfig {
    /// Packet capture parameters.
    #[validate(nested)]
    #[serde(default)]
    pub pcap_input: CaptureConfig,

    /// Metrics exporter and flow expiry.
    #[validate(nested)]
    #[serde(default)]
    pub prometheus_output: ExporterConfig,
}

impl SniffyConfig {
    /// Load configuration from `path`, layered over the defaults and under
    /// `SNIFFY_*` environment variables.
    ///
    /// A missing file is an error: the file is the one required input.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(ConfigError::FileNotFound(PathBuf::from(path)));
        }

        Figment::from(Serialized::defaults(SniffyConfig::default()))
            .merge(Yaml::file(path))
            .merge(Env::prefixed("SNIFFY_").split("__"))
            .extract()
            .map_err(ConfigError::from)
            .and_then(|config: Self| {
                config.validate()?;
                Ok(config)
            })
    }
}
