use std::path::PathBuf;

use clap::Parser;
use sniffy_config::SniffyConfig;
use sniffy_engine::run_production_mode;
use sniffy_telemetry::EventLogger;
use tracing::{error, info};

pub const DEFAULT_CONFIG_PATH: &str = "configs/config.yaml";

/// Meters live traffic per flow and exports the counts to Prometheus.
#[derive(Parser, Debug)]
#[command(name = "sniffy", version, about)]
pub struct Cli {
    /// Path to the YAML configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,
}

pub async fn run_command(cli: Cli) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    EventLogger::init();

    let config = SniffyConfig::load_from_path(&cli.config).map_err(|e| {
        error!(path = %cli.config.display(), "{}", e);
        e
    })?;
    info!(path = %cli.config.display(), "Configuration loaded");

    run_production_mode(config).await.map_err(|e| {
        error!("{}", e);
        e
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults_to_configs_dir() {
        let cli = Cli::try_parse_from(["sniffy"]).unwrap();
        assert_eq!(cli.config, PathBuf::from("configs/config.yaml"));
    }

    #[test]
    fn short_and_long_config_flags() {
        let cli = Cli::try_parse_from(["sniffy", "-c", "/etc/sniffy.yaml"]).unwrap();
        assert_eq!(cli.config, PathBuf::from("/etc/sniffy.yaml"));
        let cli = Cli::try_parse_from(["sniffy", "--config", "x.yaml"]).unwrap();
        assert_eq!(cli.config, PathBuf::from("x.yaml"));
    }

    #[test]
    fn unknown_flags_are_rejected() {
        assert!(Cli::try_parse_from(["sniffy", "--interface", "eth0"]).is_err());
    }

    #[tokio::test]
    async fn missing_config_file_fails() {
        let cli = Cli {
            config: PathBuf::from("/nonexistent/sniffy.yaml"),
        };
        assert!(run_command(cli).await.is_err());
    }
}
