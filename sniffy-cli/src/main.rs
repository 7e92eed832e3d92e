//! ## sniffy-cli
//! **`sniffy` binary**
//!
//! Loads the configuration named by `--config` and runs capture and export
//! until Ctrl-C. Exits non-zero when configuration, capture setup or the
//! exporter fail.

use clap::Parser;

mod commands;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    commands::run_command(Cli::parse()).await
}
