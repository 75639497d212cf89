//! Vidstream CLI - Command-line interface
//!
//! Runs the HTTP API or probes local files through the streaming pipeline.

mod commands;

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use vidstream_core::config::VidstreamConfig;
use vidstream_core::tracing_setup::{CliLogLevel, init_tracing};

#[derive(Parser)]
#[command(name = "vidstream")]
#[command(about = "Byte-range video streaming server")]
#[command(version)]
struct Cli {
    /// Console log level (defaults to VIDSTREAM_LOG_LEVEL or info, RUST_LOG wins over both)
    #[arg(long, global = true)]
    log_level: Option<CliLogLevel>,

    /// Directory for the full debug log of this run (defaults to VIDSTREAM_LOGS_DIR or ./logs)
    #[arg(long, global = true)]
    logs_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: commands::Commands,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = VidstreamConfig::from_env().context("Invalid environment configuration")?;
    if let Some(level) = cli.log_level {
        config.logging.console_level = level.into();
    }
    if let Some(dir) = cli.logs_dir {
        config.logging.logs_dir = dir;
    }

    init_tracing(&config.logging).context("Failed to initialize logging")?;

    commands::handle_command(cli.command, config).await
}
