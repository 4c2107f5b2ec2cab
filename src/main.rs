//! meter-load - parallel load generator for the meter usage endpoint

use anyhow::Result;
use clap::Parser;
use meter_load_core::LogLevel;
use tracing_subscriber::EnvFilter;

mod cli;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    // RUST_LOG wins over --log-level when set
    let level = LogLevel::from(cli.log_level).as_tracing_level();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str())),
        )
        .init();

    cli.run().await
}
