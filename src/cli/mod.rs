//! CLI argument parsing and run dispatch

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use meter_load_core::{
    aggregate, DrainOrder, LoadConfig, LogLevel, OrchestratorBuilder, RequestClient,
};
use meter_load_report::{ReportPaths, ReportWriter};

/// Log level names accepted by `--log-level`
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "UPPER")]
pub enum LogLevelArg {
    /// Per-request detail
    Debug,
    /// Run start and completion
    Info,
    /// Worker failures
    Warn,
    /// Errors only
    Err,
}

impl From<LogLevelArg> for LogLevel {
    fn from(level: LogLevelArg) -> Self {
        match level {
            LogLevelArg::Debug => LogLevel::Debug,
            LogLevelArg::Info => LogLevel::Info,
            LogLevelArg::Warn => LogLevel::Warn,
            LogLevelArg::Err => LogLevel::Err,
        }
    }
}

/// How worker results are collected
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DrainOrderArg {
    /// Worker 1 first, then worker 2, ...
    Spawn,
    /// Whichever worker finishes first
    Completion,
}

impl From<DrainOrderArg> for DrainOrder {
    fn from(order: DrainOrderArg) -> Self {
        match order {
            DrainOrderArg::Spawn => DrainOrder::SpawnOrder,
            DrainOrderArg::Completion => DrainOrder::Completion,
        }
    }
}

/// Load test for the meter usage endpoint
///
/// Starts N workers that each POST M usage points, then writes
/// `test_<N>_<M>.csv` (points per second) and `test_<N>_<M>.stat`
/// (min/max/avg/std of call durations) into the output directory.
#[derive(Parser, Debug)]
#[command(name = "meter-load")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Number of workers to run
    #[arg(short = 'N', long, visible_alias = "nb-children", default_value = "1")]
    pub workers: usize,

    /// Number of iterations for each worker
    #[arg(short = 'M', long, visible_alias = "nb-iterations", default_value = "1")]
    pub iterations: usize,

    /// Output directory
    #[arg(short = 'D', long = "output-directory", default_value = ".")]
    pub output_dir: PathBuf,

    /// Meter server address
    #[arg(short = 'S', long = "server-ip", default_value = "127.0.0.1")]
    pub server_ip: String,

    /// Meter server port
    #[arg(short = 'P', long, default_value = "8080")]
    pub server_port: u16,

    /// Log level
    #[arg(short = 'L', long, value_enum, default_value = "INFO")]
    pub log_level: LogLevelArg,

    /// Give up on a worker after this many seconds (default: wait forever)
    #[arg(long)]
    pub worker_timeout_secs: Option<u64>,

    /// Order in which worker results are collected
    #[arg(long, value_enum, default_value = "spawn")]
    pub drain_order: DrainOrderArg,

    /// Sleep a random 0-3s instead of calling the server
    #[arg(long)]
    pub simulate: bool,
}

impl Cli {
    /// Build the run configuration from the parsed arguments
    pub fn to_config(&self) -> LoadConfig {
        let mut config = LoadConfig::new(self.workers, self.iterations)
            .with_server(self.server_ip.clone(), self.server_port)
            .with_output_dir(self.output_dir.clone())
            .with_log_level(self.log_level.into())
            .with_drain_order(self.drain_order.into())
            .with_simulate(self.simulate);

        if let Some(secs) = self.worker_timeout_secs {
            config = config.with_worker_timeout(Duration::from_secs(secs));
        }

        config
    }

    /// Run the load test and write the report
    pub async fn run(&self) -> Result<()> {
        let config = self.to_config();

        tracing::info!(
            server_ip = %config.server_host,
            server_port = config.server_port,
            workers = config.workers,
            iterations = config.iterations,
            log_level = ?config.log_level,
            output_directory = %config.output_dir.display(),
            "Starting meter load test"
        );

        run_load(config, None).await?;
        Ok(())
    }
}

/// Run workers, aggregate their measurements and write the report files
///
/// `client` replaces the client the config would pick. Nothing is written
/// when no measurement was collected.
pub async fn run_load(
    config: LoadConfig,
    client: Option<Arc<dyn RequestClient>>,
) -> Result<ReportPaths> {
    let mut builder = OrchestratorBuilder::new().config(config.clone());
    if let Some(client) = client {
        builder = builder.client(client);
    }
    let orchestrator = builder.build().context("Invalid load configuration")?;

    let outcome = orchestrator.run_with_signal_handling().await?;

    let result = aggregate(&outcome.measurements).context("Nothing to report")?;
    let stats = result.stats();
    tracing::debug!(
        min = stats.min,
        max = stats.max,
        avg = stats.mean,
        std = stats.std_dev,
        "Request durations"
    );

    let paths = ReportWriter::new(&config.output_dir)
        .write(&result, config.workers, config.iterations)
        .context("Failed to write report")?;

    Ok(paths)
}
