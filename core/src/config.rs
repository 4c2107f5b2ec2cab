//! Load run configuration types

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Order in which the orchestrator collects worker payloads
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrainOrder {
    /// Receive from worker 1, wait for it, then worker 2, and so on.
    ///
    /// A fast worker with a high index still waits behind slower
    /// lower-indexed workers.
    #[default]
    SpawnOrder,

    /// Receive from whichever worker delivers first
    Completion,
}

/// Log verbosity accepted on the command line
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    /// Per-iteration detail
    Debug,
    /// Run start and completion
    #[default]
    Info,
    /// Worker failures only
    Warn,
    /// Errors only
    #[serde(rename = "ERR")]
    Err,
}

impl LogLevel {
    /// The matching tracing level
    pub fn as_tracing_level(self) -> tracing::Level {
        match self {
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Err => tracing::Level::ERROR,
        }
    }
}

/// Load run configuration
///
/// Describes one fixed workload: `workers` concurrent workers, each issuing
/// `iterations` sequential POSTs against `server_host:server_port`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoadConfig {
    /// Number of concurrent workers
    pub workers: usize,

    /// Requests issued by each worker
    pub iterations: usize,

    /// Directory receiving the report files
    pub output_dir: PathBuf,

    /// Target server host
    pub server_host: String,

    /// Target server port
    pub server_port: u16,

    /// Log verbosity
    #[serde(default)]
    pub log_level: LogLevel,

    /// Upper bound on how long the orchestrator waits for one worker.
    /// `None` waits forever.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub worker_timeout: Option<Duration>,

    /// How worker payloads are collected
    #[serde(default)]
    pub drain_order: DrainOrder,

    /// Replace HTTP calls with random sleeps
    #[serde(default)]
    pub simulate: bool,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            workers: 1,
            iterations: 1,
            output_dir: PathBuf::from("."),
            server_host: "127.0.0.1".to_string(),
            server_port: 8080,
            log_level: LogLevel::default(),
            worker_timeout: None,
            drain_order: DrainOrder::default(),
            simulate: false,
        }
    }
}

impl LoadConfig {
    /// Create a new config for `workers` x `iterations` requests
    pub fn new(workers: usize, iterations: usize) -> Self {
        Self {
            workers,
            iterations,
            ..Default::default()
        }
    }

    /// Set the target server
    pub fn with_server(mut self, host: impl Into<String>, port: u16) -> Self {
        self.server_host = host.into();
        self.server_port = port;
        self
    }

    /// Set the output directory
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Set the log level
    pub fn with_log_level(mut self, level: LogLevel) -> Self {
        self.log_level = level;
        self
    }

    /// Bound the wait on each worker
    pub fn with_worker_timeout(mut self, timeout: Duration) -> Self {
        self.worker_timeout = Some(timeout);
        self
    }

    /// Set the drain order
    pub fn with_drain_order(mut self, order: DrainOrder) -> Self {
        self.drain_order = order;
        self
    }

    /// Use the simulated client instead of HTTP
    pub fn with_simulate(mut self, simulate: bool) -> Self {
        self.simulate = simulate;
        self
    }

    /// Total number of requests the run issues when nothing fails
    pub fn total_requests(&self) -> usize {
        self.workers * self.iterations
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workers == 0 {
            return Err(ConfigError::InvalidWorkers(
                "worker count must be at least 1".into(),
            ));
        }

        if self.iterations == 0 {
            return Err(ConfigError::InvalidIterations(
                "iteration count must be at least 1".into(),
            ));
        }

        if self.server_host.trim().is_empty() {
            return Err(ConfigError::InvalidServer("server host is empty".into()));
        }

        if self.server_port == 0 {
            return Err(ConfigError::InvalidServer(
                "server port must be non-zero".into(),
            ));
        }

        if let Some(timeout) = self.worker_timeout {
            if timeout.is_zero() {
                return Err(ConfigError::InvalidTimeout(
                    "worker timeout must be positive".into(),
                ));
            }
        }

        Ok(())
    }
}

/// Configuration validation errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Invalid worker count
    #[error("Invalid worker count: {0}")]
    InvalidWorkers(String),

    /// Invalid iteration count
    #[error("Invalid iteration count: {0}")]
    InvalidIterations(String),

    /// Invalid host or port
    #[error("Invalid server address: {0}")]
    InvalidServer(String),

    /// Invalid worker timeout
    #[error("Invalid worker timeout: {0}")]
    InvalidTimeout(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LoadConfig::default();
        assert_eq!(config.workers, 1);
        assert_eq!(config.iterations, 1);
        assert_eq!(config.server_host, "127.0.0.1");
        assert_eq!(config.server_port, 8080);
        assert_eq!(config.log_level, LogLevel::Info);
        assert_eq!(config.drain_order, DrainOrder::SpawnOrder);
        assert!(config.worker_timeout.is_none());
        assert!(!config.simulate);
    }

    #[test]
    fn test_config_builder_pattern() {
        let config = LoadConfig::new(3, 5)
            .with_server("10.0.0.7", 9090)
            .with_output_dir("/tmp/out")
            .with_log_level(LogLevel::Debug)
            .with_drain_order(DrainOrder::Completion)
            .with_worker_timeout(Duration::from_secs(30));

        assert_eq!(config.total_requests(), 15);
        assert_eq!(config.server_host, "10.0.0.7");
        assert_eq!(config.server_port, 9090);
        assert_eq!(config.output_dir, PathBuf::from("/tmp/out"));
        assert_eq!(config.drain_order, DrainOrder::Completion);
        assert_eq!(config.worker_timeout, Some(Duration::from_secs(30)));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_zero_workers() {
        let config = LoadConfig::new(0, 5);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidWorkers(_))
        ));
    }

    #[test]
    fn test_config_validation_zero_iterations() {
        let config = LoadConfig::new(2, 0);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidIterations(_))
        ));
    }

    #[test]
    fn test_config_validation_bad_server() {
        assert!(LoadConfig::new(1, 1).with_server("", 80).validate().is_err());
        assert!(LoadConfig::new(1, 1)
            .with_server("localhost", 0)
            .validate()
            .is_err());
    }

    #[test]
    fn test_config_validation_zero_timeout() {
        let config = LoadConfig::new(1, 1).with_worker_timeout(Duration::ZERO);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidTimeout(_))
        ));
    }

    #[test]
    fn test_log_level_mapping() {
        assert_eq!(LogLevel::Debug.as_tracing_level(), tracing::Level::DEBUG);
        assert_eq!(LogLevel::Err.as_tracing_level(), tracing::Level::ERROR);
    }

    #[test]
    fn test_config_serialization() {
        let config = LoadConfig::new(4, 10).with_log_level(LogLevel::Err);

        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("\"log_level\":\"ERR\""));
        assert!(json.contains("\"drain_order\":\"spawn_order\""));

        let deserialized: LoadConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized.workers, 4);
        assert_eq!(deserialized.iterations, 10);
        assert_eq!(deserialized.log_level, LogLevel::Err);
    }

    #[test]
    fn test_config_rejects_unknown_keys() {
        let json = r#"{
            "workers": 2,
            "iterations": 3,
            "output_dir": ".",
            "server_host": "127.0.0.1",
            "server_port": 8080,
            "log_level": "INFO",
            "retries": 5
        }"#;

        let err = serde_json::from_str::<LoadConfig>(json).unwrap_err();
        assert!(err.to_string().contains("unknown field `retries`"));
    }
}
