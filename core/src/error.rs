//! Error types for meter-load-core

use thiserror::Error;

use crate::client::RequestFailure;

/// Core error type
#[derive(Error, Debug)]
pub enum LoadError {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// A required builder field was never set
    #[error("missing configuration: {0}")]
    MissingConfig(&'static str),

    /// A request issued by a worker failed
    #[error("request failed: {0}")]
    Request(#[from] RequestFailure),

    /// A worker's payload could not be received or decoded
    #[error("transfer from worker {worker} failed: {reason}")]
    Transfer {
        /// Index of the worker whose payload was lost
        worker: usize,
        /// What went wrong
        reason: String,
    },

    /// Aggregation was attempted over zero measurements
    #[error("no measurements were collected; statistics are undefined")]
    EmptyResultSet,

    /// A worker's payload could not be encoded
    #[error("encode error: {0}")]
    Encode(String),
}

impl LoadError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an error for a builder field that was not provided
    pub fn missing_config(field: &'static str) -> Self {
        Self::MissingConfig(field)
    }

    /// Create a transfer error for the given worker
    pub fn transfer(worker: usize, reason: impl ToString) -> Self {
        Self::Transfer {
            worker,
            reason: reason.to_string(),
        }
    }

    /// Whether this error is a lost or unreadable worker payload
    pub fn is_transfer(&self) -> bool {
        matches!(self, Self::Transfer { .. })
    }
}

/// Result type alias
pub type LoadResult<T> = std::result::Result<T, LoadError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_config_names_field() {
        let err = LoadError::missing_config("client");
        assert!(err.to_string().contains("client"));
    }

    #[test]
    fn test_transfer_error_display() {
        let err = LoadError::transfer(3, "channel closed");
        assert!(err.is_transfer());
        assert_eq!(
            err.to_string(),
            "transfer from worker 3 failed: channel closed"
        );
    }

    #[test]
    fn test_empty_result_set_is_distinct() {
        let err = LoadError::EmptyResultSet;
        assert!(!err.is_transfer());
        assert!(matches!(err, LoadError::EmptyResultSet));
    }
}
