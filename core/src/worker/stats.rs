//! Per-worker run summary

use std::time::Duration;

/// What a worker reports once its loop has ended cleanly
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct WorkerStats {
    /// Requests that completed and were measured
    pub completed: usize,

    /// Wall time spent in the request loop
    pub elapsed: Duration,
}

impl WorkerStats {
    /// Summary for `completed` requests over `elapsed`
    pub fn new(completed: usize, elapsed: Duration) -> Self {
        Self { completed, elapsed }
    }

    /// Completed requests per second of loop time
    pub fn requests_per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.completed as f64 / secs
        } else {
            0.0
        }
    }
}
