//! A single timed request

use serde::{Deserialize, Serialize};

/// One completed request: when it started and how long it took
///
/// Both values are in seconds. `start_time` is wall-clock time since the Unix
/// epoch; `duration` is never negative.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    start_time: f64,
    duration: f64,
}

impl Measurement {
    /// Create a measurement, clamping a negative duration to zero
    pub fn new(start_time: f64, duration: f64) -> Self {
        Self {
            start_time,
            duration: duration.max(0.0),
        }
    }

    /// Start of the request, seconds since the Unix epoch
    pub fn start_time(&self) -> f64 {
        self.start_time
    }

    /// Elapsed time of the request in seconds
    pub fn duration(&self) -> f64 {
        self.duration
    }

    /// The whole epoch second the request started in
    pub fn bucket(&self) -> i64 {
        self.start_time.floor() as i64
    }
}

/// Current wall-clock time as fractional seconds since the Unix epoch
pub fn epoch_seconds() -> f64 {
    let now = chrono::Utc::now();
    now.timestamp() as f64 + f64::from(now.timestamp_subsec_nanos()) / 1e9
}
