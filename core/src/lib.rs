//! meter-load-core: worker orchestration and result aggregation
//!
//! This crate drives N isolated workers, each issuing M sequential POSTs
//! against the meter endpoint, and reduces their timings into:
//!
//! - A per-second arrival count series
//! - Min/max/mean/population standard deviation of request durations
//!
//! Workers hand their measurements back through single-use channels; see
//! [`orchestrator`] for the collection policy.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod channel;
pub mod client;
pub mod config;
pub mod error;
pub mod measurement;
pub mod orchestrator;
pub mod stats;
pub mod worker;

pub use client::{
    ClientFactory, HttpClientFactory, HttpRequestClient, RequestClient, RequestFailure,
    SharedClient, SimulatedClient,
};
pub use config::{ConfigError, DrainOrder, LoadConfig, LogLevel};
pub use error::{LoadError, LoadResult};
pub use measurement::Measurement;
pub use orchestrator::{
    aggregate, AggregatedResult, DurationStats, Orchestrator, OrchestratorBuilder, RunOutcome,
};
pub use worker::{Worker, WorkerBuilder, WorkerStats};
