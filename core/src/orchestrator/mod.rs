//! Orchestrator for load run lifecycle management
//!
//! The Orchestrator coordinates a complete run:
//! - Spawning workers 1..=N, each with its own one-shot channel
//! - Draining channels, by default strictly in spawn order: receive worker
//!   c's batch, wait for worker c's task, then move on to c + 1
//! - Logging failed workers without abandoning the others
//! - Returning the concatenated measurements for aggregation
//!
//! # Example
//!
//! ```ignore
//! use meter_load_core::{aggregate, OrchestratorBuilder};
//!
//! let orchestrator = OrchestratorBuilder::new()
//!     .workers(10)
//!     .iterations(1000)
//!     .server("127.0.0.1", 8080)
//!     .build()?;
//!
//! let outcome = orchestrator.run_with_signal_handling().await?;
//! let result = aggregate(&outcome.measurements)?;
//! ```

mod aggregator;
mod builder;
mod executor;

pub use aggregator::{aggregate, AggregatedResult, DurationStats};
pub use builder::OrchestratorBuilder;
pub use executor::{Orchestrator, RunOutcome};
