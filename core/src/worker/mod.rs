//! Worker module for issuing timed requests
//!
//! A Worker is one isolated request loop. Each Worker is a tokio task that
//! owns everything it touches:
//!
//! 1. Issues a POST to its own path (`.../load_<id>`) via a RequestClient
//! 2. Times the call and records a Measurement
//! 3. Repeats for the configured number of iterations, strictly in sequence
//! 4. Sends its whole batch to the orchestrator in one transfer
//!
//! A failed request stops the loop. The batch gathered so far is still sent,
//! and the failure is returned from the task for the orchestrator to log.
//!
//! # Example
//!
//! ```ignore
//! use meter_load_core::channel::handoff;
//! use meter_load_core::worker::WorkerBuilder;
//!
//! let (batch_tx, batch_rx) = handoff(1);
//! let worker = WorkerBuilder::new(1)
//!     .client(client)
//!     .iterations(100)
//!     .batch_tx(batch_tx)
//!     .build()?;
//!
//! let task = tokio::spawn(worker.run());
//! let measurements = batch_rx.recv().await?;
//! ```

mod builder;
mod executor;
mod stats;

pub use builder::WorkerBuilder;
pub use executor::Worker;
pub use stats::WorkerStats;

#[cfg(test)]
mod tests;
