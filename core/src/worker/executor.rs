//! Worker execution loop

use std::sync::Arc;

use tokio::time::Instant;
use tracing::{Instrument, Span};

use crate::channel::BatchSender;
use crate::client::{worker_path, RequestClient, RequestFailure};
use crate::error::LoadResult;
use crate::measurement::{epoch_seconds, Measurement};

use super::stats::WorkerStats;

/// Worker issues its requests one after another: post -> time -> record
///
/// Each worker owns its measurements until it hands the whole batch to the
/// orchestrator in one send. The first failed request ends the loop; the
/// measurements taken before it are still sent.
pub struct Worker {
    /// Worker identifier, 1-based
    id: usize,

    /// Number of requests to issue
    iterations: usize,

    /// Path this worker posts to
    path: String,

    /// Request client
    client: Arc<dyn RequestClient>,

    /// Handoff to the orchestrator
    batch_tx: BatchSender,

    /// Span all worker events are recorded under
    span: Span,
}

impl Worker {
    /// Create a new worker
    pub fn new(
        id: usize,
        iterations: usize,
        client: Arc<dyn RequestClient>,
        batch_tx: BatchSender,
        span: Span,
    ) -> Self {
        Self {
            id,
            iterations,
            path: worker_path(id),
            client,
            batch_tx,
            span,
        }
    }

    /// Run the worker loop
    ///
    /// Sends the collected batch, then returns the worker's stats, or the
    /// request failure that cut the loop short.
    pub async fn run(self) -> LoadResult<WorkerStats> {
        let span = self.span.clone();
        self.run_inner().instrument(span).await
    }

    async fn run_inner(self) -> LoadResult<WorkerStats> {
        // Grows with completed requests; M alone may not fit in memory
        let mut batch = Vec::new();
        let mut failure = None;
        let started = Instant::now();

        tracing::debug!(
            worker_id = self.id,
            iterations = self.iterations,
            path = %self.path,
            "Worker started"
        );

        for iteration in 0..self.iterations {
            match self.execute_one().await {
                Ok(measurement) => {
                    tracing::debug!(
                        worker_id = self.id,
                        iteration,
                        start_time = measurement.start_time(),
                        duration = measurement.duration(),
                        "Request completed"
                    );
                    batch.push(measurement);
                }
                Err(e) => {
                    tracing::warn!(
                        worker_id = self.id,
                        iteration,
                        error = %e,
                        "Request failed, abandoning remaining iterations"
                    );
                    failure = Some(e);
                    break;
                }
            }
        }

        let stats = WorkerStats::new(batch.len(), started.elapsed());
        let sent = self.batch_tx.send(&batch);

        tracing::debug!(
            worker_id = self.id,
            completed = stats.completed,
            failed = failure.is_some(),
            elapsed_secs = stats.elapsed.as_secs_f64(),
            "Worker finished"
        );

        if let Some(e) = failure {
            return Err(e.into());
        }
        sent?;

        Ok(stats)
    }

    /// Issue one request and time it
    async fn execute_one(&self) -> Result<Measurement, RequestFailure> {
        let start_time = epoch_seconds();
        let start = Instant::now();
        self.client.post(&self.path).await?;
        let duration = start.elapsed();

        Ok(Measurement::new(start_time, duration.as_secs_f64()))
    }

    /// Get the worker ID
    pub fn id(&self) -> usize {
        self.id
    }

    /// Number of requests this worker issues
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Path this worker posts to
    pub fn path(&self) -> &str {
        &self.path
    }
}

impl std::fmt::Debug for Worker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Worker")
            .field("id", &self.id)
            .field("iterations", &self.iterations)
            .field("path", &self.path)
            .field("client", &self.client.name())
            .finish()
    }
}
