//! Builder pattern for Worker construction

use std::sync::Arc;

use tracing::Span;

use crate::channel::BatchSender;
use crate::client::RequestClient;
use crate::error::{LoadError, LoadResult};

use super::executor::Worker;

/// Builder for creating Worker instances
///
/// # Example
/// ```ignore
/// let (batch_tx, batch_rx) = handoff(1);
/// let worker = WorkerBuilder::new(1)
///     .client(client)
///     .iterations(100)
///     .batch_tx(batch_tx)
///     .build()?;
/// ```
pub struct WorkerBuilder {
    id: usize,
    client: Option<Arc<dyn RequestClient>>,
    iterations: Option<usize>,
    batch_tx: Option<BatchSender>,
    span: Option<Span>,
}

impl WorkerBuilder {
    /// Create a new builder for worker `id` (1-based)
    pub fn new(id: usize) -> Self {
        Self {
            id,
            client: None,
            iterations: None,
            batch_tx: None,
            span: None,
        }
    }

    /// Set the request client
    pub fn client(mut self, client: Arc<dyn RequestClient>) -> Self {
        self.client = Some(client);
        self
    }

    /// Set the number of sequential requests
    pub fn iterations(mut self, iterations: usize) -> Self {
        self.iterations = Some(iterations);
        self
    }

    /// Set the channel the finished batch is sent on
    pub fn batch_tx(mut self, tx: BatchSender) -> Self {
        self.batch_tx = Some(tx);
        self
    }

    /// Set the span the worker logs under
    ///
    /// Defaults to a root `worker` span carrying the worker id.
    pub fn span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    /// Build the Worker
    ///
    /// # Errors
    /// Returns an error if a required field is missing or the channel belongs
    /// to a different worker.
    pub fn build(self) -> LoadResult<Worker> {
        let client = self.client.ok_or(LoadError::missing_config("client"))?;
        let iterations = self
            .iterations
            .ok_or(LoadError::missing_config("iterations"))?;
        let batch_tx = self
            .batch_tx
            .ok_or(LoadError::missing_config("batch_tx"))?;

        if batch_tx.worker() != self.id {
            return Err(LoadError::config(format!(
                "worker {} was given the channel of worker {}",
                self.id,
                batch_tx.worker()
            )));
        }

        let span = self
            .span
            .unwrap_or_else(|| tracing::info_span!("worker", worker_id = self.id));

        Ok(Worker::new(self.id, iterations, client, batch_tx, span))
    }
}
