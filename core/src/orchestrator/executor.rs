//! Orchestrator execution logic

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use futures::stream::{FuturesUnordered, StreamExt};
use tokio::task::{AbortHandle, JoinHandle};
use tracing::Span;

use crate::channel::{handoff, BatchReceiver};
use crate::client::ClientFactory;
use crate::config::{DrainOrder, LoadConfig};
use crate::error::{LoadError, LoadResult};
use crate::measurement::Measurement;
use crate::worker::{WorkerBuilder, WorkerStats};

/// A spawned worker: its task and the receiving end of its channel
#[derive(Debug)]
pub(crate) struct WorkerHandle {
    index: usize,
    task: JoinHandle<LoadResult<WorkerStats>>,
    batch_rx: BatchReceiver,
}

/// What one drained worker contributed
#[derive(Debug)]
struct Drained {
    index: usize,
    measurements: Vec<Measurement>,
    failed: bool,
}

/// Everything collected by a run
#[derive(Debug, Clone, Default)]
pub struct RunOutcome {
    /// Measurements from every drained worker, concatenated
    pub measurements: Vec<Measurement>,

    /// Number of workers started
    pub workers_spawned: usize,

    /// Number of workers whose channel and task were both collected
    pub workers_drained: usize,

    /// Number of drained workers that failed or lost their payload
    pub workers_failed: usize,

    /// Whether the drain was cut short by a shutdown signal
    pub interrupted: bool,
}

impl RunOutcome {
    /// Total number of measurements collected
    pub fn total(&self) -> usize {
        self.measurements.len()
    }

    fn absorb(&mut self, drained: Drained) {
        self.workers_drained += 1;
        if drained.failed {
            self.workers_failed += 1;
        }
        tracing::debug!(
            worker_id = drained.index,
            received = drained.measurements.len(),
            "Worker drained"
        );
        self.measurements.extend(drained.measurements);
    }
}

/// Orchestrator manages the run lifecycle
///
/// Spawns one task per worker, each with its own channel, then collects the
/// workers' batches and waits for their tasks to end.
pub struct Orchestrator {
    /// Run configuration
    pub(crate) config: LoadConfig,

    /// Source of each worker's request client
    pub(crate) clients: Arc<dyn ClientFactory>,

    /// Parent span of every worker span
    pub(crate) span: Span,
}

impl Orchestrator {
    /// Create a new orchestrator
    ///
    /// Use `OrchestratorBuilder` for validated construction.
    pub fn new(config: LoadConfig, clients: Arc<dyn ClientFactory>, span: Span) -> Self {
        Self {
            config,
            clients,
            span,
        }
    }

    /// Get the run configuration
    pub fn config(&self) -> &LoadConfig {
        &self.config
    }

    /// Run until every worker has been drained
    ///
    /// With no worker timeout configured, a worker that never finishes blocks
    /// the run forever.
    pub async fn run(&self) -> LoadResult<RunOutcome> {
        self.run_until(std::future::pending()).await
    }

    /// Run with Ctrl+C handling
    ///
    /// On Ctrl+C the drain stops and whatever was collected is returned.
    pub async fn run_with_signal_handling(&self) -> LoadResult<RunOutcome> {
        let ctrl_c = async {
            match tokio::signal::ctrl_c().await {
                Ok(()) => tracing::info!("Received Ctrl+C, stopping collection..."),
                Err(e) => {
                    tracing::error!(error = %e, "Failed to listen for Ctrl+C");
                    std::future::pending::<()>().await;
                }
            }
        };

        self.run_until(ctrl_c).await
    }

    /// Run until every worker has been drained or `shutdown` completes
    ///
    /// When `shutdown` wins, workers not yet drained are aborted and the
    /// outcome is marked as interrupted.
    pub async fn run_until<F>(&self, shutdown: F) -> LoadResult<RunOutcome>
    where
        F: Future<Output = ()>,
    {
        let start = Instant::now();

        tracing::info!(
            parent: &self.span,
            workers = self.config.workers,
            iterations = self.config.iterations,
            server = %format!("{}:{}", self.config.server_host, self.config.server_port),
            client = self.clients.name(),
            drain_order = ?self.config.drain_order,
            "Starting load run"
        );

        let handles = self.spawn_workers()?;
        let aborts: Vec<AbortHandle> = handles.iter().map(|h| h.task.abort_handle()).collect();

        let mut outcome = RunOutcome {
            workers_spawned: handles.len(),
            ..Default::default()
        };

        let interrupted = {
            let drain = self.drain(handles, &mut outcome);
            tokio::select! {
                biased;
                _ = drain => false,
                _ = shutdown => true,
            }
        };

        if interrupted {
            for abort in &aborts {
                abort.abort();
            }
            outcome.interrupted = true;
            tracing::error!(
                parent: &self.span,
                drained = outcome.workers_drained,
                spawned = outcome.workers_spawned,
                collected = outcome.total(),
                "Load run interrupted, keeping partial results"
            );
        }

        if outcome.workers_failed > 0 {
            tracing::warn!(
                parent: &self.span,
                failed = outcome.workers_failed,
                spawned = outcome.workers_spawned,
                "Some workers did not complete"
            );
        }

        tracing::info!(
            parent: &self.span,
            elapsed_secs = start.elapsed().as_secs_f64(),
            collected = outcome.total(),
            expected = self.config.total_requests(),
            "Load run completed"
        );

        Ok(outcome)
    }

    /// Spawn workers 1..=N, each with its own channel and client
    ///
    /// Every client is created before the first task starts, so a client
    /// error leaves nothing running.
    pub(crate) fn spawn_workers(&self) -> LoadResult<Vec<WorkerHandle>> {
        let clients = (1..=self.config.workers)
            .map(|index| self.clients.client_for(index))
            .collect::<LoadResult<Vec<_>>>()?;
        let mut handles = Vec::with_capacity(clients.len());

        for (index, client) in (1..).zip(clients) {
            let (batch_tx, batch_rx) = handoff(index);
            let worker = WorkerBuilder::new(index)
                .client(client)
                .iterations(self.config.iterations)
                .batch_tx(batch_tx)
                .span(tracing::info_span!(parent: &self.span, "worker", worker_id = index))
                .build()?;

            tracing::debug!(parent: &self.span, worker_id = index, "Starting worker");
            let task = tokio::spawn(worker.run());

            handles.push(WorkerHandle {
                index,
                task,
                batch_rx,
            });
        }

        Ok(handles)
    }

    async fn drain(&self, handles: Vec<WorkerHandle>, outcome: &mut RunOutcome) {
        match self.config.drain_order {
            DrainOrder::SpawnOrder => {
                for handle in handles {
                    let drained = self.drain_one(handle).await;
                    outcome.absorb(drained);
                }
            }
            DrainOrder::Completion => {
                let mut pending: FuturesUnordered<_> =
                    handles.into_iter().map(|h| self.drain_one(h)).collect();
                while let Some(drained) = pending.next().await {
                    outcome.absorb(drained);
                }
            }
        }
    }

    /// Receive one worker's batch, then wait for its task to end
    ///
    /// Never fails: a lost payload or a failed worker is logged and the
    /// worker contributes whatever it managed to send.
    async fn drain_one(&self, handle: WorkerHandle) -> Drained {
        let WorkerHandle {
            index,
            task,
            batch_rx,
        } = handle;

        let received = match self.config.worker_timeout {
            None => batch_rx.recv().await,
            Some(limit) => match tokio::time::timeout(limit, batch_rx.recv()).await {
                Ok(received) => received,
                Err(_) => {
                    task.abort();
                    Err(LoadError::transfer(
                        index,
                        format!("no batch within {:?}", limit),
                    ))
                }
            },
        };

        let mut failed = false;
        let measurements = match received {
            Ok(batch) => batch,
            Err(e) => {
                failed = true;
                tracing::error!(parent: &self.span, worker_id = index, error = %e, "Worker transfer failed");
                Vec::new()
            }
        };

        match task.await {
            Ok(Ok(stats)) => {
                tracing::debug!(
                    parent: &self.span,
                    worker_id = index,
                    completed = stats.completed,
                    rps = stats.requests_per_second(),
                    "Worker completed"
                );
            }
            Ok(Err(e)) => {
                failed = true;
                tracing::error!(parent: &self.span, worker_id = index, error = %e, "Worker returned error");
            }
            Err(e) if e.is_cancelled() => {
                failed = true;
                tracing::warn!(parent: &self.span, worker_id = index, "Worker task was aborted");
            }
            Err(e) => {
                failed = true;
                tracing::error!(parent: &self.span, worker_id = index, error = %e, "Worker task panicked");
            }
        }

        Drained {
            index,
            measurements,
            failed,
        }
    }
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("config", &self.config)
            .field("client", &self.clients.name())
            .finish()
    }
}
