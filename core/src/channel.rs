//! One-shot handoff of a worker's measurements to the orchestrator
//!
//! Each worker gets its own channel. The worker writes exactly once, with its
//! whole batch encoded as MessagePack, and the orchestrator reads exactly once.

use tokio::sync::oneshot;

use crate::error::{LoadError, LoadResult};
use crate::measurement::Measurement;

/// Create the channel for worker `worker`
pub fn handoff(worker: usize) -> (BatchSender, BatchReceiver) {
    let (tx, rx) = oneshot::channel();
    (BatchSender { worker, tx }, BatchReceiver { worker, rx })
}

/// Encode a batch of measurements for transfer
pub fn encode_batch(batch: &[Measurement]) -> LoadResult<Vec<u8>> {
    rmp_serde::to_vec(batch).map_err(|e| LoadError::Encode(e.to_string()))
}

/// Decode a batch produced by [`encode_batch`]
pub fn decode_batch(bytes: &[u8]) -> Result<Vec<Measurement>, rmp_serde::decode::Error> {
    rmp_serde::from_slice(bytes)
}

/// Worker side of the handoff
#[derive(Debug)]
pub struct BatchSender {
    worker: usize,
    tx: oneshot::Sender<Vec<u8>>,
}

impl BatchSender {
    /// Send the full batch; consumes the sender
    pub fn send(self, batch: &[Measurement]) -> LoadResult<()> {
        let Self { worker, tx } = self;
        let bytes = encode_batch(batch)?;
        tx.send(bytes)
            .map_err(|_| LoadError::transfer(worker, "orchestrator is no longer receiving"))
    }

    /// Worker index this sender belongs to
    pub fn worker(&self) -> usize {
        self.worker
    }
}

/// Orchestrator side of the handoff
#[derive(Debug)]
pub struct BatchReceiver {
    worker: usize,
    rx: oneshot::Receiver<Vec<u8>>,
}

impl BatchReceiver {
    /// Wait for the worker's batch and decode it
    ///
    /// Fails with [`LoadError::Transfer`] if the worker went away without
    /// sending or the payload does not decode.
    pub async fn recv(self) -> LoadResult<Vec<Measurement>> {
        let Self { worker, rx } = self;
        let bytes = rx
            .await
            .map_err(|_| LoadError::transfer(worker, "worker exited without sending a batch"))?;
        decode_batch(&bytes).map_err(|e| LoadError::transfer(worker, e))
    }

    /// Worker index this receiver belongs to
    pub fn worker(&self) -> usize {
        self.worker
    }
}
