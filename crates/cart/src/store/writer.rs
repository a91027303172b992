//! Background persistence writer.
//!
//! Writes are queued on an unbounded channel and executed one at a time by
//! a single task, so the remote store sees them in the order the cart
//! changed. Failures are logged and dropped; the in-memory cart stays the
//! source of truth.

use std::sync::Arc;

use horno_core::Identity;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use crate::repository::{CartRepository, StoredLine};

#[derive(Debug)]
pub enum WriteOp {
    Save {
        identity: Identity,
        lines: Vec<StoredLine>,
    },
    Delete {
        identity: Identity,
    },
    Forget {
        identity: Identity,
    },
    Flush(oneshot::Sender<()>),
}

/// Handle used by the store to enqueue writes.
#[derive(Debug, Clone)]
pub struct WriteQueue {
    tx: mpsc::UnboundedSender<WriteOp>,
}

impl WriteQueue {
    /// Spawn the writer task on the current tokio runtime.
    pub fn spawn<R: CartRepository>(repository: Arc<R>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(run_writer(repository, rx));
        Self { tx }
    }

    pub fn enqueue(&self, op: WriteOp) {
        if self.tx.send(op).is_err() {
            warn!("Persistence writer has stopped; dropping cart write");
        }
    }

    /// Wait until every write queued before this call has been attempted.
    pub async fn flush(&self) {
        let (done_tx, done_rx) = oneshot::channel();
        self.enqueue(WriteOp::Flush(done_tx));
        let _ = done_rx.await;
    }
}

async fn run_writer<R: CartRepository>(
    repository: Arc<R>,
    mut rx: mpsc::UnboundedReceiver<WriteOp>,
) {
    while let Some(op) = rx.recv().await {
        match op {
            WriteOp::Save { identity, lines } => {
                if let Err(e) = repository.save(&identity, &lines).await {
                    warn!(user_id = %identity.id, error = %e, "Failed to save cart");
                } else {
                    debug!(user_id = %identity.id, lines = lines.len(), "Cart saved");
                }
            }
            WriteOp::Delete { identity } => {
                if let Err(e) = repository.delete(&identity).await {
                    warn!(user_id = %identity.id, error = %e, "Failed to delete stored cart");
                } else {
                    debug!(user_id = %identity.id, "Stored cart deleted");
                }
            }
            WriteOp::Forget { identity } => {
                repository.forget(&identity).await;
                debug!(user_id = %identity.id, "Forgot client-side cart state");
            }
            WriteOp::Flush(done) => {
                let _ = done.send(());
            }
        }
    }
    debug!("Persistence writer stopped");
}
