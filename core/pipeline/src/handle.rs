//! Background execution with event channel and cancellation.

use std::path::PathBuf;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::events::{BatchEvent, BatchReport, BatchState};
use crate::job::{BatchId, BatchJob};
use crate::runner::run_blocking;
use dmalock_common::{Error, LockMode, Password, Result};

/// A batch running on a blocking worker.
///
/// Dropping the handle does not stop the batch; call [`cancel`](Self::cancel).
pub struct BatchHandle {
    id: BatchId,
    events: mpsc::UnboundedReceiver<BatchEvent>,
    state: watch::Receiver<BatchState>,
    cancel: CancellationToken,
    task: JoinHandle<BatchReport>,
}

impl BatchHandle {
    pub fn id(&self) -> &BatchId {
        &self.id
    }

    /// Next event, or `None` once `Finished` has been received.
    pub async fn next_event(&mut self) -> Option<BatchEvent> {
        self.events.recv().await
    }

    /// Current lifecycle state.
    pub fn state(&self) -> BatchState {
        *self.state.borrow()
    }

    /// Ask the batch to stop before its next file.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Token that cancels this batch, for wiring to signal handlers.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Wait for the batch to finish and return its report.
    ///
    /// Events not yet read are discarded.
    pub async fn wait(self) -> Result<BatchReport> {
        self.task
            .await
            .map_err(|e| Error::Internal(format!("batch worker failed: {}", e)))
    }
}

/// Start `job` on the blocking thread pool.
///
/// Must be called from within a Tokio runtime.
pub fn spawn(job: BatchJob) -> BatchHandle {
    let id = job.id().clone();
    let (event_tx, events) = mpsc::unbounded_channel();
    let (state_tx, state) = watch::channel(BatchState::Idle);
    let cancel = CancellationToken::new();
    let token = cancel.clone();

    debug!(batch = %id, "Spawning {} worker", job.mode());
    let task = tokio::task::spawn_blocking(move || {
        run_blocking(&job, &token, |event| {
            match &event {
                BatchEvent::Started { .. } => {
                    state_tx.send_replace(BatchState::Running);
                }
                BatchEvent::Finished { outcome, .. } => {
                    state_tx.send_replace(BatchState::from(outcome));
                }
                BatchEvent::Progress { .. } => {}
            }
            // The receiver may be gone; the report still comes back via the task.
            let _ = event_tx.send(event);
        })
    });

    BatchHandle {
        id,
        events,
        state,
        cancel,
        task,
    }
}

/// Lock or unlock every eligible file under `directory` in the background.
pub fn run(directory: impl Into<PathBuf>, password: Password, mode: LockMode) -> BatchHandle {
    spawn(BatchJob::new(directory, password, mode))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::BatchOutcome;
    use crate::removal::RemovalPolicy;
    use std::fs;
    use tempfile::TempDir;

    async fn drain(handle: &mut BatchHandle) -> Vec<BatchEvent> {
        let mut events = Vec::new();
        while let Some(event) = handle.next_event().await {
            events.push(event);
        }
        events
    }

    #[tokio::test]
    async fn test_spawned_batch_streams_events() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("a.jpg"), b"a").unwrap();
        fs::write(temp.path().join("b.jpg"), b"b").unwrap();
        let job = BatchJob::new(temp.path(), Password::new("pw"), LockMode::Lock)
            .with_removal(RemovalPolicy::Delete);

        let mut handle = spawn(job);
        let events = drain(&mut handle).await;

        assert_eq!(events.len(), 4);
        assert!(matches!(events[0], BatchEvent::Started { .. }));
        assert!(matches!(
            events[3],
            BatchEvent::Finished { success: true, .. }
        ));
        assert_eq!(handle.state(), BatchState::Completed);

        let report = handle.wait().await.unwrap();
        assert_eq!(report.outcome, BatchOutcome::Completed { processed: 2 });
        assert!(temp.path().join("a.jpg.dma").exists());
    }

    #[tokio::test]
    async fn test_failed_batch_state() {
        let temp = TempDir::new().unwrap();
        let mut handle = run(temp.path().join("absent"), Password::new("pw"), LockMode::Lock);

        let events = drain(&mut handle).await;

        assert!(matches!(
            events.last(),
            Some(BatchEvent::Finished { success: false, .. })
        ));
        assert_eq!(handle.state(), BatchState::Failed);
    }

    #[tokio::test]
    async fn test_cancel_before_start_touches_nothing() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("a.jpg"), b"a").unwrap();
        let job = BatchJob::new(temp.path(), Password::new("pw"), LockMode::Lock);
        let cancel = CancellationToken::new();
        cancel.cancel();

        // Run inline with a pre-cancelled token to avoid racing the worker.
        let report = tokio::task::spawn_blocking(move || run_blocking(&job, &cancel, |_| {}))
            .await
            .unwrap();

        assert_eq!(
            report.outcome,
            BatchOutcome::Cancelled {
                processed: 0,
                remaining: 1
            }
        );
        assert!(temp.path().join("a.jpg").exists());
    }
}
