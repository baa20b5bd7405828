//! Delivery of queued operations and the background retry loop.

use crate::config::RetryConfig;
use crate::remote::RemoteClient;
use crate::session::{NotebookSession, SessionInner};
use notebook_protocol::NoteId;
use notebook_storage::StateBackend;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::task::JoinHandle;

/// Outcome of one pass over the queue.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DrainReport {
    /// Operations confirmed by the remote.
    pub sent: usize,
    /// The note whose operation failed and stopped the pass, if any.
    pub failed: Option<NoteId>,
    /// Notes whose operation the remote refused; they stay queued as
    /// `Failed` and did not stop the pass.
    pub rejected: Vec<NoteId>,
    /// Entries still queued after the pass.
    pub remaining: usize,
}

impl DrainReport {
    /// Returns true if the queue was emptied.
    pub fn is_complete(&self) -> bool {
        self.failed.is_none() && self.remaining == 0
    }
}

/// Sends queued operations in queue order.
///
/// Each entry is re-read right before sending so a merge that happened
/// since the pass started is sent in its latest form. The pass stops at the
/// first transient failure; later entries wait for the next trigger. An
/// entry the remote refuses outright is marked `Failed`, left queued for a
/// later pass, and skipped so it cannot hold back the notes behind it.
pub(crate) async fn drain<R: RemoteClient, B: StateBackend>(
    inner: &SessionInner<R, B>,
) -> DrainReport {
    let _guard = inner.drain_lock.lock().await;
    let batch: Vec<NoteId> = inner.state.lock().queue.iter().map(|e| e.note_id).collect();
    let mut report = DrainReport::default();

    for note_id in batch {
        let Some(op) = inner.current_entry(&note_id) else {
            continue;
        };

        match inner.send(&op).await {
            Ok(()) => {
                tracing::debug!(note_id = %op.note_id, kind = ?op.kind, "operation confirmed");
                report.sent += 1;
                inner.confirm(&op);
            }
            Err(e) if e.is_retryable() => {
                tracing::warn!(
                    note_id = %op.note_id,
                    kind = ?op.kind,
                    error = %e,
                    "operation failed, stopping batch"
                );
                inner.mark_failed(&op);
                report.failed = Some(op.note_id);
                break;
            }
            Err(e) => {
                tracing::error!(
                    note_id = %op.note_id,
                    kind = ?op.kind,
                    revision = op.revision,
                    error = %e,
                    "operation rejected, keeping it queued until the note changes"
                );
                inner.mark_failed(&op);
                report.rejected.push(op.note_id);
            }
        }
    }

    report.remaining = inner.state.lock().queue.len();
    report
}

/// Idle wait when nothing is queued; any trigger ends it early.
const IDLE_WAIT: Duration = Duration::from_secs(3600);

/// Background task that drains a session's queue.
///
/// A pass runs on start, after every enqueue, on reconnect, and on a
/// backoff timer after a transient failure. Rejected entries are only
/// attempted again on the next enqueue or reconnect.
pub struct RetryScheduler<R: RemoteClient, B: StateBackend> {
    session: NotebookSession<R, B>,
    retry: RetryConfig,
}

impl<R, B> RetryScheduler<R, B>
where
    R: RemoteClient + 'static,
    B: StateBackend + 'static,
{
    /// Creates a scheduler using the session's retry configuration.
    pub fn new(session: NotebookSession<R, B>) -> Self {
        let retry = session.config().retry.clone();
        Self { session, retry }
    }

    /// Overrides the retry configuration.
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Starts the scheduler on the current tokio runtime.
    pub fn spawn(self) -> SchedulerHandle {
        let reconnect = Arc::new(Notify::new());
        let shutdown = Arc::new(Notify::new());
        let task = tokio::spawn(run(
            self.session,
            self.retry,
            Arc::clone(&reconnect),
            Arc::clone(&shutdown),
        ));
        SchedulerHandle {
            reconnect,
            shutdown,
            task,
        }
    }
}

async fn run<R, B>(
    session: NotebookSession<R, B>,
    retry: RetryConfig,
    reconnect: Arc<Notify>,
    shutdown: Arc<Notify>,
) where
    R: RemoteClient + 'static,
    B: StateBackend + 'static,
{
    let inner = &session.inner;
    let mut failures: u32 = 0;
    tracing::debug!(notebook = %inner.notebook_id, "retry scheduler started");

    loop {
        let report = drain(inner).await;
        if report.failed.is_some() {
            failures = failures.saturating_add(1);
        } else {
            failures = 0;
        }

        let backoff = (report.failed.is_some() && retry.timer_enabled)
            .then(|| retry.delay_for_attempt(failures.max(1)));
        if let Some(delay) = backoff {
            tracing::debug!(
                remaining = report.remaining,
                failures,
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                "scheduling retry"
            );
        }

        tokio::select! {
            _ = inner.wake.notified() => {}
            _ = reconnect.notified() => {
                tracing::info!(notebook = %inner.notebook_id, "reconnected, retrying now");
                failures = 0;
            }
            _ = tokio::time::sleep(backoff.unwrap_or(IDLE_WAIT)), if backoff.is_some() => {}
            _ = shutdown.notified() => break,
        }
    }

    tracing::debug!(notebook = %inner.notebook_id, "retry scheduler stopped");
}

/// Handle to a running [`RetryScheduler`].
pub struct SchedulerHandle {
    reconnect: Arc<Notify>,
    shutdown: Arc<Notify>,
    task: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Reports that connectivity came back; a pass runs immediately and the
    /// backoff is reset.
    pub fn notify_reconnect(&self) {
        self.reconnect.notify_one();
    }

    /// Stops the scheduler and waits for the current pass to finish.
    pub async fn shutdown(self) {
        self.shutdown.notify_one();
        if let Err(e) = self.task.await {
            tracing::warn!(error = %e, "retry scheduler task ended abnormally");
        }
    }
}
