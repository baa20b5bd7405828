//! Notebook session: the engine instance behind one open notebook.

use crate::config::SyncConfig;
use crate::error::{SyncError, SyncResult};
use crate::persist::PersistedState;
use crate::queue::SyncQueue;
use crate::reconcile::{merge, validate_snapshot, RemoteSnapshot};
use crate::remote::RemoteClient;
use crate::scheduler::{drain, DrainReport};
use crate::store::NoteStore;
use notebook_protocol::{
    Note, NoteId, NotebookId, OperationKind, PendingOperation, RemoteNote, SyncState,
};
use notebook_storage::StateBackend;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::Notify;

/// Something the UI may want to react to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// No notebook id was present in the location and a new one was minted.
    ///
    /// The host should reflect it in its address bar.
    NotebookMinted(NotebookId),
    /// A note's sync state changed outside a direct user mutation.
    NoteStateChanged {
        /// The note.
        note_id: NoteId,
        /// Its new state.
        state: SyncState,
    },
    /// A reconciliation finished.
    Reconciled {
        /// The reconciled view, in render order.
        notes: Vec<Note>,
        /// Whether the remote list took part in the merge.
        remote_available: bool,
    },
}

/// Callback receiving session events.
pub type EventHandler = Arc<dyn Fn(&SessionEvent) + Send + Sync>;

/// Options for [`NotebookSession::open`].
#[derive(Clone)]
pub struct SessionOptions {
    /// Address path the notebook id is read from.
    pub location: String,
    /// Seed used to mint a notebook id when the location has none.
    pub seed: u64,
    /// Engine configuration.
    pub config: SyncConfig,
    on_event: Option<EventHandler>,
}

impl SessionOptions {
    /// Creates options for `location` with a random minting seed.
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            seed: rand::random(),
            config: SyncConfig::default(),
            on_event: None,
        }
    }

    /// Sets the minting seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Sets the engine configuration.
    pub fn with_config(mut self, config: SyncConfig) -> Self {
        self.config = config;
        self
    }

    /// Registers an event callback.
    ///
    /// The callback runs on whichever task produced the event and must not
    /// block.
    pub fn on_event<F>(mut self, handler: F) -> Self
    where
        F: Fn(&SessionEvent) + Send + Sync + 'static,
    {
        self.on_event = Some(Arc::new(handler));
        self
    }
}

impl fmt::Debug for SessionOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionOptions")
            .field("location", &self.location)
            .field("seed", &self.seed)
            .field("config", &self.config)
            .field("on_event", &self.on_event.is_some())
            .finish()
    }
}

/// The note store and the queue, always mutated together.
#[derive(Debug, Default)]
pub(crate) struct SessionState {
    pub(crate) store: NoteStore,
    pub(crate) queue: SyncQueue,
}

pub(crate) struct SessionInner<R, B> {
    pub(crate) notebook_id: NotebookId,
    pub(crate) config: SyncConfig,
    pub(crate) remote: R,
    backend: B,
    pub(crate) state: Mutex<SessionState>,
    /// Serializes drains and reconciliations.
    pub(crate) drain_lock: tokio::sync::Mutex<()>,
    /// Signalled after every enqueue.
    pub(crate) wake: Notify,
    on_event: Option<EventHandler>,
}

/// An open notebook.
///
/// Owns the local view, the queue of unconfirmed mutations, the persisted
/// copy of both, and the remote client. Cloning yields another handle to
/// the same session.
///
/// Mutations apply locally and return immediately; delivery happens in
/// [`flush`](Self::flush) or in a spawned [`crate::RetryScheduler`].
pub struct NotebookSession<R: RemoteClient, B: StateBackend> {
    pub(crate) inner: Arc<SessionInner<R, B>>,
}

impl<R: RemoteClient, B: StateBackend> Clone for NotebookSession<R, B> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<R: RemoteClient, B: StateBackend> NotebookSession<R, B> {
    /// Opens a notebook session.
    ///
    /// Resolves the notebook id from the location (minting one when absent)
    /// and restores the persisted view and queue. The last known notes are
    /// available from [`list_notes`](Self::list_notes) before any
    /// reconciliation runs.
    ///
    /// # Errors
    ///
    /// Fails if the persisted state cannot be read or decoded, or with
    /// [`SyncError::NotebookMismatch`] if the backend holds the state of
    /// another notebook. That state is left untouched.
    pub fn open(options: SessionOptions, remote: R, backend: B) -> SyncResult<Self> {
        let SessionOptions {
            location,
            seed,
            config,
            on_event,
        } = options;

        let (notebook_id, minted) = match NotebookId::from_location(&location) {
            Some(id) => (id, false),
            None => (NotebookId::mint(seed), true),
        };

        let state = match backend.load()? {
            Some(bytes) => {
                let persisted = PersistedState::decode(&bytes)?;
                if persisted.notebook_id != notebook_id {
                    tracing::warn!(
                        requested = %notebook_id,
                        stored = %persisted.notebook_id,
                        pending = persisted.pending_operations.len(),
                        "backend holds another notebook"
                    );
                    return Err(SyncError::NotebookMismatch {
                        stored: persisted.notebook_id,
                        requested: notebook_id,
                    });
                }
                SessionState {
                    store: NoteStore::from_notes(persisted.notes),
                    queue: SyncQueue::from_entries(persisted.pending_operations),
                }
            }
            None => SessionState::default(),
        };

        tracing::info!(
            notebook = %notebook_id,
            minted,
            notes = state.store.len(),
            pending = state.queue.len(),
            "opened notebook"
        );

        let session = Self {
            inner: Arc::new(SessionInner {
                notebook_id: notebook_id.clone(),
                config,
                remote,
                backend,
                state: Mutex::new(state),
                drain_lock: tokio::sync::Mutex::new(()),
                wake: Notify::new(),
                on_event,
            }),
        };

        if minted {
            session.inner.persist(&session.inner.state.lock())?;
            session.inner.emit(SessionEvent::NotebookMinted(notebook_id));
        }

        Ok(session)
    }

    /// Returns the notebook id.
    pub fn notebook_id(&self) -> &NotebookId {
        &self.inner.notebook_id
    }

    /// Returns the text to put on the clipboard when sharing the notebook.
    pub fn share_text(&self) -> String {
        self.inner.notebook_id.to_string()
    }

    /// Returns the session configuration.
    pub fn config(&self) -> &SyncConfig {
        &self.inner.config
    }

    /// Returns the notes in render order.
    pub fn list_notes(&self) -> Vec<Note> {
        self.inner.state.lock().store.list_notes()
    }

    /// Returns the number of unconfirmed operations.
    pub fn pending_count(&self) -> usize {
        self.inner.state.lock().queue.len()
    }

    /// Returns the unconfirmed operations in queue order.
    pub fn pending_operations(&self) -> Vec<PendingOperation> {
        self.inner.state.lock().queue.peek_all()
    }

    /// Adds a note at the end of the notebook.
    ///
    /// # Errors
    ///
    /// Fails only if the local state cannot be persisted; the note is in
    /// the view and queued either way.
    pub fn add_note(&self, content: impl Into<String>) -> SyncResult<Note> {
        let (note, persisted) = {
            let mut state = self.inner.state.lock();
            let note = state.store.add_note(content);
            state
                .queue
                .enqueue(PendingOperation::create(&note).with_enqueued_at(now_millis()));
            let persisted = self.inner.persist(&state);
            (note, persisted)
        };
        tracing::debug!(note_id = %note.id, "added note");
        self.inner.wake.notify_one();
        persisted.map(|()| note)
    }

    /// Replaces the content of a note.
    ///
    /// Returns `Ok(false)` if the note is not in the view.
    ///
    /// # Errors
    ///
    /// Fails only if the local state cannot be persisted.
    pub fn edit_note(&self, id: &NoteId, content: impl Into<String>) -> SyncResult<bool> {
        let persisted = {
            let mut state = self.inner.state.lock();
            let Some(note) = state.store.edit_note(id, content) else {
                tracing::debug!(note_id = %id, "edit of unknown note ignored");
                return Ok(false);
            };
            state
                .queue
                .enqueue(PendingOperation::update(&note).with_enqueued_at(now_millis()));
            self.inner.persist(&state)
        };
        tracing::debug!(note_id = %id, "edited note");
        self.inner.wake.notify_one();
        persisted.map(|()| true)
    }

    /// Removes a note.
    ///
    /// Returns `Ok(false)` if the note is not in the view.
    ///
    /// # Errors
    ///
    /// Fails only if the local state cannot be persisted.
    pub fn delete_note(&self, id: &NoteId) -> SyncResult<bool> {
        let persisted = {
            let mut state = self.inner.state.lock();
            if state.store.delete_note(id).is_none() {
                tracing::debug!(note_id = %id, "delete of unknown note ignored");
                return Ok(false);
            }
            state
                .queue
                .enqueue(PendingOperation::delete(*id).with_enqueued_at(now_millis()));
            self.inner.persist(&state)
        };
        tracing::debug!(note_id = %id, "deleted note");
        self.inner.wake.notify_one();
        persisted.map(|()| true)
    }

    /// Rebuilds the view from the remote list and the queue.
    ///
    /// Waits for an in-flight drain to finish first. When the remote is
    /// unreachable or answers with a malformed list, the last local view
    /// is used as the base instead; that is not an error.
    ///
    /// # Errors
    ///
    /// Fails only if the reconciled state cannot be persisted.
    pub async fn reconcile(&self) -> SyncResult<Vec<Note>> {
        let notebook_id = &self.inner.notebook_id;
        let drain_guard = self.inner.drain_lock.lock().await;

        let snapshot = match self.inner.remote.fetch_all(notebook_id).await {
            Ok(remote) => match validate_snapshot(notebook_id, remote) {
                Ok(remote) => RemoteSnapshot::Fetched(remote),
                Err(e) => {
                    tracing::warn!(error = %e, "discarding remote snapshot");
                    RemoteSnapshot::Unavailable
                }
            },
            Err(e) => {
                tracing::warn!(error = %e, "remote unavailable, using local view");
                RemoteSnapshot::Unavailable
            }
        };
        let remote_available = snapshot.is_available();

        let (notes, pending, persisted) = {
            let mut state = self.inner.state.lock();
            let local = state.store.list_notes();
            let merged = merge(snapshot, &local, &state.queue.peek_all());
            state.store.apply_remote_snapshot(merged);
            let persisted = self.inner.persist(&state);
            (state.store.list_notes(), state.queue.len(), persisted)
        };
        drop(drain_guard);

        tracing::info!(
            notebook = %notebook_id,
            notes = notes.len(),
            pending,
            remote_available,
            "reconciled"
        );
        persisted?;

        self.inner.emit(SessionEvent::Reconciled {
            notes: notes.clone(),
            remote_available,
        });
        if pending > 0 {
            self.inner.wake.notify_one();
        }
        Ok(notes)
    }

    /// Sends queued operations in order until the queue is empty or one
    /// fails.
    pub async fn flush(&self) -> DrainReport {
        drain(&self.inner).await
    }
}

impl<R: RemoteClient, B: StateBackend> SessionInner<R, B> {
    /// Writes the current view and queue to the backend.
    pub(crate) fn persist(&self, state: &SessionState) -> SyncResult<()> {
        let persisted = PersistedState {
            notebook_id: self.notebook_id.clone(),
            notes: state.store.list_notes(),
            pending_operations: state.queue.peek_all(),
        };
        self.backend.store(&persisted.encode()?)?;
        Ok(())
    }

    pub(crate) fn emit(&self, event: SessionEvent) {
        if let Some(handler) = &self.on_event {
            handler(&event);
        }
    }

    /// Returns the current queue entry of a note.
    pub(crate) fn current_entry(&self, note_id: &NoteId) -> Option<PendingOperation> {
        self.state.lock().queue.get(note_id).cloned()
    }

    /// Performs the remote call matching a queued operation.
    pub(crate) async fn send(&self, op: &PendingOperation) -> SyncResult<()> {
        match (op.kind, &op.payload) {
            (OperationKind::Delete, _) => self.remote.delete(&self.notebook_id, &op.note_id).await,
            (kind, Some(payload)) => {
                let note = RemoteNote {
                    notebook_id: self.notebook_id.clone(),
                    id: op.note_id,
                    content: payload.content.clone(),
                    position: payload.position,
                };
                if kind == OperationKind::Create {
                    self.remote.create(&note).await
                } else {
                    self.remote.update(&note).await
                }
            }
            (_, None) => Err(SyncError::Codec(format!(
                "queued write for {} has no payload",
                op.note_id
            ))),
        }
    }

    /// Records a successful send.
    ///
    /// The entry is removed only if it was not rewritten while the call was
    /// in flight; otherwise the newer entry stays queued and the note stays
    /// `Pending`.
    pub(crate) fn confirm(&self, op: &PendingOperation) {
        let changed = {
            let mut state = self.state.lock();
            if !state.queue.remove_if_current(&op.note_id, op.revision) {
                tracing::debug!(note_id = %op.note_id, "confirmation superseded by newer entry");
                return;
            }
            let changed = state.store.set_sync_state(&op.note_id, SyncState::Synced);
            if let Err(e) = self.persist(&state) {
                tracing::warn!(error = %e, "failed to persist confirmation");
            }
            changed
        };
        if changed {
            self.emit(SessionEvent::NoteStateChanged {
                note_id: op.note_id,
                state: SyncState::Synced,
            });
        }
    }

    /// Records a failed send. The entry stays queued.
    pub(crate) fn mark_failed(&self, op: &PendingOperation) {
        let changed = {
            let mut state = self.state.lock();
            let current = state
                .queue
                .get(&op.note_id)
                .is_some_and(|e| e.revision == op.revision);
            if !current {
                return;
            }
            let changed = state.store.set_sync_state(&op.note_id, SyncState::Failed);
            if changed {
                if let Err(e) = self.persist(&state) {
                    tracing::warn!(error = %e, "failed to persist failure state");
                }
            }
            changed
        };
        if changed {
            self.emit(SessionEvent::NoteStateChanged {
                note_id: op.note_id,
                state: SyncState::Failed,
            });
        }
    }
}

/// Current Unix time in milliseconds.
fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}
