//! Remote notes service abstraction.

use crate::error::{SyncError, SyncResult};
use notebook_protocol::{NoteId, NotebookId, RemoteNote};
use parking_lot::RwLock;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A client of the remote notes service.
///
/// Each call performs exactly one attempt and reports success or failure;
/// retries belong to the [`crate::RetryScheduler`]. Timeouts are the
/// implementation's responsibility and surface as ordinary errors.
///
/// Implementations must treat deleting an unknown note as a success,
/// creating a note whose id already exists as a replace, and updating an
/// unknown note as a create, so that replaying an operation is harmless and
/// an edit of a note another client removed is not refused forever.
pub trait RemoteClient: Send + Sync {
    /// Fetches every note of a notebook.
    fn fetch_all(
        &self,
        notebook_id: &NotebookId,
    ) -> impl Future<Output = SyncResult<Vec<RemoteNote>>> + Send;

    /// Creates a note.
    fn create(&self, note: &RemoteNote) -> impl Future<Output = SyncResult<()>> + Send;

    /// Replaces the content and position of a note, storing it if absent.
    fn update(&self, note: &RemoteNote) -> impl Future<Output = SyncResult<()>> + Send;

    /// Deletes a note.
    fn delete(
        &self,
        notebook_id: &NotebookId,
        note_id: &NoteId,
    ) -> impl Future<Output = SyncResult<()>> + Send;
}

/// Number of calls received by a [`MemoryRemote`], per operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    /// `fetch_all` calls.
    pub fetch: u64,
    /// `create` calls.
    pub create: u64,
    /// `update` calls.
    pub update: u64,
    /// `delete` calls.
    pub delete: u64,
}

impl CallCounts {
    /// Returns the number of write calls (create, update, delete).
    pub fn writes(&self) -> u64 {
        self.create + self.update + self.delete
    }
}

#[derive(Debug, Default)]
struct MemoryRemoteInner {
    notes: RwLock<Vec<RemoteNote>>,
    offline: AtomicBool,
    content_limit: RwLock<Option<usize>>,
    calls: RwLock<CallCounts>,
}

/// An in-process notes service for testing.
///
/// Clones share the same notes, so a test can keep a handle while a
/// session owns another. Calls made while disconnected fail with a
/// retryable network error but are still counted. Writes whose content
/// exceeds the limit set with [`set_content_limit`](Self::set_content_limit)
/// are rejected with status 413.
#[derive(Debug, Clone, Default)]
pub struct MemoryRemote {
    inner: Arc<MemoryRemoteInner>,
}

impl MemoryRemote {
    /// Creates a new, connected, empty remote.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the connected state.
    pub fn set_connected(&self, connected: bool) {
        self.inner.offline.store(!connected, Ordering::SeqCst);
    }

    /// Returns true if calls currently reach the remote.
    pub fn is_connected(&self) -> bool {
        !self.inner.offline.load(Ordering::SeqCst)
    }

    /// Rejects writes whose content is longer than `limit` bytes.
    pub fn set_content_limit(&self, limit: Option<usize>) {
        *self.inner.content_limit.write() = limit;
    }

    /// Returns the notes of a notebook, ordered by position.
    pub fn notes(&self, notebook_id: &NotebookId) -> Vec<RemoteNote> {
        let mut notes: Vec<RemoteNote> = self
            .inner
            .notes
            .read()
            .iter()
            .filter(|n| n.notebook_id == *notebook_id)
            .cloned()
            .collect();
        notes.sort_by_key(|n| (n.position, n.id));
        notes
    }

    /// Inserts or replaces a note directly, as another client would.
    pub fn insert(&self, note: RemoteNote) {
        let mut notes = self.inner.notes.write();
        notes.retain(|n| n.id != note.id);
        notes.push(note);
    }

    /// Removes a note directly, as another client would.
    pub fn remove(&self, note_id: &NoteId) {
        self.inner.notes.write().retain(|n| n.id != *note_id);
    }

    /// Returns the calls received so far.
    pub fn calls(&self) -> CallCounts {
        *self.inner.calls.read()
    }

    fn check_connected(&self) -> SyncResult<()> {
        if self.is_connected() {
            Ok(())
        } else {
            Err(SyncError::network("connection refused"))
        }
    }

    fn check_size(&self, note: &RemoteNote) -> SyncResult<()> {
        match *self.inner.content_limit.read() {
            Some(limit) if note.content.len() > limit => Err(SyncError::rejected(
                413,
                format!("content of {} bytes exceeds limit of {limit}", note.content.len()),
            )),
            _ => Ok(()),
        }
    }
}

impl RemoteClient for MemoryRemote {
    async fn fetch_all(&self, notebook_id: &NotebookId) -> SyncResult<Vec<RemoteNote>> {
        self.inner.calls.write().fetch += 1;
        self.check_connected()?;
        Ok(self.notes(notebook_id))
    }

    async fn create(&self, note: &RemoteNote) -> SyncResult<()> {
        self.inner.calls.write().create += 1;
        self.check_connected()?;
        self.check_size(note)?;
        self.insert(note.clone());
        Ok(())
    }

    async fn update(&self, note: &RemoteNote) -> SyncResult<()> {
        self.inner.calls.write().update += 1;
        self.check_connected()?;
        self.check_size(note)?;
        self.insert(note.clone());
        Ok(())
    }

    async fn delete(&self, notebook_id: &NotebookId, note_id: &NoteId) -> SyncResult<()> {
        self.inner.calls.write().delete += 1;
        self.check_connected()?;
        self.inner
            .notes
            .write()
            .retain(|n| !(n.id == *note_id && n.notebook_id == *notebook_id));
        Ok(())
    }
}
