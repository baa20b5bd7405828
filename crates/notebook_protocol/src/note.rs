//! Notes and their synchronization state.

use crate::id::{NoteId, NotebookId};
use serde::{Deserialize, Serialize};

/// Synchronization state of a note as seen by the local session.
///
/// Transitions are owned by the sync engine; callers only read it to show a
/// pending or failed indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SyncState {
    /// A local change has not been confirmed by the remote service yet.
    Pending,
    /// The remote service holds the same content as the local view.
    Synced,
    /// The last delivery attempt failed; it will be retried.
    Failed,
}

impl SyncState {
    /// Returns true if the note still has unconfirmed local changes.
    pub fn is_unsynced(&self) -> bool {
        !matches!(self, SyncState::Synced)
    }
}

/// A note in the local view of a notebook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    /// Client-generated identifier.
    pub id: NoteId,
    /// Free-text content.
    pub content: String,
    /// Ordering key; notes render in ascending position.
    pub position: u64,
    /// Engine-owned synchronization state.
    pub sync_state: SyncState,
}

impl Note {
    /// Creates a new pending note.
    pub fn new(id: NoteId, content: impl Into<String>, position: u64) -> Self {
        Self {
            id,
            content: content.into(),
            position,
            sync_state: SyncState::Pending,
        }
    }

    /// Builds a synced local note from its remote representation.
    pub fn from_remote(remote: RemoteNote) -> Self {
        Self {
            id: remote.id,
            content: remote.content,
            position: remote.position,
            sync_state: SyncState::Synced,
        }
    }

    /// Returns the remote representation of this note.
    pub fn to_remote(&self, notebook_id: &NotebookId) -> RemoteNote {
        RemoteNote {
            notebook_id: notebook_id.clone(),
            id: self.id,
            content: self.content.clone(),
            position: self.position,
        }
    }

    /// Sort key giving the total render order: position, then id.
    pub fn order_key(&self) -> (u64, NoteId) {
        (self.position, self.id)
    }
}

/// A note as stored by the remote service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteNote {
    /// Notebook the note belongs to.
    pub notebook_id: NotebookId,
    /// Client-generated identifier.
    pub id: NoteId,
    /// Free-text content.
    pub content: String,
    /// Ordering key.
    pub position: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_conversion_marks_synced() {
        let notebook = NotebookId::parse("nb").unwrap();
        let note = Note::new(NoteId::new(), "hello", 3);
        assert_eq!(note.sync_state, SyncState::Pending);

        let back = Note::from_remote(note.to_remote(&notebook));
        assert_eq!(back.id, note.id);
        assert_eq!(back.content, "hello");
        assert_eq!(back.position, 3);
        assert_eq!(back.sync_state, SyncState::Synced);
    }

    #[test]
    fn remote_note_json_layout() {
        let notebook = NotebookId::parse("nb").unwrap();
        let note = Note::new(NoteId::new(), "x", 1).to_remote(&notebook);
        let json = serde_json::to_value(&note).unwrap();
        assert_eq!(json["notebookId"], "nb");
        assert_eq!(json["content"], "x");
        assert_eq!(json["position"], 1);
        assert_eq!(json["id"], note.id.to_string());
    }

    #[test]
    fn sync_state_flags() {
        assert!(SyncState::Pending.is_unsynced());
        assert!(SyncState::Failed.is_unsynced());
        assert!(!SyncState::Synced.is_unsynced());
    }
}
