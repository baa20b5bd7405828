//! Merging the remote note list with unconfirmed local work.

use crate::error::{SyncError, SyncResult};
use notebook_protocol::{Note, NoteId, NotebookId, OperationKind, PendingOperation, RemoteNote, SyncState};
use std::collections::{HashMap, HashSet};

/// Outcome of fetching the remote note list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteSnapshot {
    /// The remote answered with a well-formed list.
    Fetched(Vec<RemoteNote>),
    /// The remote could not be reached or answered with a malformed list.
    Unavailable,
}

impl RemoteSnapshot {
    /// Returns true if the remote list was obtained.
    pub fn is_available(&self) -> bool {
        matches!(self, RemoteSnapshot::Fetched(_))
    }
}

/// Checks a fetched list before it is trusted.
///
/// A list containing the same note twice, or a note from another notebook,
/// is rejected as [`SyncError::MalformedSnapshot`].
pub fn validate_snapshot(
    notebook_id: &NotebookId,
    notes: Vec<RemoteNote>,
) -> SyncResult<Vec<RemoteNote>> {
    let mut seen = HashSet::with_capacity(notes.len());
    for note in &notes {
        if note.notebook_id != *notebook_id {
            return Err(SyncError::MalformedSnapshot(format!(
                "note {} belongs to notebook {}",
                note.id, note.notebook_id
            )));
        }
        if !seen.insert(note.id) {
            return Err(SyncError::MalformedSnapshot(format!(
                "duplicate note {}",
                note.id
            )));
        }
    }
    Ok(notes)
}

/// Builds the reconciled view.
///
/// The base is the remote list when available, otherwise the last local
/// view. Queued writes are then layered on top (local wins) and queued
/// deletes remove their note. The result is in render order.
pub fn merge(snapshot: RemoteSnapshot, local: &[Note], pending: &[PendingOperation]) -> Vec<Note> {
    let local_states: HashMap<NoteId, SyncState> =
        local.iter().map(|n| (n.id, n.sync_state)).collect();

    let mut merged: HashMap<NoteId, Note> = match snapshot {
        RemoteSnapshot::Fetched(remote) => remote
            .into_iter()
            .map(|r| (r.id, Note::from_remote(r)))
            .collect(),
        RemoteSnapshot::Unavailable => local.iter().map(|n| (n.id, n.clone())).collect(),
    };

    for op in pending {
        match (op.kind, &op.payload) {
            (OperationKind::Delete, _) => {
                merged.remove(&op.note_id);
            }
            (_, Some(payload)) => {
                let state = match local_states.get(&op.note_id) {
                    Some(SyncState::Failed) => SyncState::Failed,
                    _ => SyncState::Pending,
                };
                merged.insert(
                    op.note_id,
                    Note {
                        id: op.note_id,
                        content: payload.content.clone(),
                        position: payload.position,
                        sync_state: state,
                    },
                );
            }
            (_, None) => {
                tracing::warn!(note_id = %op.note_id, "queued write without payload");
            }
        }
    }

    let mut notes: Vec<Note> = merged.into_values().collect();
    notes.sort_by_key(Note::order_key);
    notes
}
