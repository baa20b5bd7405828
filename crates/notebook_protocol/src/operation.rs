//! Pending sync operations.

use crate::id::NoteId;
use crate::note::Note;
use serde::{Deserialize, Serialize};

/// Type of a pending operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OperationKind {
    /// The note does not exist remotely yet.
    Create,
    /// The note exists remotely and its content changed.
    Update,
    /// The note was removed.
    Delete,
}

impl OperationKind {
    /// Combines a queued operation with a newer one for the same note.
    ///
    /// | queued \ newer | Create | Update | Delete |
    /// |----------------|--------|--------|--------|
    /// | Create         | Create | Create | Delete |
    /// | Update         | Create | Update | Delete |
    /// | Delete         | Delete | Delete | Delete |
    pub fn merge(queued: OperationKind, newer: OperationKind) -> OperationKind {
        use OperationKind::{Create, Delete, Update};
        match (queued, newer) {
            (Delete, _) | (_, Delete) => Delete,
            (Create, _) | (_, Create) => Create,
            (Update, Update) => Update,
        }
    }
}

/// Note data carried by a `Create` or `Update` operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotePayload {
    /// Content to write.
    pub content: String,
    /// Ordering key to write.
    pub position: u64,
}

impl From<&Note> for NotePayload {
    fn from(note: &Note) -> Self {
        Self {
            content: note.content.clone(),
            position: note.position,
        }
    }
}

/// A local mutation awaiting confirmation from the remote service.
///
/// # Invariants
///
/// - At most one pending operation exists per note
/// - `payload` is `Some` for `Create`/`Update` and `None` for `Delete`
/// - `revision` changes every time the entry is rewritten
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingOperation {
    /// Note the operation applies to.
    pub note_id: NoteId,
    /// Operation type.
    pub kind: OperationKind,
    /// Note data for writes.
    pub payload: Option<NotePayload>,
    /// Unix time in milliseconds when the note was first queued.
    pub enqueued_at: u64,
    /// Queue-assigned revision of this entry.
    pub revision: u64,
}

impl PendingOperation {
    /// Creates a `Create` operation for a note.
    pub fn create(note: &Note) -> Self {
        Self::write(OperationKind::Create, note)
    }

    /// Creates an `Update` operation for a note.
    pub fn update(note: &Note) -> Self {
        Self::write(OperationKind::Update, note)
    }

    /// Creates a `Delete` operation for a note.
    pub fn delete(note_id: NoteId) -> Self {
        Self {
            note_id,
            kind: OperationKind::Delete,
            payload: None,
            enqueued_at: 0,
            revision: 0,
        }
    }

    fn write(kind: OperationKind, note: &Note) -> Self {
        Self {
            note_id: note.id,
            kind,
            payload: Some(NotePayload::from(note)),
            enqueued_at: 0,
            revision: 0,
        }
    }

    /// Sets the enqueue timestamp.
    pub fn with_enqueued_at(mut self, millis: u64) -> Self {
        self.enqueued_at = millis;
        self
    }

    /// Folds a newer operation for the same note into this one.
    ///
    /// The kind follows [`OperationKind::merge`], the payload is the newer
    /// one, and the original `enqueued_at` is kept so the entry holds its
    /// place in the queue.
    pub fn absorb(&mut self, newer: PendingOperation) {
        debug_assert_eq!(self.note_id, newer.note_id);
        self.kind = OperationKind::merge(self.kind, newer.kind);
        self.payload = match self.kind {
            OperationKind::Delete => None,
            _ => newer.payload.or_else(|| self.payload.take()),
        };
    }

    /// Returns true if this operation writes note data.
    pub fn is_write(&self) -> bool {
        !matches!(self.kind, OperationKind::Delete)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use OperationKind::{Create, Delete, Update};

    #[test]
    fn merge_table() {
        assert_eq!(OperationKind::merge(Create, Create), Create);
        assert_eq!(OperationKind::merge(Create, Update), Create);
        assert_eq!(OperationKind::merge(Create, Delete), Delete);
        assert_eq!(OperationKind::merge(Update, Create), Create);
        assert_eq!(OperationKind::merge(Update, Update), Update);
        assert_eq!(OperationKind::merge(Update, Delete), Delete);
        assert_eq!(OperationKind::merge(Delete, Create), Delete);
        assert_eq!(OperationKind::merge(Delete, Update), Delete);
        assert_eq!(OperationKind::merge(Delete, Delete), Delete);
    }

    #[test]
    fn absorb_keeps_latest_payload() {
        let mut note = Note::new(NoteId::new(), "one", 1);
        let mut op = PendingOperation::create(&note).with_enqueued_at(10);

        note.content = "one more".into();
        op.absorb(PendingOperation::update(&note).with_enqueued_at(20));

        assert_eq!(op.kind, Create);
        assert_eq!(op.payload.as_ref().unwrap().content, "one more");
        assert_eq!(op.enqueued_at, 10);
    }

    #[test]
    fn absorb_delete_drops_payload() {
        let note = Note::new(NoteId::new(), "one", 1);
        let mut op = PendingOperation::update(&note);
        op.absorb(PendingOperation::delete(note.id));

        assert_eq!(op.kind, Delete);
        assert!(op.payload.is_none());
        assert!(!op.is_write());
    }

    #[test]
    fn delete_is_terminal() {
        let note = Note::new(NoteId::new(), "one", 1);
        let mut op = PendingOperation::delete(note.id);
        op.absorb(PendingOperation::update(&note));

        assert_eq!(op.kind, Delete);
        assert!(op.payload.is_none());
    }
}
