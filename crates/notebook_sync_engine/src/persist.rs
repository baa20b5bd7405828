//! Persisted layout of a notebook session.

use crate::error::{SyncError, SyncResult};
use notebook_protocol::{Note, NotebookId, PendingOperation};
use serde::{Deserialize, Serialize};

/// Everything a reload needs to recover pre-confirmation state.
///
/// Written after every mutation of the note store or the queue and read
/// back when a session opens, before reconciliation runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedState {
    /// Notebook this state belongs to.
    pub notebook_id: NotebookId,
    /// Last known local view, in render order.
    pub notes: Vec<Note>,
    /// Unconfirmed operations, in queue order.
    pub pending_operations: Vec<PendingOperation>,
}

impl PersistedState {
    /// Encodes to CBOR.
    pub fn encode(&self) -> SyncResult<Vec<u8>> {
        let mut bytes = Vec::new();
        ciborium::into_writer(self, &mut bytes)
            .map_err(|e| SyncError::Codec(format!("failed to encode state: {e}")))?;
        Ok(bytes)
    }

    /// Decodes from CBOR.
    pub fn decode(bytes: &[u8]) -> SyncResult<Self> {
        ciborium::from_reader(bytes)
            .map_err(|e| SyncError::Codec(format!("failed to decode state: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notebook_protocol::{NoteId, OperationKind};

    #[test]
    fn state_survives_encoding() {
        let notebook = NotebookId::parse("abc-def").unwrap();
        let note = Note::new(NoteId::new(), "one", 0);
        let mut op = PendingOperation::create(&note).with_enqueued_at(1_700_000_000_000);
        op.revision = 4;

        let state = PersistedState {
            notebook_id: notebook,
            notes: vec![note],
            pending_operations: vec![op],
        };

        let decoded = PersistedState::decode(&state.encode().unwrap()).unwrap();
        assert_eq!(decoded, state);
        assert_eq!(decoded.pending_operations[0].kind, OperationKind::Create);
    }

    #[test]
    fn garbage_is_a_codec_error() {
        let result = PersistedState::decode(b"\xff\x00garbage");
        assert!(matches!(result, Err(SyncError::Codec(_))));
    }
}
