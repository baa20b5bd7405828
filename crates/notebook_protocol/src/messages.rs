//! REST messages exchanged with the notes service.
//!
//! Endpoints (JSON bodies):
//!
//! | method   | path                          | body         | response            |
//! |----------|-------------------------------|--------------|---------------------|
//! | `GET`    | `/notes?notebook=ID`          |              | `ListNotesResponse` |
//! | `POST`   | `/notes`                      | `RemoteNote` |                     |
//! | `PATCH`  | `/notes/{noteId}`             | `RemoteNote` |                     |
//! | `DELETE` | `/notes/{noteId}?notebook=ID` |              |                     |

use crate::error::ProtocolResult;
use crate::note::RemoteNote;
use serde::{Deserialize, Serialize};

/// Endpoint paths of the notes service.
pub mod paths {
    use crate::id::{NoteId, NotebookId};

    /// Collection path for notes.
    pub const NOTES: &str = "/notes";

    /// Query parameter naming the notebook.
    pub const NOTEBOOK_PARAM: &str = "notebook";

    /// Path listing the notes of a notebook.
    pub fn list(notebook_id: &NotebookId) -> String {
        format!("{NOTES}?{NOTEBOOK_PARAM}={notebook_id}")
    }

    /// Path of a single note.
    pub fn note(note_id: &NoteId) -> String {
        format!("{NOTES}/{note_id}")
    }

    /// Path deleting a single note of a notebook.
    pub fn delete(notebook_id: &NotebookId, note_id: &NoteId) -> String {
        format!("{NOTES}/{note_id}?{NOTEBOOK_PARAM}={notebook_id}")
    }
}

/// Response body of the list endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListNotesResponse {
    /// Notes of the notebook, in no particular order.
    pub notes: Vec<RemoteNote>,
}

impl ListNotesResponse {
    /// Creates a list response.
    pub fn new(notes: Vec<RemoteNote>) -> Self {
        Self { notes }
    }

    /// Encodes to JSON.
    pub fn encode(&self) -> ProtocolResult<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Decodes from JSON.
    pub fn decode(bytes: &[u8]) -> ProtocolResult<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

impl RemoteNote {
    /// Encodes to JSON.
    pub fn encode(&self) -> ProtocolResult<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Decodes from JSON.
    pub fn decode(bytes: &[u8]) -> ProtocolResult<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }
}
