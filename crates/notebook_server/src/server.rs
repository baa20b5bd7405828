//! The notes service.

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use notebook_protocol::{paths, ListNotesResponse, NoteId, NotebookId, RemoteNote};
use parking_lot::RwLock;
use std::collections::HashMap;

/// Result of a create or update request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The note did not exist and was stored.
    Created,
    /// A note with the same id existed and was replaced.
    Replaced,
}

impl WriteOutcome {
    /// Returns the HTTP status code for this outcome.
    pub fn status_code(&self) -> u16 {
        match self {
            WriteOutcome::Created => 201,
            WriteOutcome::Replaced => 200,
        }
    }
}

/// In-memory notes service.
///
/// Notes are grouped by notebook. Creates and updates are both upserts:
/// replaying a create after a lost response leaves the content the client
/// last sent, and an update of a note another client deleted brings it back.
///
/// # Example
///
/// ```
/// use notebook_server::{NoteServer, ServerConfig};
///
/// let server = NoteServer::new(ServerConfig::default());
/// let (status, _body) = server.handle_request("GET", "/notes?notebook=abc", b"");
/// assert_eq!(status, 200);
/// ```
#[derive(Debug, Default)]
pub struct NoteServer {
    config: ServerConfig,
    notebooks: RwLock<HashMap<NotebookId, Vec<RemoteNote>>>,
}

impl NoteServer {
    /// Creates an empty notes service.
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config,
            notebooks: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the server configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Lists the notes of a notebook, ordered by position.
    ///
    /// Unknown notebooks are empty.
    pub fn list(&self, notebook_id: &NotebookId) -> Vec<RemoteNote> {
        let mut notes = self
            .notebooks
            .read()
            .get(notebook_id)
            .cloned()
            .unwrap_or_default();
        notes.sort_by_key(|n| (n.position, n.id));
        notes
    }

    /// Stores a note, replacing an existing note with the same id.
    pub fn create(&self, note: RemoteNote) -> WriteOutcome {
        let outcome = self.upsert(note);
        tracing::debug!(?outcome, "create");
        outcome
    }

    /// Replaces the content and position of a note, storing it if absent.
    pub fn update(&self, note: RemoteNote) -> WriteOutcome {
        let outcome = self.upsert(note);
        tracing::debug!(?outcome, "update");
        outcome
    }

    fn upsert(&self, note: RemoteNote) -> WriteOutcome {
        let mut notebooks = self.notebooks.write();
        let notes = notebooks.entry(note.notebook_id.clone()).or_default();
        match notes.iter_mut().find(|n| n.id == note.id) {
            Some(existing) => {
                *existing = note;
                WriteOutcome::Replaced
            }
            None => {
                notes.push(note);
                WriteOutcome::Created
            }
        }
    }

    /// Deletes a note.
    pub fn delete(&self, notebook_id: &NotebookId, note_id: &NoteId) -> ServerResult<()> {
        let mut notebooks = self.notebooks.write();
        let notes = notebooks
            .get_mut(notebook_id)
            .ok_or_else(|| ServerError::NotFound(note_id.to_string()))?;
        let index = notes
            .iter()
            .position(|n| n.id == *note_id)
            .ok_or_else(|| ServerError::NotFound(note_id.to_string()))?;
        notes.remove(index);
        Ok(())
    }

    /// Returns the total number of stored notes.
    pub fn note_count(&self) -> usize {
        self.notebooks.read().values().map(Vec::len).sum()
    }

    /// Handles a raw request and returns the status code and body.
    ///
    /// `path` includes the query string. Error bodies are plain text.
    pub fn handle_request(&self, method: &str, path: &str, body: &[u8]) -> (u16, Vec<u8>) {
        match self.route(method, path, body) {
            Ok((status, body)) => (status, body),
            Err(e) => {
                if e.is_server_error() {
                    tracing::error!(%method, %path, error = %e, "request failed");
                } else {
                    tracing::debug!(%method, %path, error = %e, "request refused");
                }
                (e.status_code(), e.to_string().into_bytes())
            }
        }
    }

    fn route(&self, method: &str, path: &str, body: &[u8]) -> ServerResult<(u16, Vec<u8>)> {
        if body.len() > self.config.max_body_bytes {
            return Err(ServerError::PayloadTooLarge {
                size: body.len(),
                limit: self.config.max_body_bytes,
            });
        }

        let (route, query) = path.split_once('?').unwrap_or((path, ""));
        let note_segment = route
            .strip_prefix(paths::NOTES)
            .and_then(|rest| rest.strip_prefix('/'))
            .filter(|s| !s.is_empty() && !s.contains('/'));

        match (method, route, note_segment) {
            ("GET", paths::NOTES, _) => {
                let notebook_id = notebook_param(query)?;
                let body = ListNotesResponse::new(self.list(&notebook_id)).encode()?;
                Ok((200, body))
            }
            ("POST", paths::NOTES, _) => {
                let note = RemoteNote::decode(body)?;
                Ok((self.create(note).status_code(), Vec::new()))
            }
            ("PATCH", _, Some(segment)) => {
                let note_id = parse_note_id(segment)?;
                let note = RemoteNote::decode(body)?;
                if note.id != note_id {
                    return Err(ServerError::InvalidRequest(format!(
                        "path id {note_id} does not match body id {}",
                        note.id
                    )));
                }
                Ok((self.update(note).status_code(), Vec::new()))
            }
            ("DELETE", _, Some(segment)) => {
                let note_id = parse_note_id(segment)?;
                let notebook_id = notebook_param(query)?;
                self.delete(&notebook_id, &note_id)?;
                Ok((204, Vec::new()))
            }
            _ => Err(ServerError::NoRoute {
                method: method.to_string(),
                path: route.to_string(),
            }),
        }
    }
}

/// Reads the notebook id from a query string.
pub(crate) fn notebook_param(query: &str) -> ServerResult<NotebookId> {
    let value = query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| *key == paths::NOTEBOOK_PARAM)
        .map(|(_, value)| value)
        .ok_or_else(|| ServerError::InvalidRequest("missing notebook parameter".into()))?;
    NotebookId::parse(value).map_err(|e| ServerError::InvalidRequest(e.to_string()))
}

pub(crate) fn parse_note_id(segment: &str) -> ServerResult<NoteId> {
    segment
        .parse()
        .map_err(|e: notebook_protocol::ProtocolError| ServerError::InvalidRequest(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use notebook_protocol::Note;

    fn notebook() -> NotebookId {
        NotebookId::parse("nb").unwrap()
    }

    fn note(content: &str, position: u64) -> RemoteNote {
        Note::new(NoteId::new(), content, position).to_remote(&notebook())
    }

    fn server() -> NoteServer {
        NoteServer::new(ServerConfig::default())
    }

    #[test]
    fn create_then_list() {
        let server = server();
        let b = note("b", 1);
        let a = note("a", 0);
        assert_eq!(server.create(b.clone()), WriteOutcome::Created);
        assert_eq!(server.create(a.clone()), WriteOutcome::Created);

        assert_eq!(server.list(&notebook()), vec![a, b]);
        assert!(server.list(&NotebookId::parse("other").unwrap()).is_empty());
    }

    #[test]
    fn create_replays_replace() {
        let server = server();
        let mut n = note("first", 0);
        server.create(n.clone());
        n.content = "second".into();

        assert_eq!(server.create(n.clone()), WriteOutcome::Replaced);
        assert_eq!(server.note_count(), 1);
        assert_eq!(server.list(&notebook())[0].content, "second");
    }

    #[test]
    fn update_of_unknown_note_stores_it() {
        let server = server();
        let n = note("x", 0);
        assert_eq!(server.update(n.clone()), WriteOutcome::Created);
        assert_eq!(server.list(&notebook()), vec![n.clone()]);

        let mut edited = n.clone();
        edited.content = "y".into();
        assert_eq!(server.update(edited), WriteOutcome::Replaced);
        assert_eq!(server.note_count(), 1);
    }

    #[test]
    fn delete_unknown() {
        let server = server();
        let n = note("x", 0);
        assert!(matches!(
            server.delete(&notebook(), &n.id),
            Err(ServerError::NotFound(_))
        ));
    }

    #[test]
    fn request_round_trip() {
        let server = server();
        let n = note("hello", 0);

        let (status, _) = server.handle_request("POST", "/notes", &n.encode().unwrap());
        assert_eq!(status, 201);

        let (status, body) = server.handle_request("GET", "/notes?notebook=nb", b"");
        assert_eq!(status, 200);
        assert_eq!(ListNotesResponse::decode(&body).unwrap().notes, vec![n.clone()]);

        let mut edited = n.clone();
        edited.content = "edited".into();
        let path = paths::note(&n.id);
        let (status, _) = server.handle_request("PATCH", &path, &edited.encode().unwrap());
        assert_eq!(status, 200);
        assert_eq!(server.list(&notebook())[0].content, "edited");

        let path = paths::delete(&notebook(), &n.id);
        assert_eq!(server.handle_request("DELETE", &path, b"").0, 204);
        assert_eq!(server.handle_request("DELETE", &path, b"").0, 404);
    }

    #[test]
    fn patch_with_mismatched_id_is_refused() {
        let server = server();
        let n = note("x", 0);
        server.create(n.clone());
        let path = paths::note(&NoteId::new());

        let (status, _) = server.handle_request("PATCH", &path, &n.encode().unwrap());
        assert_eq!(status, 400);
    }

    #[test]
    fn bad_requests() {
        let server = server();
        assert_eq!(server.handle_request("GET", "/notes", b"").0, 400);
        assert_eq!(server.handle_request("GET", "/notes?notebook=bad%20id", b"").0, 400);
        assert_eq!(server.handle_request("POST", "/notes", b"{").0, 400);
        assert_eq!(server.handle_request("PUT", "/notes", b"").0, 404);
        assert_eq!(server.handle_request("DELETE", "/notes/not-a-uuid?notebook=nb", b"").0, 400);
    }

    #[test]
    fn oversized_body_is_refused() {
        let server = NoteServer::new(ServerConfig::default().with_max_body_bytes(4));
        let n = note("too long", 0);
        assert_eq!(server.handle_request("POST", "/notes", &n.encode().unwrap()).0, 413);
    }

    #[test]
    fn patch_of_deleted_note_recreates_it() {
        let server = server();
        let n = note("x", 0);
        server.create(n.clone());
        server.delete(&notebook(), &n.id).unwrap();

        let (status, _) = server.handle_request("PATCH", &paths::note(&n.id), &n.encode().unwrap());
        assert_eq!(status, 201);
        assert_eq!(server.list(&notebook()), vec![n]);
    }
}
