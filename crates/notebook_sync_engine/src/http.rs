//! HTTP transport for the remote notes service.
//!
//! The REST mapping lives in [`HttpRemoteClient`]; the actual HTTP client is
//! abstracted via [`HttpClient`] so tests can route requests to an
//! in-process server ([`LoopbackClient`]) and production code can use
//! [`ReqwestClient`].

use crate::error::{SyncError, SyncResult};
use crate::remote::RemoteClient;
use notebook_protocol::{paths, ListNotesResponse, NoteId, NotebookId, RemoteNote};
use std::fmt;
use std::future::Future;
use std::time::Duration;

/// HTTP methods used by the notes API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// `GET`
    Get,
    /// `POST`
    Post,
    /// `PATCH`
    Patch,
    /// `DELETE`
    Delete,
}

impl Method {
    /// Returns the method name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An outgoing HTTP request.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    /// Request method.
    pub method: Method,
    /// Absolute URL.
    pub url: String,
    /// JSON body, if any.
    pub body: Option<Vec<u8>>,
}

/// A received HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// Status code.
    pub status: u16,
    /// Response body.
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Creates a response.
    pub fn new(status: u16, body: Vec<u8>) -> Self {
        Self { status, body }
    }

    /// Returns true for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// HTTP client abstraction.
///
/// Implementations return `Err` only when no response was received
/// (connection refused, timeout, aborted); any status code is an `Ok`.
pub trait HttpClient: Send + Sync {
    /// Sends a request.
    fn send(&self, request: HttpRequest) -> impl Future<Output = SyncResult<HttpResponse>> + Send;
}

/// Remote notes client speaking the REST API over an [`HttpClient`].
pub struct HttpRemoteClient<C: HttpClient> {
    /// Base URL of the notes service (e.g. "http://localhost:8080").
    base_url: String,
    client: C,
}

impl<C: HttpClient> HttpRemoteClient<C> {
    /// Creates a new client.
    pub fn new(base_url: impl Into<String>, client: C) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    /// Returns the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn call(&self, method: Method, path: &str, body: Option<Vec<u8>>) -> SyncResult<HttpResponse> {
        let request = HttpRequest {
            method,
            url: format!("{}{}", self.base_url, path),
            body,
        };
        tracing::trace!(%method, url = %request.url, "remote call");
        self.client.send(request).await
    }
}

/// Maps a write response onto the idempotent contract of [`RemoteClient`].
fn write_outcome(method: Method, response: HttpResponse) -> SyncResult<()> {
    match (method, response.status) {
        (_, status) if (200..300).contains(&status) => Ok(()),
        // Replayed create of a note that already exists.
        (Method::Post, 409) => Ok(()),
        // Delete of a note the remote never saw or already removed.
        (Method::Delete, 404) => Ok(()),
        (_, status) if status >= 500 => Err(SyncError::network(format!(
            "server error {status}: {}",
            String::from_utf8_lossy(&response.body)
        ))),
        (_, status) => Err(SyncError::rejected(
            status,
            String::from_utf8_lossy(&response.body),
        )),
    }
}

impl<C: HttpClient> RemoteClient for HttpRemoteClient<C> {
    async fn fetch_all(&self, notebook_id: &NotebookId) -> SyncResult<Vec<RemoteNote>> {
        let response = self.call(Method::Get, &paths::list(notebook_id), None).await?;
        if !response.is_success() {
            write_outcome(Method::Get, response)?;
            return Err(SyncError::MalformedSnapshot("unexpected status".into()));
        }
        ListNotesResponse::decode(&response.body)
            .map(|list| list.notes)
            .map_err(|e| SyncError::MalformedSnapshot(e.to_string()))
    }

    async fn create(&self, note: &RemoteNote) -> SyncResult<()> {
        let body = note.encode().map_err(|e| SyncError::Codec(e.to_string()))?;
        let response = self.call(Method::Post, paths::NOTES, Some(body)).await?;
        write_outcome(Method::Post, response)
    }

    async fn update(&self, note: &RemoteNote) -> SyncResult<()> {
        let body = note.encode().map_err(|e| SyncError::Codec(e.to_string()))?;
        let response = self
            .call(Method::Patch, &paths::note(&note.id), Some(body.clone()))
            .await?;
        if response.status == 404 {
            // Removed by another client; the local edit brings it back.
            tracing::debug!(note_id = %note.id, "update of unknown note, re-creating");
            let response = self.call(Method::Post, paths::NOTES, Some(body)).await?;
            return write_outcome(Method::Post, response);
        }
        write_outcome(Method::Patch, response)
    }

    async fn delete(&self, notebook_id: &NotebookId, note_id: &NoteId) -> SyncResult<()> {
        let response = self
            .call(Method::Delete, &paths::delete(notebook_id, note_id), None)
            .await?;
        write_outcome(Method::Delete, response)
    }
}

/// HTTP client backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct ReqwestClient {
    client: reqwest::Client,
}

impl ReqwestClient {
    /// Creates a client applying `timeout` to every request.
    pub fn new(timeout: Duration) -> SyncResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SyncError::Network {
                message: format!("failed to build HTTP client: {e}"),
                retryable: false,
            })?;
        Ok(Self { client })
    }
}

impl HttpClient for ReqwestClient {
    async fn send(&self, request: HttpRequest) -> SyncResult<HttpResponse> {
        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Patch => reqwest::Method::PATCH,
            Method::Delete => reqwest::Method::DELETE,
        };

        let mut builder = self.client.request(method, &request.url);
        if let Some(body) = request.body {
            builder = builder
                .header(reqwest::header::CONTENT_TYPE, "application/json")
                .body(body);
        }

        let response = builder.send().await.map_err(classify_reqwest)?;
        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(classify_reqwest)?;
        Ok(HttpResponse::new(status, body.to_vec()))
    }
}

fn classify_reqwest(error: reqwest::Error) -> SyncError {
    if error.is_timeout() {
        SyncError::Timeout
    } else {
        SyncError::network(error.to_string())
    }
}

/// Trait for servers that can handle loopback requests.
pub trait LoopbackServer {
    /// Handles a request for `path` (including the query string).
    ///
    /// Returns `Err` to simulate a request that never reached the server.
    fn handle(&self, method: Method, path: &str, body: &[u8]) -> Result<HttpResponse, String>;
}

/// A loopback HTTP client that routes requests directly to a server.
///
/// Useful for testing without actual network overhead.
pub struct LoopbackClient<S: LoopbackServer> {
    server: S,
}

impl<S: LoopbackServer + Send + Sync> LoopbackClient<S> {
    /// Creates a new loopback client connected to the given server.
    pub fn new(server: S) -> Self {
        Self { server }
    }

    /// Returns the wrapped server.
    pub fn server(&self) -> &S {
        &self.server
    }
}

impl<S: LoopbackServer + Send + Sync> HttpClient for LoopbackClient<S> {
    async fn send(&self, request: HttpRequest) -> SyncResult<HttpResponse> {
        let path = request
            .url
            .find(paths::NOTES)
            .map(|i| &request.url[i..])
            .unwrap_or(&request.url);

        self.server
            .handle(request.method, path, request.body.as_deref().unwrap_or_default())
            .map_err(SyncError::network)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notebook_protocol::Note;
    use parking_lot::RwLock;
    use std::sync::atomic::{AtomicBool, Ordering};

    struct TestServer {
        response: RwLock<HttpResponse>,
        seen: RwLock<Vec<(Method, String)>>,
        reachable: AtomicBool,
    }

    impl TestServer {
        fn new(status: u16, body: &[u8]) -> Self {
            Self {
                response: RwLock::new(HttpResponse::new(status, body.to_vec())),
                seen: RwLock::new(Vec::new()),
                reachable: AtomicBool::new(true),
            }
        }
    }

    impl LoopbackServer for TestServer {
        fn handle(&self, method: Method, path: &str, _body: &[u8]) -> Result<HttpResponse, String> {
            if !self.reachable.load(Ordering::SeqCst) {
                return Err("connection refused".into());
            }
            self.seen.write().push((method, path.to_string()));
            Ok(self.response.read().clone())
        }
    }

    fn client(status: u16, body: &[u8]) -> HttpRemoteClient<LoopbackClient<TestServer>> {
        HttpRemoteClient::new(
            "http://notes.example.com/",
            LoopbackClient::new(TestServer::new(status, body)),
        )
    }

    fn notebook() -> NotebookId {
        NotebookId::parse("nb").unwrap()
    }

    fn seen(client: &HttpRemoteClient<LoopbackClient<TestServer>>) -> Vec<(Method, String)> {
        client.client.server().seen.read().clone()
    }

    #[test]
    fn base_url_is_normalized() {
        let client = client(200, b"");
        assert_eq!(client.base_url(), "http://notes.example.com");
    }

    #[tokio::test]
    async fn fetch_all_decodes_list() {
        let note = Note::new(NoteId::new(), "one", 0).to_remote(&notebook());
        let body = ListNotesResponse::new(vec![note.clone()]).encode().unwrap();
        let client = client(200, &body);

        let notes = client.fetch_all(&notebook()).await.unwrap();
        assert_eq!(notes, vec![note]);
        assert_eq!(seen(&client), vec![(Method::Get, "/notes?notebook=nb".to_string())]);
    }

    #[tokio::test]
    async fn fetch_all_malformed_body() {
        let client = client(200, b"{\"nope\":1}");
        let result = client.fetch_all(&notebook()).await;
        assert!(matches!(result, Err(SyncError::MalformedSnapshot(_))));
    }

    #[tokio::test]
    async fn unreachable_server_is_network_error() {
        let client = client(200, b"");
        client.client.server().reachable.store(false, Ordering::SeqCst);

        let result = client.delete(&notebook(), &NoteId::new()).await;
        assert!(matches!(result, Err(SyncError::Network { retryable: true, .. })));
    }

    #[tokio::test]
    async fn delete_unknown_is_success() {
        let client = client(404, b"not found");
        client.delete(&notebook(), &NoteId::new()).await.unwrap();
    }

    #[tokio::test]
    async fn create_conflict_is_success() {
        let client = client(409, b"exists");
        let note = Note::new(NoteId::new(), "one", 0).to_remote(&notebook());
        client.create(&note).await.unwrap();
        assert_eq!(seen(&client)[0], (Method::Post, "/notes".to_string()));
    }

    #[tokio::test]
    async fn update_status_mapping() {
        let note = Note::new(NoteId::new(), "one", 0).to_remote(&notebook());

        let down = client(503, b"unavailable").update(&note).await;
        assert!(matches!(down, Err(SyncError::Network { .. })));

        let too_large = client(413, b"too large").update(&note).await;
        assert!(matches!(too_large, Err(SyncError::Rejected { status: 413, .. })));
    }

    #[tokio::test]
    async fn update_of_missing_note_falls_back_to_create() {
        let note = Note::new(NoteId::new(), "one", 0).to_remote(&notebook());
        let client = client(404, b"not found");

        let result = client.update(&note).await;
        assert!(matches!(result, Err(SyncError::Rejected { status: 404, .. })));
        assert_eq!(
            seen(&client),
            vec![
                (Method::Patch, paths::note(&note.id)),
                (Method::Post, "/notes".to_string()),
            ]
        );
    }

    #[test]
    fn method_names() {
        assert_eq!(Method::Patch.as_str(), "PATCH");
        assert_eq!(Method::Delete.to_string(), "DELETE");
    }
}
