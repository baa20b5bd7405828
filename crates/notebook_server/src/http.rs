//! HTTP binding of the notes service.

use crate::error::ServerResult;
use crate::server::NoteServer;
use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::{header, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::any;
use axum::Router;
use notebook_protocol::paths;
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;

/// Creates the router for the notes API.
pub fn router(server: Arc<NoteServer>) -> Router {
    let limit = server.config().max_body_bytes;
    Router::new()
        .route(paths::NOTES, any(dispatch))
        .route(&format!("{}/:id", paths::NOTES), any(dispatch))
        .layer(DefaultBodyLimit::max(limit))
        .with_state(server)
}

async fn dispatch(
    State(server): State<Arc<NoteServer>>,
    method: Method,
    uri: Uri,
    body: Bytes,
) -> Response {
    let path = uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or_else(|| uri.path());
    let (status, body) = server.handle_request(method.as_str(), path, &body);
    let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    if status.is_success() && !body.is_empty() {
        (status, [(header::CONTENT_TYPE, "application/json")], body).into_response()
    } else {
        (status, body).into_response()
    }
}

/// Binds the configured address and serves until Ctrl+C.
pub async fn serve(server: Arc<NoteServer>) -> ServerResult<()> {
    let listener = TcpListener::bind(server.config().bind_addr).await?;
    serve_with_listener(listener, server, shutdown_signal()).await
}

/// Serves on an already bound listener until `shutdown` resolves.
pub async fn serve_with_listener<F>(
    listener: TcpListener,
    server: Arc<NoteServer>,
    shutdown: F,
) -> ServerResult<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listener.local_addr()?;
    tracing::info!(%addr, "notes service listening");
    axum::serve(listener, router(server))
        .with_graceful_shutdown(shutdown)
        .await?;
    tracing::info!("notes service stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
}
