//! Serve command implementation.

use notebook_server::{serve, NoteServer, ServerConfig};
use std::net::SocketAddr;
use std::sync::Arc;

/// Runs the reference notes service until Ctrl+C.
pub async fn run(bind: SocketAddr) -> Result<(), Box<dyn std::error::Error>> {
    let server = Arc::new(NoteServer::new(ServerConfig::new(bind)));
    serve(server).await?;
    Ok(())
}
