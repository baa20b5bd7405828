//! CLI command implementations.

pub mod notes;
pub mod serve;
pub mod sync;

use notebook_protocol::{NoteId, NotebookId};
use notebook_storage::FileBackend;
use notebook_sync_engine::{
    DrainReport, HttpRemoteClient, NotebookSession, ReqwestClient, SessionEvent, SessionOptions,
    SyncConfig,
};
use std::path::PathBuf;

/// Session type used by the CLI.
pub type Session = NotebookSession<HttpRemoteClient<ReqwestClient>, FileBackend>;

/// Settings shared by all commands.
#[derive(Debug, Clone)]
pub struct Context {
    /// Directory holding one state file per notebook.
    pub state_dir: PathBuf,
    /// Base URL of the notes service.
    pub server: String,
}

impl Context {
    /// Creates a command context.
    pub fn new(state_dir: PathBuf, server: String) -> Self {
        Self { state_dir, server }
    }

    /// Returns the state file of a notebook.
    pub fn state_path(&self, notebook_id: &NotebookId) -> PathBuf {
        self.state_dir.join(format!("{notebook_id}.state"))
    }

    /// Opens the session of a notebook.
    ///
    /// Opening never contacts the service.
    pub fn open(&self, notebook: &str) -> Result<Session, Box<dyn std::error::Error>> {
        let notebook_id = NotebookId::parse(notebook)?;
        let backend = FileBackend::open_with_create_dirs(&self.state_path(&notebook_id))?;
        let config = SyncConfig::new(self.server.clone());
        let remote = HttpRemoteClient::new(
            config.server_url.clone(),
            ReqwestClient::new(config.request_timeout)?,
        );
        let options = SessionOptions::new(format!("/{notebook_id}"))
            .with_config(config)
            .on_event(log_event);
        Ok(NotebookSession::open(options, remote, backend)?)
    }
}

fn log_event(event: &SessionEvent) {
    match event {
        SessionEvent::NotebookMinted(id) => tracing::info!(notebook = %id, "minted notebook"),
        SessionEvent::NoteStateChanged { note_id, state } => {
            tracing::debug!(%note_id, ?state, "note state changed");
        }
        SessionEvent::Reconciled {
            notes,
            remote_available,
        } => {
            tracing::debug!(notes = notes.len(), remote_available, "reconciled");
        }
    }
}

/// Parses a note id argument.
pub fn parse_note_id(note: &str) -> Result<NoteId, Box<dyn std::error::Error>> {
    Ok(note.parse::<NoteId>()?)
}

/// Prints the outcome of sending queued changes.
pub fn print_report(report: &DrainReport) {
    for note_id in &report.rejected {
        println!("The service refused note {note_id}; edit it to try again");
    }
    if report.is_complete() {
        if report.sent > 0 {
            println!("Synced {} change(s)", report.sent);
        }
    } else if report.failed.is_some() {
        println!(
            "Sent {} change(s); {} kept locally until the service is reachable",
            report.sent, report.remaining
        );
    } else if report.sent > 0 {
        println!("Synced {} change(s)", report.sent);
    }
}
