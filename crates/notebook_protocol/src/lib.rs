//! # Notebook Protocol
//!
//! Data model and REST wire types shared by the notebook sync engine and the
//! reference notes service.
//!
//! This crate provides:
//! - `NoteId` and `NotebookId` identifiers (with notebook id minting)
//! - `Note` and its engine-owned `SyncState`
//! - `PendingOperation` records for the sync queue
//! - JSON request/response messages and endpoint paths
//!
//! This is a pure data crate with no I/O operations.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod id;
mod messages;
mod note;
mod operation;

pub use error::{ProtocolError, ProtocolResult};
pub use id::{NoteId, NotebookId, MAX_NOTEBOOK_ID_LEN};
pub use messages::{paths, ListNotesResponse};
pub use note::{Note, RemoteNote, SyncState};
pub use operation::{NotePayload, OperationKind, PendingOperation};
