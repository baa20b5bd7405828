//! # Notebook Server
//!
//! Reference implementation of the notes service consumed by the notebook
//! sync engine.
//!
//! This crate provides:
//! - An in-memory note repository grouped by notebook
//! - Request dispatch for the REST endpoints (`/notes`, `/notes/{id}`)
//! - An axum router and a `serve` entry point
//!
//! # Semantics
//!
//! - `POST /notes` stores or replaces a note (201 created, 200 replaced)
//! - `PATCH /notes/{id}` replaces a note, storing it if unknown
//! - `DELETE /notes/{id}?notebook=ID` removes a note (404 if unknown)
//! - `GET /notes?notebook=ID` lists a notebook ordered by position
//!
//! State lives in memory only; restarting the server empties it.

#![deny(unsafe_code)]
#![warn(missing_docs)]
// Production code MUST NOT use panic!/unwrap()/expect()
#![warn(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod config;
mod error;
mod http;
mod server;

pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use http::{router, serve, serve_with_listener};
pub use server::{NoteServer, WriteOutcome};
