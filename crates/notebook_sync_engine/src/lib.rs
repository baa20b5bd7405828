//! # Notebook Sync Engine
//!
//! Offline-first synchronization for shared notebooks.
//!
//! This crate provides:
//! - A local note store that renders immediately
//! - A per-note deduplicated queue of unconfirmed mutations
//! - Reconciliation of the remote note list with queued work
//! - A retry scheduler with exponential backoff
//! - Remote client abstractions (HTTP over `reqwest`, loopback, in-memory)
//!
//! ## Architecture
//!
//! The engine is **local-first**:
//! 1. Mutations apply to the local view and are queued in the same step
//! 2. The view and the queue are persisted before the mutation returns
//! 3. Queued operations are delivered in order, one note at a time
//! 4. On load, the remote list is merged with the queue (local wins)
//!
//! ## Key Invariants
//!
//! - At most one queued operation per note
//! - A note is `Synced` only when no newer operation for it is queued
//! - Deletion is terminal: a queued delete is never superseded
//! - Note ids are minted on the client, so replaying a create is harmless
//! - Remote failures never reach the store or the queue
//! - An operation the remote refuses stays queued but never holds back the
//!   notes queued behind it
//! - A backend holds one notebook; opening another notebook on it fails

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod error;
mod http;
mod persist;
mod queue;
mod reconcile;
mod remote;
mod scheduler;
mod session;
mod store;

pub use config::{RetryConfig, SyncConfig};
pub use error::{SyncError, SyncResult};
pub use http::{
    HttpClient, HttpRemoteClient, HttpRequest, HttpResponse, LoopbackClient, LoopbackServer,
    Method, ReqwestClient,
};
pub use persist::PersistedState;
pub use queue::SyncQueue;
pub use reconcile::{merge, validate_snapshot, RemoteSnapshot};
pub use remote::{CallCounts, MemoryRemote, RemoteClient};
pub use scheduler::{DrainReport, RetryScheduler, SchedulerHandle};
pub use session::{EventHandler, NotebookSession, SessionEvent, SessionOptions};
pub use store::NoteStore;
