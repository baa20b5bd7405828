//! # Notebook Storage
//!
//! Durable local state backends for the notebook sync engine.
//!
//! A backend holds a single opaque blob: the latest persisted state of one
//! notebook session. Backends do not interpret the bytes they store; the
//! sync engine owns the state layout.
//!
//! ## Design Principles
//!
//! - `store` replaces the whole blob atomically
//! - `load` returns exactly the bytes of the last successful `store`
//! - Must be `Send + Sync` so a session can be shared across tasks
//!
//! ## Available Backends
//!
//! - [`InMemoryBackend`] - For tests; clones share the same blob, which
//!   simulates a page reload reading the storage written before it
//! - [`FileBackend`] - For persistent storage using OS file APIs
//!
//! ## Example
//!
//! ```rust
//! use notebook_storage::{StateBackend, InMemoryBackend};
//!
//! let backend = InMemoryBackend::new();
//! assert_eq!(backend.load().unwrap(), None);
//! backend.store(b"state").unwrap();
//! assert_eq!(backend.load().unwrap(), Some(b"state".to_vec()));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod error;
mod file;
mod memory;

pub use backend::StateBackend;
pub use error::{StorageError, StorageResult};
pub use file::FileBackend;
pub use memory::InMemoryBackend;
