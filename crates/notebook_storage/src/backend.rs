//! State backend trait definition.

use crate::error::StorageResult;

/// A durable store for one opaque state blob.
///
/// # Invariants
///
/// - `load` returns `None` until the first successful `store`
/// - `store` is atomic: a crash leaves either the old or the new blob
/// - Backends must be `Send + Sync` for concurrent access
///
/// # Implementors
///
/// - [`super::InMemoryBackend`] - For testing
/// - [`super::FileBackend`] - For persistent storage
pub trait StateBackend: Send + Sync {
    /// Reads the stored blob, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if an I/O error occurs.
    fn load(&self) -> StorageResult<Option<Vec<u8>>>;

    /// Replaces the stored blob.
    ///
    /// After this returns successfully the blob survives process
    /// termination (for persistent backends).
    ///
    /// # Errors
    ///
    /// Returns an error if the data cannot be made durable.
    fn store(&self, data: &[u8]) -> StorageResult<()>;

    /// Removes the stored blob.
    ///
    /// # Errors
    ///
    /// Returns an error if an I/O error occurs.
    fn clear(&self) -> StorageResult<()>;
}
