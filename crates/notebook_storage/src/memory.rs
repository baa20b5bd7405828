//! In-memory state backend for testing.

use crate::backend::StateBackend;
use crate::error::StorageResult;
use parking_lot::RwLock;
use std::sync::Arc;

/// An in-memory state backend.
///
/// Clones share the same underlying blob. Tests use this to model a page
/// reload: the old session is dropped and a new one is opened on a clone of
/// the same backend.
///
/// # Example
///
/// ```rust
/// use notebook_storage::{StateBackend, InMemoryBackend};
///
/// let backend = InMemoryBackend::new();
/// let reloaded = backend.clone();
/// backend.store(b"v1").unwrap();
/// assert_eq!(reloaded.load().unwrap(), Some(b"v1".to_vec()));
/// ```
#[derive(Debug, Clone, Default)]
pub struct InMemoryBackend {
    data: Arc<RwLock<Option<Vec<u8>>>>,
}

impl InMemoryBackend {
    /// Creates a new empty in-memory backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new in-memory backend with pre-existing data.
    ///
    /// Useful for testing recovery scenarios.
    #[must_use]
    pub fn with_data(data: Vec<u8>) -> Self {
        Self {
            data: Arc::new(RwLock::new(Some(data))),
        }
    }

    /// Returns the number of bytes currently stored.
    #[must_use]
    pub fn size(&self) -> usize {
        self.data.read().as_ref().map_or(0, Vec::len)
    }
}

impl StateBackend for InMemoryBackend {
    fn load(&self) -> StorageResult<Option<Vec<u8>>> {
        Ok(self.data.read().clone())
    }

    fn store(&self, data: &[u8]) -> StorageResult<()> {
        *self.data.write() = Some(data.to_vec());
        Ok(())
    }

    fn clear(&self) -> StorageResult<()> {
        *self.data.write() = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_backend() {
        let backend = InMemoryBackend::new();
        assert_eq!(backend.load().unwrap(), None);
        assert_eq!(backend.size(), 0);
    }

    #[test]
    fn store_replaces() {
        let backend = InMemoryBackend::new();
        backend.store(b"first").unwrap();
        backend.store(b"second").unwrap();
        assert_eq!(backend.load().unwrap(), Some(b"second".to_vec()));
        assert_eq!(backend.size(), 6);
    }

    #[test]
    fn clones_share_state() {
        let backend = InMemoryBackend::with_data(b"seed".to_vec());
        let other = backend.clone();
        other.clear().unwrap();
        assert_eq!(backend.load().unwrap(), None);
    }
}
