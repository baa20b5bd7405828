//! File-based state backend for persistent storage.

use crate::backend::StateBackend;
use crate::error::{StorageError, StorageResult};
use fs2::FileExt;
use parking_lot::Mutex;
use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// A file-based state backend.
///
/// The blob lives in a single file. Writes go to a sibling temporary file
/// which is synced and then renamed over the target, so readers never see a
/// torn write.
///
/// # Locking
///
/// Opening the backend takes an exclusive advisory lock on `<path>.lock`.
/// A second session on the same state file fails with
/// [`StorageError::Locked`] instead of silently clobbering the first.
/// The lock is released when the backend is dropped.
///
/// # Example
///
/// ```no_run
/// use notebook_storage::{StateBackend, FileBackend};
/// use std::path::Path;
///
/// let backend = FileBackend::open(Path::new("notebook.state")).unwrap();
/// backend.store(b"persistent state").unwrap();
/// ```
#[derive(Debug)]
pub struct FileBackend {
    path: PathBuf,
    _lock_file: File,
    write_lock: Mutex<()>,
}

impl FileBackend {
    /// Opens a file backend at the given path.
    ///
    /// The state file itself is not created until the first `store`.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock file cannot be created or is held by
    /// another session.
    pub fn open(path: &Path) -> StorageResult<Self> {
        let lock_path = sibling(path, ".lock");
        let lock_file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)?;

        if lock_file.try_lock_exclusive().is_err() {
            return Err(StorageError::Locked(path.to_path_buf()));
        }

        Ok(Self {
            path: path.to_path_buf(),
            _lock_file: lock_file,
            write_lock: Mutex::new(()),
        })
    }

    /// Opens a file backend, creating parent directories if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if directories cannot be created or the file cannot
    /// be locked.
    pub fn open_with_create_dirs(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        Self::open(path)
    }

    /// Returns the path to the state file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StateBackend for FileBackend {
    fn load(&self) -> StorageResult<Option<Vec<u8>>> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn store(&self, data: &[u8]) -> StorageResult<()> {
        let _guard = self.write_lock.lock();
        let tmp_path = sibling(&self.path, ".tmp");

        let mut tmp = File::create(&tmp_path)?;
        tmp.write_all(data)?;
        tmp.sync_all()?;
        drop(tmp);

        fs::rename(&tmp_path, &self.path)?;
        tracing::trace!(path = %self.path.display(), bytes = data.len(), "state stored");
        Ok(())
    }

    fn clear(&self) -> StorageResult<()> {
        let _guard = self.write_lock.lock();
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Returns `path` with `suffix` appended to its file name.
fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name: OsString = path.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_loads_none() {
        let dir = tempdir().unwrap();
        let backend = FileBackend::open(&dir.path().join("nb.state")).unwrap();
        assert_eq!(backend.load().unwrap(), None);
    }

    #[test]
    fn store_survives_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nb.state");

        {
            let backend = FileBackend::open(&path).unwrap();
            backend.store(b"persistent").unwrap();
        }

        let backend = FileBackend::open(&path).unwrap();
        assert_eq!(backend.load().unwrap(), Some(b"persistent".to_vec()));
    }

    #[test]
    fn store_leaves_no_temp_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nb.state");
        let backend = FileBackend::open(&path).unwrap();
        backend.store(b"x").unwrap();
        assert!(!sibling(&path, ".tmp").exists());
    }

    #[test]
    fn second_open_is_locked() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nb.state");
        let _first = FileBackend::open(&path).unwrap();

        let second = FileBackend::open(&path);
        assert!(matches!(second, Err(StorageError::Locked(_))));
    }

    #[test]
    fn clear_removes_state() {
        let dir = tempdir().unwrap();
        let backend = FileBackend::open(&dir.path().join("nb.state")).unwrap();
        backend.store(b"x").unwrap();
        backend.clear().unwrap();
        assert_eq!(backend.load().unwrap(), None);
        backend.clear().unwrap();
    }

    #[test]
    fn open_with_create_dirs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a").join("b").join("nb.state");
        let backend = FileBackend::open_with_create_dirs(&path).unwrap();
        backend.store(b"nested").unwrap();
        assert_eq!(backend.path(), path.as_path());
        assert!(path.exists());
    }
}
