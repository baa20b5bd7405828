//! Error types for the sync engine.

use notebook_protocol::NotebookId;
use notebook_storage::StorageError;
use thiserror::Error;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur during sync operations.
#[derive(Error, Debug)]
pub enum SyncError {
    /// The remote service could not be reached.
    #[error("network error: {message}")]
    Network {
        /// Error message.
        message: String,
        /// Whether the operation can be retried.
        retryable: bool,
    },

    /// A remote call did not complete in time.
    #[error("remote call timed out")]
    Timeout,

    /// The remote service answered but refused the request.
    #[error("remote rejected request (status {status}): {message}")]
    Rejected {
        /// HTTP status code.
        status: u16,
        /// Response body or reason.
        message: String,
    },

    /// The remote note list had an unexpected shape.
    #[error("malformed remote snapshot: {0}")]
    MalformedSnapshot(String),

    /// The persisted local state could not be read or written.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// The backend holds the state of a different notebook.
    #[error("stored state belongs to notebook {stored}, not {requested}")]
    NotebookMismatch {
        /// Notebook the stored state belongs to.
        stored: NotebookId,
        /// Notebook that was opened.
        requested: NotebookId,
    },

    /// Encoding or decoding failed.
    #[error("codec error: {0}")]
    Codec(String),
}

impl SyncError {
    /// Creates a retryable network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
            retryable: true,
        }
    }

    /// Creates a rejection error.
    pub fn rejected(status: u16, message: impl Into<String>) -> Self {
        Self::Rejected {
            status,
            message: message.into(),
        }
    }

    /// Returns true if the failure is transient and the same request may
    /// succeed later unchanged.
    ///
    /// Outages, timeouts, `408` and `429` are transient. Any other rejection
    /// refers to the request itself (an oversized note, for example) and
    /// will keep failing until the note changes.
    pub fn is_retryable(&self) -> bool {
        match self {
            SyncError::Network { retryable, .. } => *retryable,
            SyncError::Timeout => true,
            SyncError::Rejected { status, .. } => matches!(status, 408 | 429),
            SyncError::MalformedSnapshot(_)
            | SyncError::Storage(_)
            | SyncError::NotebookMismatch { .. }
            | SyncError::Codec(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_errors() {
        assert!(SyncError::network("connection refused").is_retryable());
        assert!(SyncError::Timeout.is_retryable());
        assert!(SyncError::rejected(429, "slow down").is_retryable());
        assert!(!SyncError::rejected(413, "too large").is_retryable());
        assert!(!SyncError::rejected(400, "bad request").is_retryable());
        assert!(!SyncError::Codec("bad cbor".into()).is_retryable());
        assert!(!SyncError::MalformedSnapshot("dup".into()).is_retryable());
    }

    #[test]
    fn error_display() {
        let err = SyncError::rejected(404, "no such note");
        assert!(err.to_string().contains("404"));
        assert_eq!(SyncError::Timeout.to_string(), "remote call timed out");
    }
}
