//! Error types for protocol encoding and validation.

use thiserror::Error;

/// Result type for protocol operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;

/// Errors produced while validating identifiers or decoding messages.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// A notebook identifier failed validation.
    #[error("invalid notebook id: {0:?}")]
    InvalidNotebookId(String),

    /// A note identifier could not be parsed.
    #[error("invalid note id: {0:?}")]
    InvalidNoteId(String),

    /// A message body could not be encoded or decoded.
    #[error("codec error: {0}")]
    Codec(#[from] serde_json::Error),
}
