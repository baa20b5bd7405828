//! Note and notebook identifiers.

use crate::error::{ProtocolError, ProtocolResult};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Maximum length of a notebook identifier.
pub const MAX_NOTEBOOK_ID_LEN: usize = 64;

/// Number of letter groups in a minted notebook id.
const MINTED_GROUPS: usize = 3;
/// Number of letters per group in a minted notebook id.
const MINTED_GROUP_LEN: usize = 5;

/// Unique identifier for a note.
///
/// Note IDs are generated on the client when the note is created and are
/// never assigned by the remote service. This is what makes a `Create`
/// idempotent under retry: every attempt carries the same id.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NoteId(Uuid);

impl NoteId {
    /// Creates a new random note ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a note ID from a UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Converts to a UUID.
    #[must_use]
    pub const fn to_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for NoteId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NoteId({})", self.0)
    }
}

impl fmt::Display for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for NoteId {
    type Err = ProtocolError;

    fn from_str(s: &str) -> ProtocolResult<Self> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|_| ProtocolError::InvalidNoteId(s.to_string()))
    }
}

/// Shareable identifier of a notebook.
///
/// Notebook IDs are URL-safe strings: ASCII alphanumerics, `-` and `_`,
/// at most [`MAX_NOTEBOOK_ID_LEN`] characters. They appear verbatim as the
/// path of the address a notebook is shared under.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NotebookId(String);

impl NotebookId {
    /// Parses and validates a notebook ID.
    pub fn parse(s: &str) -> ProtocolResult<Self> {
        if Self::is_valid(s) {
            Ok(Self(s.to_string()))
        } else {
            Err(ProtocolError::InvalidNotebookId(s.to_string()))
        }
    }

    /// Returns true if `s` is a well-formed notebook ID.
    pub fn is_valid(s: &str) -> bool {
        !s.is_empty()
            && s.len() <= MAX_NOTEBOOK_ID_LEN
            && s
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
    }

    /// Mints a fresh notebook ID from a random seed.
    ///
    /// This is a pure function of `seed`: the same seed always yields the
    /// same ID. Callers supply entropy (e.g. from the OS) at the edge.
    ///
    /// Minted IDs look like `qwert-yuiop-asdfg`.
    #[must_use]
    pub fn mint(seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let groups: Vec<String> = (0..MINTED_GROUPS)
            .map(|_| {
                (0..MINTED_GROUP_LEN)
                    .map(|_| char::from(b'a' + rng.gen_range(0..26u8)))
                    .collect()
            })
            .collect();
        Self(groups.join("-"))
    }

    /// Extracts a notebook ID from an address path.
    ///
    /// The last non-empty path segment is taken as the ID. Returns `None`
    /// for the root path or when the segment is not a valid ID, in which
    /// case the caller is expected to mint a new notebook.
    pub fn from_location(path: &str) -> Option<Self> {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let segment = path.rsplit('/').find(|s| !s.is_empty())?;
        Self::parse(segment).ok()
    }

    /// Returns the ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for NotebookId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NotebookId({})", self.0)
    }
}

impl fmt::Display for NotebookId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for NotebookId {
    type Err = ProtocolError;

    fn from_str(s: &str) -> ProtocolResult<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for NotebookId {
    type Error = ProtocolError;

    fn try_from(value: String) -> ProtocolResult<Self> {
        if Self::is_valid(&value) {
            Ok(Self(value))
        } else {
            Err(ProtocolError::InvalidNotebookId(value))
        }
    }
}

impl From<NotebookId> for String {
    fn from(id: NotebookId) -> Self {
        id.0
    }
}
