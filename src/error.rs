//! Error types for the persistence layer and the creation path.
//!
//! [`StorageError`] never escapes the public gateway operations; it is
//! surfaced only through the explicit `try_*` and outcome APIs so callers
//! and tests can tell the failure kinds apart.

use thiserror::Error;

/// Failures the storage gateway absorbs at its boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    /// No storage backend is present, or it could not be read.
    #[error("Storage medium unavailable: {0}")]
    MediumUnavailable(String),

    /// The stored payload is not well-formed.
    #[error("Payload parse failure: {0}")]
    ParseFailure(String),

    /// The backend rejected a write (quota, permissions, closed environment).
    #[error("Write failure: {0}")]
    WriteFailure(String),

    /// A single record carried a timestamp that could not be parsed.
    #[error("Invalid timestamp: {0}")]
    TimestampInvalid(String),
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::ParseFailure(err.to_string())
    }
}

/// Validation failures raised while committing a draft entry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DraftError {
    #[error("Name must not be empty")]
    EmptyName,

    #[error("Unknown category '{0}'")]
    UnknownCategory(String),

    #[error("Score for {field} is not a whole number: '{value}'")]
    InvalidScore { field: &'static str, value: String },

    #[error("Score for {field} must be between 1 and 10, got {value}")]
    ScoreOutOfRange { field: &'static str, value: i64 },

    #[error("Journal is full ({max} entries)")]
    JournalFull { max: usize },
}
