//! Session storage error types
//!
//! These errors never reach the browse flow: [`SessionStore`](super::SessionStore)
//! logs them and degrades to "no persistence". They are public so backends
//! and tests can report precise causes.

use thiserror::Error;

/// Session storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    /// Represents a sled database error
    #[error("Database error: {0}")]
    SledError(#[from] sled::Error),

    /// Represents a JSON encoding or decoding error
    #[error("Error during serialization: {0}")]
    SerializeError(#[from] serde_json::Error),

    /// Stored snapshot was written by another schema version
    #[error("Snapshot version {found} is not supported (expected {expected})")]
    VersionMismatch { found: u32, expected: u32 },

    /// Stored snapshot decoded but its content is not usable
    #[error("Corrupt snapshot: {0}")]
    Corrupt(String),

    /// Backend refused the write (e.g. quota exceeded)
    #[error("Write rejected: {0}")]
    WriteRejected(String),
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod error_tests;
