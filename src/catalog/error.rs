//! Catalog-specific error types
//!
//! Every catalog failure is a transport failure from the browse core's point
//! of view. The variants only exist to give log lines and user messages some
//! context.
//!
//! The type is `Clone` because the last failure is part of the observable
//! browse view, so it holds plain strings rather than the underlying
//! `reqwest` error.

use thiserror::Error;

/// Catalog query errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    /// The request never produced a response (connect, timeout, TLS)
    #[error("Request failed: {0}")]
    Request(String),

    /// The API answered with a non-success status
    #[error("{context} failed with status {status}")]
    Status { status: u16, context: String },

    /// The response body could not be decoded
    #[error("Could not decode response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for CatalogError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Request(err.to_string())
        }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod error_tests;
