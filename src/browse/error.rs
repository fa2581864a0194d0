//! Browse-specific error types
//!
//! Only a few of these ever reach a caller as `Err`:
//!
//! - **`Busy`**: a load was requested while one is in flight. UI code that
//!   disables "load more" while loading never sees it.
//! - **`NotFound`**: a barcode lookup found nothing.
//! - **`Transport`**: a barcode lookup failed. Page-load failures are not
//!   returned; they show up in the view's `error` field.
//! - **`InvalidInput`**: rejected arguments (empty barcode, zero page size).
//!
//! `Storage` exists so storage problems can be wrapped when a caller wants
//! them; the controller itself swallows them at the session boundary.

use crate::catalog::CatalogError;
use crate::session::StorageError;
use thiserror::Error;

/// Browse controller errors
#[derive(Debug, Error)]
pub enum BrowseError {
    /// A load is already in flight
    #[error("A load is already in progress")]
    Busy,

    /// Barcode lookup found no product
    #[error("No product found for barcode {0}")]
    NotFound(String),

    /// Catalog request failed
    #[error("Catalog request failed: {0}")]
    Transport(#[from] CatalogError),

    /// Session storage failed
    #[error("Session storage error: {0}")]
    Storage(#[from] StorageError),

    /// Invalid argument
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod error_tests;
