//! Larder - resumable browsing of a remote product catalog
//!
//! This library owns the browse state of a paginated, filterable product
//! listing: the active filters, the pagination cursor and the loaded items.
//! It drives "load more" pagination against an injected catalog client,
//! refuses overlapping loads, ignores responses that arrive for filters the
//! user already left, and keeps a session-scoped snapshot so a view can be
//! re-entered exactly where it was left.
//!
//! # Modules
//!
//! - `catalog`: the catalog client capability, its HTTP implementation and a mock
//! - `browse`: filters, cursor, sorting, load coordination and the controller
//! - `session`: snapshot encoding and the session-scoped stores
//! - `config`: user configuration
//! - `cli` / `output`: the terminal front end

use std::sync::{Mutex, MutexGuard, PoisonError};
use thiserror::Error;

pub mod browse;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod output;
pub mod session;

#[cfg(test)]
pub mod testing;

/// Error enum, contains all failure states of the program
#[derive(Debug, Error)]
pub enum LarderError {
    /// Browse controller error
    #[error("Browse error: {0}")]
    BrowseError(#[from] browse::BrowseError),
    /// Catalog client error
    #[error("Catalog error: {0}")]
    CatalogError(#[from] catalog::CatalogError),
    /// Session storage error
    #[error("Storage error: {0}")]
    StorageError(#[from] session::StorageError),
    /// Represents a configuration error
    #[error("Configuration error: {0}")]
    ConfigError(#[from] ::config::ConfigError),
    /// Represents an I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
    /// Invalid input error
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Lock a mutex, recovering the data if a previous holder panicked
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
