//! Session-scoped browse snapshots
//!
//! A [`BrowseSnapshot`] is the unit of resume-on-return: the filters, the
//! pagination cursor and the items loaded under exactly those filters, in
//! arrival order.
//!
//! Snapshots are stored as a versioned JSON envelope through a
//! [`SessionBackend`]. Anything that does not decode cleanly under the
//! current version is treated as absent and removed, so an outdated or
//! damaged entry can never be restored.
//!
//! # Backends
//!
//! - [`MemoryBackend`]: process memory with idle expiry (default)
//! - [`SledBackend`]: sled tree, temporary or at a path

pub mod error;
pub mod memory;
pub mod sled_store;

pub use error::StorageError;
pub use memory::MemoryBackend;
pub use sled_store::SledBackend;

use crate::browse::{FilterState, PaginationCursor};
use crate::catalog::ProductSummary;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Bump whenever the stored shape changes
pub const SNAPSHOT_VERSION: u32 = 1;

/// Key used when none is configured
pub const DEFAULT_SESSION_KEY: &str = "browse:home";

/// Filters, cursor and the items loaded under them
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrowseSnapshot {
    pub filters: FilterState,
    pub cursor: PaginationCursor,
    /// Arrival order, never pre-sorted
    pub items: Vec<ProductSummary>,
}

impl BrowseSnapshot {
    /// Check the snapshot could have been produced by the controller
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Corrupt` describing the first problem found.
    pub fn validate(&self) -> Result<(), StorageError> {
        if !self.cursor.is_valid() {
            return Err(StorageError::Corrupt(format!(
                "invalid cursor (page {}, size {})",
                self.cursor.page_number(),
                self.cursor.page_size()
            )));
        }

        let capacity = (self.cursor.page_number() as usize)
            .checked_mul(self.cursor.page_size())
            .ok_or_else(|| {
                StorageError::Corrupt(format!(
                    "page {} of size {} is out of range",
                    self.cursor.page_number(),
                    self.cursor.page_size()
                ))
            })?;
        if self.items.len() > capacity {
            return Err(StorageError::Corrupt(format!(
                "{} items cannot come from {} page(s) of {}",
                self.items.len(),
                self.cursor.page_number(),
                self.cursor.page_size()
            )));
        }

        Ok(())
    }
}

#[derive(Serialize)]
struct EnvelopeRef<'a> {
    version: u32,
    saved_at: DateTime<Utc>,
    snapshot: &'a BrowseSnapshot,
}

#[derive(Deserialize)]
struct Envelope {
    saved_at: DateTime<Utc>,
    snapshot: BrowseSnapshot,
}

/// Serialize `snapshot` into a versioned envelope
///
/// # Errors
///
/// Returns `StorageError::SerializeError` if JSON encoding fails.
pub fn encode(snapshot: &BrowseSnapshot) -> Result<Vec<u8>, StorageError> {
    let envelope = EnvelopeRef {
        version: SNAPSHOT_VERSION,
        saved_at: Utc::now(),
        snapshot,
    };
    Ok(serde_json::to_vec(&envelope)?)
}

/// Decode a versioned envelope
///
/// The version is checked before the body is interpreted, so a future
/// schema reports `VersionMismatch` rather than a parse error.
///
/// # Errors
///
/// Returns `StorageError` if the bytes are not JSON, the version differs,
/// or the snapshot fails validation.
pub fn decode(bytes: &[u8]) -> Result<BrowseSnapshot, StorageError> {
    let value: Value = serde_json::from_slice(bytes)?;
    let found = value
        .get("version")
        .and_then(Value::as_u64)
        .ok_or_else(|| StorageError::Corrupt("missing version".into()))?;
    if found != u64::from(SNAPSHOT_VERSION) {
        return Err(StorageError::VersionMismatch {
            found: u32::try_from(found).unwrap_or(u32::MAX),
            expected: SNAPSHOT_VERSION,
        });
    }

    let envelope: Envelope = serde_json::from_value(value)?;
    envelope.snapshot.validate()?;
    log::debug!("decoded snapshot saved at {}", envelope.saved_at);
    Ok(envelope.snapshot)
}

/// Byte storage scoped to one browsing session
///
/// Contents must survive in-app navigation and must not outlive the
/// application.
pub trait SessionBackend: Send + Sync {
    /// Store `bytes` under `key`, replacing any previous value
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the write fails.
    fn save(&self, key: &str, bytes: Vec<u8>) -> Result<(), StorageError>;

    /// Value stored under `key`, if any
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the read fails.
    fn load(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError>;

    /// Remove `key`; removing a missing key is not an error
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the delete fails.
    fn delete(&self, key: &str) -> Result<(), StorageError>;
}

impl<T: SessionBackend + ?Sized> SessionBackend for Arc<T> {
    fn save(&self, key: &str, bytes: Vec<u8>) -> Result<(), StorageError> {
        (**self).save(key, bytes)
    }

    fn load(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        (**self).load(key)
    }

    fn delete(&self, key: &str) -> Result<(), StorageError> {
        (**self).delete(key)
    }
}

impl SessionBackend for Box<dyn SessionBackend> {
    fn save(&self, key: &str, bytes: Vec<u8>) -> Result<(), StorageError> {
        (**self).save(key, bytes)
    }

    fn load(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        (**self).load(key)
    }

    fn delete(&self, key: &str) -> Result<(), StorageError> {
        (**self).delete(key)
    }
}

/// Snapshot persistence for one browse view
///
/// Storage failures stop here. A failed write logs a warning and turns
/// persistence off for the rest of the session; reads that fail or do not
/// decode are reported as "no snapshot".
pub struct SessionStore<B> {
    backend: B,
    key: String,
    disabled: AtomicBool,
}

impl<B: SessionBackend> SessionStore<B> {
    #[must_use]
    pub fn new(backend: B, key: impl Into<String>) -> Self {
        Self {
            backend,
            key: key.into(),
            disabled: AtomicBool::new(false),
        }
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    #[must_use]
    pub const fn backend(&self) -> &B {
        &self.backend
    }

    /// Whether persistence is still active this session
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        !self.disabled.load(Ordering::Relaxed)
    }

    /// Persist `snapshot`, replacing the previous one
    pub fn save(&self, snapshot: &BrowseSnapshot) {
        if !self.is_enabled() {
            return;
        }

        let result = encode(snapshot).and_then(|bytes| self.backend.save(&self.key, bytes));
        match result {
            Ok(()) => log::debug!(
                "saved snapshot '{}' ({} items, page {})",
                self.key,
                snapshot.items.len(),
                snapshot.cursor.page_number()
            ),
            Err(e) => {
                log::warn!("Snapshot persistence disabled for this session: {e}");
                self.disabled.store(true, Ordering::Relaxed);
            }
        }
    }

    /// Stored snapshot, if one exists and decodes cleanly
    ///
    /// An entry that fails to decode is removed.
    #[must_use]
    pub fn restore(&self) -> Option<BrowseSnapshot> {
        if !self.is_enabled() {
            return None;
        }

        let bytes = match self.backend.load(&self.key) {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return None,
            Err(e) => {
                log::warn!("Could not read snapshot '{}': {e}", self.key);
                return None;
            }
        };

        match decode(&bytes) {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                log::warn!("Discarding unreadable snapshot '{}': {e}", self.key);
                self.invalidate();
                None
            }
        }
    }

    /// Remove the stored snapshot
    pub fn invalidate(&self) {
        match self.backend.delete(&self.key) {
            Ok(()) => log::debug!("invalidated snapshot '{}'", self.key),
            Err(e) => log::warn!("Could not delete snapshot '{}': {e}", self.key),
        }
    }
}
