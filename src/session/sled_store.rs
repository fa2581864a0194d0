//! Sled session backend
//!
//! Snapshots go into a dedicated `snapshots` tree. [`SledBackend::temporary`]
//! opens a sled database that is removed when the process exits, which gives
//! exactly session lifetime; [`SledBackend::open`] keeps it at a path.

use super::{SessionBackend, StorageError};
use sled::{Db, Tree};
use std::path::Path;

const SNAPSHOT_TREE: &str = "snapshots";

/// Sled-backed session storage
pub struct SledBackend {
    db: Db,
    snapshots: Tree,
}

impl SledBackend {
    /// Open or create a database at `path`
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the database or its tree cannot be opened.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let db = sled::open(path)?;
        Self::from_db(db)
    }

    /// Database deleted when the process exits
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the temporary database cannot be created.
    pub fn temporary() -> Result<Self, StorageError> {
        let db = sled::Config::new().temporary(true).open()?;
        Self::from_db(db)
    }

    fn from_db(db: Db) -> Result<Self, StorageError> {
        let snapshots = db.open_tree(SNAPSHOT_TREE)?;
        Ok(Self { db, snapshots })
    }

    /// Number of stored snapshots
    #[must_use]
    pub fn count(&self) -> usize {
        self.snapshots.len()
    }

    /// Flush pending writes to disk
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the flush fails.
    pub fn flush(&self) -> Result<(), StorageError> {
        self.db.flush()?;
        Ok(())
    }
}

impl SessionBackend for SledBackend {
    fn save(&self, key: &str, bytes: Vec<u8>) -> Result<(), StorageError> {
        self.snapshots.insert(key.as_bytes(), bytes)?;
        Ok(())
    }

    fn load(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        Ok(self.snapshots.get(key.as_bytes())?.map(|v| v.to_vec()))
    }

    fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.snapshots.remove(key.as_bytes())?;
        Ok(())
    }
}
