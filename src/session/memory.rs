//! In-memory session backend
//!
//! Entries live in a `moka` cache for the life of the process. An entry not
//! touched for the idle period expires, which ends that view's session.

use super::{SessionBackend, StorageError};
use moka::sync::Cache;
use std::time::Duration;

const DEFAULT_IDLE: Duration = Duration::from_secs(30 * 60);
const DEFAULT_CAPACITY: u64 = 64;

/// Process-memory backend with idle expiry
#[derive(Clone)]
pub struct MemoryBackend {
    cache: Cache<String, Vec<u8>>,
}

impl MemoryBackend {
    /// Backend whose entries expire after `idle` without access
    #[must_use]
    pub fn with_idle(idle: Duration) -> Self {
        let cache = Cache::builder()
            .time_to_idle(idle)
            .max_capacity(DEFAULT_CAPACITY)
            .build();
        Self { cache }
    }

    /// Number of stored entries
    #[must_use]
    pub fn len(&self) -> u64 {
        self.cache.run_pending_tasks();
        self.cache.entry_count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::with_idle(DEFAULT_IDLE)
    }
}

impl SessionBackend for MemoryBackend {
    fn save(&self, key: &str, bytes: Vec<u8>) -> Result<(), StorageError> {
        self.cache.insert(key.to_string(), bytes);
        Ok(())
    }

    fn load(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        Ok(self.cache.get(key))
    }

    fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.cache.invalidate(key);
        Ok(())
    }
}
