//! Testing utilities for larder
//!
//! Helpers for building snapshots, controllers over the scripted catalog,
//! and a session backend that refuses every write.
//!
//! Only available when compiled with `cfg(test)`.

use crate::browse::{BrowseController, BrowseSettings, DEFAULT_PAGE_SIZE, FilterState, PaginationCursor};
use crate::catalog::{CatalogCall, MockCatalog};
use crate::session::{BrowseSnapshot, MemoryBackend, SessionBackend, SessionStore, StorageError};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Snapshot of a name search after `page` pages, holding `item_count` items
///
/// Items are what [`MockCatalog`] generates for the search, so a snapshot
/// and a live load of the same pages agree. `has_more` is on unless the
/// last page came back short.
///
/// # Panics
/// Panics if `item_count` does not fit in `page` pages.
#[must_use]
pub fn sample_snapshot(term: &str, page: u32, item_count: usize) -> BrowseSnapshot {
    let page_size = DEFAULT_PAGE_SIZE;
    assert!(page >= 1, "snapshots start at page 1");
    assert!(item_count <= page as usize * page_size, "too many items for {page} page(s)");

    let mut items = Vec::with_capacity(item_count);
    for current in 1..=page {
        let remaining = item_count - items.len();
        let call = CatalogCall::ByName {
            term: term.to_string(),
            page: current,
            page_size,
        };
        items.extend(MockCatalog::generated_items(&call, remaining.min(page_size)));
    }

    let last_page = item_count.saturating_sub((page as usize - 1) * page_size);
    BrowseSnapshot {
        filters: FilterState::default().with_search(term),
        cursor: PaginationCursor::new(page_size).after_page(page, last_page),
        items,
    }
}

/// Controller over a fresh mock catalog and in-memory session
#[must_use]
pub fn controller() -> (Arc<MockCatalog>, BrowseController<MockCatalog, MemoryBackend>) {
    controller_on(MemoryBackend::default(), "test")
}

/// Controller over a fresh mock catalog sharing `backend`
///
/// Building two controllers on clones of one backend models leaving the
/// view and coming back to it.
///
/// # Panics
/// Panics if the default settings are rejected.
#[must_use]
pub fn controller_on(
    backend: MemoryBackend,
    key: &str,
) -> (Arc<MockCatalog>, BrowseController<MockCatalog, MemoryBackend>) {
    let mock = Arc::new(MockCatalog::new());
    let browse = BrowseController::new(
        Arc::clone(&mock),
        SessionStore::new(backend, key),
        BrowseSettings::default(),
    )
    .expect("default settings are valid");
    (mock, browse)
}

/// Session backend whose writes always fail
#[derive(Debug, Default)]
pub struct FailingBackend {
    attempts: AtomicUsize,
}

impl FailingBackend {
    /// Number of writes attempted
    #[must_use]
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl SessionBackend for FailingBackend {
    fn save(&self, _key: &str, _bytes: Vec<u8>) -> Result<(), StorageError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(StorageError::WriteRejected("quota exceeded".into()))
    }

    fn load(&self, _key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        Ok(None)
    }

    fn delete(&self, _key: &str) -> Result<(), StorageError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_snapshot_is_valid() {
        let snapshot = sample_snapshot("milk", 2, 30);

        assert!(snapshot.validate().is_ok());
        assert_eq!(snapshot.items.len(), 30);
        assert_eq!(snapshot.items[24].code, "milk-2-0");
        assert_eq!(snapshot.cursor.page_number(), 2);
        assert!(!snapshot.cursor.has_more());
    }

    #[test]
    fn test_full_pages_keep_has_more() {
        let snapshot = sample_snapshot("tea", 2, 48);
        assert!(snapshot.cursor.has_more());
    }

    #[test]
    fn test_failing_backend_counts_writes() {
        let backend = FailingBackend::default();
        assert!(backend.save("k", Vec::new()).is_err());
        assert!(backend.save("k", Vec::new()).is_err());
        assert_eq!(backend.attempts(), 2);
    }
}
