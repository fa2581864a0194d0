//! Integration tests for larder browsing
//!
//! These tests drive a `BrowseController` against the scripted catalog and
//! real session backends, covering whole user journeys: searching, paging,
//! leaving the view and coming back, and responses that arrive late.

use larder::browse::{BrowseController, BrowseError, BrowseSettings, FilterState, LoadMode, LoadOutcome, SortKey};
use larder::catalog::{CatalogCall, CatalogError, CategoryRef, MockCatalog, ProductSummary};
use larder::session::{
    BrowseSnapshot, MemoryBackend, SessionBackend, SessionStore, SledBackend, StorageError, encode,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

const KEY: &str = "browse:home";

/// Controller over a fresh mock sharing `backend`
fn open_view<B: SessionBackend>(backend: B) -> (Arc<MockCatalog>, BrowseController<MockCatalog, B>) {
    let mock = Arc::new(MockCatalog::new());
    let browse = BrowseController::new(
        Arc::clone(&mock),
        SessionStore::new(backend, KEY),
        BrowseSettings::default(),
    )
    .unwrap();
    (mock, browse)
}

fn all_from(items: &[ProductSummary], label: &str) -> bool {
    let prefix = format!("{label}-");
    items.iter().all(|item| {
        item.code
            .strip_prefix(&prefix)
            .is_some_and(|rest| rest.split('-').count() == 2)
    })
}

async fn settle() {
    for _ in 0..4 {
        tokio::task::yield_now().await;
    }
}

#[tokio::test(flavor = "current_thread")]
async fn test_chocolate_then_chocolate_bar() {
    let (mock, browse) = open_view(MemoryBackend::default());
    browse.initialize(None).await;

    browse.set_search("chocolate").await;
    browse.load_more().await.unwrap();

    let view = browse.view();
    assert_eq!(view.items.len(), 48);
    assert_eq!(view.page_number, 2);
    assert!(view.has_more);

    // page 3 of "chocolate" is still on the wire when the search changes
    let page_three = mock.hold_next();
    let (stale, fresh) = tokio::join!(browse.load_more(), async {
        let outcome = browse.set_search("chocolate bar").await;
        page_three.release(24);
        outcome
    });

    assert_eq!(stale.unwrap(), LoadOutcome::Superseded);
    assert_eq!(fresh, LoadOutcome::Applied { page: 1, received: 24 });
    let view = browse.view();
    assert_eq!(view.items.len(), 24);
    assert!(all_from(&view.items, "chocolate bar"));
    assert_eq!(view.page_number, 1);
}

#[tokio::test(flavor = "current_thread")]
async fn test_stale_response_arriving_first_is_ignored() {
    let (mock, browse) = open_view(MemoryBackend::default());
    browse.initialize(Some(FilterState::default().with_search("chocolate"))).await;

    let old = mock.hold_next();
    let new = mock.hold_next();

    let (stale, fresh, ()) = tokio::join!(browse.load_more(), browse.set_search("chocolate bar"), async {
        old.release(24);
        settle().await;

        // old page has arrived, new one has not
        let view = browse.view();
        assert!(view.items.is_empty());
        assert!(view.loading);
        assert_eq!(view.filters.search_term(), "chocolate bar");

        new.release(7);
    });

    assert_eq!(stale.unwrap(), LoadOutcome::Superseded);
    assert_eq!(fresh, LoadOutcome::Applied { page: 1, received: 7 });
    let view = browse.view();
    assert!(all_from(&view.items, "chocolate bar"));
    assert!(!view.has_more);
}

#[tokio::test(flavor = "current_thread")]
async fn test_second_load_is_busy_and_changes_nothing() {
    let (mock, browse) = open_view(MemoryBackend::default());
    browse.initialize(None).await;
    let held = mock.hold_next();

    let (first, ()) = tokio::join!(browse.load(2, LoadMode::Append), async {
        let before = browse.view();
        assert!(matches!(browse.load(2, LoadMode::Append).await, Err(BrowseError::Busy)));
        assert_eq!(browse.view(), before);
        held.release(24);
    });

    assert!(matches!(first, Ok(LoadOutcome::Applied { page: 2, .. })));
    assert_eq!(mock.listing_calls().len(), 2);
}

#[tokio::test(flavor = "current_thread")]
async fn test_has_more_follows_page_size() {
    let (mock, browse) = open_view(MemoryBackend::default());
    mock.push_page(24).push_page(10);

    browse.initialize(None).await;
    assert!(browse.view().has_more);

    browse.load_more().await.unwrap();
    let view = browse.view();
    assert!(!view.has_more);
    assert_eq!(view.items.len(), 34);
}

#[tokio::test(flavor = "current_thread")]
async fn test_exact_multiple_shows_one_empty_page() {
    let (mock, browse) = open_view(MemoryBackend::default());
    mock.push_page(24).push_page(0);

    browse.initialize(None).await;
    assert!(browse.view().has_more);

    assert_eq!(
        browse.load_more().await.unwrap(),
        LoadOutcome::Applied { page: 2, received: 0 }
    );
    assert!(!browse.view().has_more);
    assert_eq!(browse.view().items.len(), 24);
}

#[tokio::test(flavor = "current_thread")]
async fn test_resume_after_leaving_view() {
    let backend = MemoryBackend::default();

    let (_, first_visit) = open_view(backend.clone());
    first_visit.initialize(Some(FilterState::default().with_search("milk"))).await;
    first_visit.load_more().await.unwrap();
    let left_at = first_visit.snapshot();
    drop(first_visit);

    let (mock, second_visit) = open_view(backend);
    let outcome = second_visit.initialize(None).await;

    assert_eq!(outcome, LoadOutcome::Restored { items: 48 });
    assert!(mock.calls().is_empty());
    assert_eq!(second_visit.snapshot(), left_at);
    assert_eq!(second_visit.cursor().page_number(), 2);

    // paging continues from where it stopped
    second_visit.load_more().await.unwrap();
    assert_eq!(
        mock.listing_calls(),
        vec![CatalogCall::ByName { term: "milk".into(), page: 3, page_size: 24 }]
    );
}

#[tokio::test(flavor = "current_thread")]
async fn test_resume_from_sled_store() {
    let dir = tempfile::tempdir().unwrap();
    let backend = Arc::new(SledBackend::open(dir.path().join("session")).unwrap());

    let (_, first_visit) = open_view(Arc::clone(&backend));
    first_visit
        .initialize(Some(FilterState::default().with_sort(SortKey::GradeAsc)))
        .await;
    let left_at = first_visit.snapshot();
    drop(first_visit);
    backend.flush().unwrap();

    let (mock, second_visit) = open_view(Arc::clone(&backend));
    assert_eq!(second_visit.initialize(None).await, LoadOutcome::Restored { items: 24 });
    assert!(mock.calls().is_empty());
    assert_eq!(second_visit.snapshot(), left_at);
    assert_eq!(backend.count(), 1);
}

#[tokio::test(flavor = "current_thread")]
async fn test_detail_and_back_resumes_list() {
    let backend: Arc<dyn SessionBackend> = Arc::new(MemoryBackend::default());

    let (mock, list) = open_view(Arc::clone(&backend));
    list.initialize(Some(FilterState::default().with_search("milk").with_sort(SortKey::NameDesc)))
        .await;
    list.load_more().await.unwrap();
    let left_at = list.snapshot();

    let picked = list.view().items[5].clone();
    mock.add_product(picked.clone());
    assert_eq!(list.lookup_barcode(&picked.code).await.unwrap(), picked);
    drop(list);

    let (mock, list) = open_view(Arc::clone(&backend));
    assert_eq!(list.initialize(None).await, LoadOutcome::Restored { items: 48 });
    assert!(mock.calls().is_empty());
    assert_eq!(list.snapshot(), left_at);
    assert_eq!(list.filters().sort_key(), SortKey::NameDesc);
}

#[tokio::test(flavor = "current_thread")]
async fn test_clear_then_enter_never_restores_old_search() {
    let backend = MemoryBackend::default();

    let (first_mock, first_visit) = open_view(backend.clone());
    first_visit.initialize(Some(FilterState::default().with_search("milk"))).await;
    first_visit.load_more().await.unwrap();
    first_mock.clear_calls();
    first_visit.clear_filters().await;
    drop(first_visit);

    let (second_mock, second_visit) = open_view(backend);
    second_visit.initialize(None).await;

    let mut generic = first_mock.listing_calls();
    generic.extend(second_mock.listing_calls());
    assert_eq!(generic, vec![CatalogCall::Generic { page: 1, page_size: 24 }]);
    let view = second_visit.view();
    assert!(view.filters.is_cleared());
    assert!(all_from(&view.items, "all"));
}

#[tokio::test(flavor = "current_thread")]
async fn test_clear_on_default_filters_forces_fresh_load() {
    let backend = MemoryBackend::default();

    let (_, first_visit) = open_view(backend.clone());
    first_visit.initialize(None).await;
    assert_eq!(first_visit.clear_filters().await, LoadOutcome::Unchanged);
    drop(first_visit);

    let (mock, second_visit) = open_view(backend);
    assert!(matches!(second_visit.initialize(None).await, LoadOutcome::Applied { .. }));
    assert_eq!(mock.listing_calls(), vec![CatalogCall::Generic { page: 1, page_size: 24 }]);
}

#[tokio::test(flavor = "current_thread")]
async fn test_navigation_override_replaces_stored_session() {
    let backend = MemoryBackend::default();

    let (_, first_visit) = open_view(backend.clone());
    first_visit.initialize(Some(FilterState::default().with_search("milk"))).await;
    drop(first_visit);

    let snacks = CategoryRef::new("en:snacks", "Snacks", 1204);
    let (mock, second_visit) = open_view(backend.clone());
    second_visit
        .initialize(Some(FilterState::default().with_category(Some(snacks))))
        .await;

    assert_eq!(
        mock.listing_calls(),
        vec![CatalogCall::ByCategory { category_id: "en:snacks".into(), page: 1, page_size: 24 }]
    );
    let stored = SessionStore::new(backend, KEY).restore().unwrap();
    assert_eq!(stored.filters.category().map(|c| c.id.as_str()), Some("en:snacks"));
    assert_eq!(stored.filters.search_term(), "");
}

#[tokio::test(flavor = "current_thread")]
async fn test_search_wins_over_category() {
    let (mock, browse) = open_view(MemoryBackend::default());
    let filters = FilterState::default()
        .with_search("  granola ")
        .with_category(Some(CategoryRef::new("en:cereals", "Cereals", 10)));

    browse.initialize(Some(filters)).await;
    browse.set_search("   ").await;

    assert_eq!(
        mock.listing_calls(),
        vec![
            CatalogCall::ByName { term: "granola".into(), page: 1, page_size: 24 },
            CatalogCall::ByCategory { category_id: "en:cereals".into(), page: 1, page_size: 24 },
        ]
    );
}

#[tokio::test(flavor = "current_thread")]
async fn test_corrupt_snapshot_fails_closed() {
    let backend = MemoryBackend::default();
    backend.save(KEY, b"{\"version\":1,\"snapshot\":[]}".to_vec()).unwrap();

    let (mock, browse) = open_view(backend.clone());
    assert!(matches!(browse.initialize(None).await, LoadOutcome::Applied { .. }));
    assert_eq!(mock.listing_calls().len(), 1);

    let stored = SessionStore::new(backend, KEY).restore();
    assert_eq!(stored, Some(browse.snapshot()));
}

#[tokio::test(flavor = "current_thread")]
async fn test_snapshot_from_other_version_fails_closed() {
    let backend = MemoryBackend::default();
    let snapshot = BrowseSnapshot {
        filters: FilterState::default().with_search("milk"),
        cursor: larder::browse::PaginationCursor::new(24),
        items: Vec::new(),
    };
    let mut value: serde_json::Value = serde_json::from_slice(&encode(&snapshot).unwrap()).unwrap();
    value["version"] = serde_json::Value::from(99);
    backend.save(KEY, serde_json::to_vec(&value).unwrap()).unwrap();

    let (mock, browse) = open_view(backend);
    browse.initialize(None).await;

    assert!(browse.filters().is_cleared());
    assert_eq!(mock.listing_calls(), vec![CatalogCall::Generic { page: 1, page_size: 24 }]);
}

#[tokio::test(flavor = "current_thread")]
async fn test_failed_page_keeps_items_until_retry() {
    let (mock, browse) = open_view(MemoryBackend::default());
    browse.initialize(None).await;
    mock.push_failure(CatalogError::Status { status: 503, context: "Fetch products".into() });

    let outcome = browse.load_more().await.unwrap();
    assert!(matches!(outcome, LoadOutcome::Failed(_)));
    let view = browse.view();
    assert_eq!(view.items.len(), 24);
    assert!(!view.has_more);
    assert!(view.error.is_some());

    assert_eq!(
        browse.retry().await.unwrap(),
        LoadOutcome::Applied { page: 2, received: 24 }
    );
    let view = browse.view();
    assert_eq!(view.items.len(), 48);
    assert!(view.error.is_none());
}

#[tokio::test(flavor = "current_thread")]
async fn test_barcode_not_found_changes_nothing() {
    let backend = MemoryBackend::default();
    let (mock, browse) = open_view(backend.clone());
    browse.initialize(Some(FilterState::default().with_search("tea"))).await;
    let view = browse.view();
    let stored = SessionStore::new(backend.clone(), KEY).restore();

    let result = browse.lookup_barcode("4006381333931").await;

    assert!(matches!(result, Err(BrowseError::NotFound(code)) if code == "4006381333931"));
    assert_eq!(browse.view(), view);
    assert_eq!(SessionStore::new(backend, KEY).restore(), stored);
    assert_eq!(mock.listing_calls().len(), 1);
}

#[tokio::test(flavor = "current_thread")]
async fn test_categories_for_picker() {
    let (mock, browse) = open_view(MemoryBackend::default());
    mock.set_categories(vec![
        CategoryRef::new("en:snacks", "Snacks", 1204),
        CategoryRef::new("en:beverages", "Beverages", 980),
    ]);

    let categories = browse.categories().await;

    assert_eq!(categories.len(), 2);
    assert_eq!(categories[0].label(), "Snacks (1204)");
}

/// Backend that accepts nothing, like storage over quota
#[derive(Default)]
struct FullDisk {
    writes: AtomicUsize,
}

impl SessionBackend for FullDisk {
    fn save(&self, _key: &str, _bytes: Vec<u8>) -> Result<(), StorageError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        Err(StorageError::WriteRejected("disk full".into()))
    }

    fn load(&self, _key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        Ok(None)
    }

    fn delete(&self, _key: &str) -> Result<(), StorageError> {
        Ok(())
    }
}

#[tokio::test(flavor = "current_thread")]
async fn test_browsing_survives_storage_failure() {
    let (_, browse) = open_view(FullDisk::default());

    browse.initialize(None).await;
    browse.set_search("rice").await;
    browse.load_more().await.unwrap();

    assert_eq!(browse.view().items.len(), 48);
    assert!(!browse.session().is_enabled());
    assert_eq!(browse.session().backend().writes.load(Ordering::SeqCst), 1);
}
