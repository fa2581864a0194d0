//! Browse controller
//!
//! The controller is what a front end talks to. It owns the filter state,
//! the pagination cursor and the loaded items, and it is the only thing that
//! mutates them.
//!
//! # Workflow
//!
//! ```text
//! initialize(override)
//!     ├─ snapshot matches ─► adopt filters, cursor, items (no request)
//!     └─ otherwise ────────► drop snapshot, load page 1 (Replace)
//!
//! set_search / set_category / set_sort / clear_filters
//!     └─ new epoch ─► cursor to page 1, items cleared ─► load page 1 (Replace)
//!
//! load_more
//!     ├─ in flight ─► Err(Busy)
//!     ├─ !has_more ─► Exhausted
//!     └─ load next page (Append)
//!
//! every applied page ─► snapshot saved
//! ```
//!
//! Methods take `&self`; state sits behind a mutex that is never held across
//! an await, so a filter change can run while an older page request is still
//! outstanding. The older response is then discarded by the coordinator.

use super::coordinator::{self, LoadCoordinator, LoadError, LoadMode, LoadTicket, LoadedPage};
use super::cursor::{DEFAULT_PAGE_SIZE, PaginationCursor};
use super::error::BrowseError;
use super::filter::{FilterState, SortKey};
use super::sort;
use crate::catalog::{BarcodeLookup, CatalogClient, CatalogError, CategoryRef, ProductSummary};
use crate::lock;
use crate::session::{BrowseSnapshot, SessionBackend, SessionStore};
use std::sync::{Arc, Mutex, MutexGuard};

/// Callback invoked with the new view after every state change
///
/// Observers run outside the controller's state lock and may read the
/// controller, but must not call [`BrowseController::subscribe`].
pub type Observer = Box<dyn Fn(&BrowseView) + Send + Sync>;

/// Controller tuning
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BrowseSettings {
    /// Items per page; also the `has_more` threshold
    pub page_size: usize,
    /// Categories requested from the directory
    pub category_fetch_size: usize,
    /// Categories kept for the picker
    pub category_limit: usize,
}

impl Default for BrowseSettings {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            category_fetch_size: 200,
            category_limit: 50,
        }
    }
}

/// What a front end renders
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowseView {
    pub filters: FilterState,
    /// Loaded items sorted by the current sort key
    pub items: Vec<ProductSummary>,
    pub loading: bool,
    pub has_more: bool,
    pub page_number: u32,
    /// Last load failure, cleared by the next successful load
    pub error: Option<CatalogError>,
}

/// Result of an operation that may load a page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// A page was applied
    Applied { page: u32, received: usize },
    /// A stored snapshot was adopted without any request
    Restored { items: usize },
    /// The response arrived for filters that were already replaced
    Superseded,
    /// The request failed; loaded items are kept and `has_more` is off
    Failed(CatalogError),
    /// The filters did not change
    Unchanged,
    /// `has_more` is off; nothing was requested
    Exhausted,
    /// Nothing to retry
    Idle,
}

struct BrowseState {
    coordinator: LoadCoordinator,
    cursor: PaginationCursor,
    items: Vec<ProductSummary>,
    error: Option<CatalogError>,
    /// Page and mode of the last failed request
    failed: Option<(u32, LoadMode)>,
}

impl BrowseState {
    fn filters(&self) -> &FilterState {
        self.coordinator.current_filters()
    }

    /// New epoch for `filters`: page 1, nothing loaded
    fn reset_for(&mut self, filters: FilterState) {
        self.coordinator.supersede(filters);
        self.cursor = self.cursor.reset();
        self.items.clear();
        self.error = None;
        self.failed = None;
    }

    fn snapshot(&self) -> BrowseSnapshot {
        BrowseSnapshot {
            filters: self.filters().clone(),
            cursor: self.cursor,
            items: self.items.clone(),
        }
    }

    fn view(&self) -> BrowseView {
        BrowseView {
            filters: self.filters().clone(),
            items: sort::sort(&self.items, self.filters().sort_key()),
            loading: self.coordinator.is_loading(),
            has_more: self.cursor.has_more(),
            page_number: self.cursor.page_number(),
            error: self.error.clone(),
        }
    }

    fn apply(&mut self, page: LoadedPage) -> LoadOutcome {
        let LoadedPage { ticket, items, .. } = page;
        let received = items.len();

        match ticket.mode() {
            LoadMode::Replace => self.items = items,
            LoadMode::Append => {
                if ticket.page() != self.cursor.next_page() {
                    log::warn!(
                        "dropping page {} (expected page {})",
                        ticket.page(),
                        self.cursor.next_page()
                    );
                    return LoadOutcome::Superseded;
                }
                self.items.extend(items);
            }
        }

        self.cursor = self.cursor.after_page(ticket.page(), received);
        self.error = None;
        self.failed = None;
        LoadOutcome::Applied {
            page: ticket.page(),
            received,
        }
    }

    fn fail(&mut self, ticket: &LoadTicket, err: CatalogError) {
        log::warn!("Loading page {} failed: {err}", ticket.page());
        self.cursor = self.cursor.exhausted();
        self.error = Some(err);
        self.failed = Some((ticket.page(), ticket.mode()));
    }
}

/// Filter, paginate and resume a product listing
pub struct BrowseController<C: ?Sized, B> {
    client: Arc<C>,
    session: SessionStore<B>,
    settings: BrowseSettings,
    state: Mutex<BrowseState>,
    observers: Mutex<Vec<Observer>>,
}

impl<C, B> BrowseController<C, B>
where
    C: CatalogClient + ?Sized,
    B: SessionBackend,
{
    /// Create a controller with default filters and nothing loaded
    ///
    /// Call [`initialize`](Self::initialize) before use.
    ///
    /// # Errors
    ///
    /// Returns `BrowseError::InvalidInput` if `settings.page_size` is zero.
    pub fn new(client: Arc<C>, session: SessionStore<B>, settings: BrowseSettings) -> Result<Self, BrowseError> {
        if settings.page_size == 0 {
            return Err(BrowseError::InvalidInput("page size must be at least 1".into()));
        }

        let state = BrowseState {
            coordinator: LoadCoordinator::new(FilterState::default(), settings.page_size),
            cursor: PaginationCursor::new(settings.page_size),
            items: Vec::new(),
            error: None,
            failed: None,
        };

        Ok(Self {
            client,
            session,
            settings,
            state: Mutex::new(state),
            observers: Mutex::new(Vec::new()),
        })
    }

    #[must_use]
    pub const fn settings(&self) -> &BrowseSettings {
        &self.settings
    }

    #[must_use]
    pub const fn session(&self) -> &SessionStore<B> {
        &self.session
    }

    fn state(&self) -> MutexGuard<'_, BrowseState> {
        lock(&self.state)
    }

    /// Register a callback for state changes
    pub fn subscribe(&self, observer: Observer) {
        lock(&self.observers).push(observer);
    }

    fn notify(&self) {
        let observers = lock(&self.observers);
        if observers.is_empty() {
            return;
        }
        let view = self.view();
        for observer in observers.iter() {
            observer(&view);
        }
    }

    /// Current view with items sorted
    #[must_use]
    pub fn view(&self) -> BrowseView {
        self.state().view()
    }

    #[must_use]
    pub fn filters(&self) -> FilterState {
        self.state().filters().clone()
    }

    #[must_use]
    pub fn cursor(&self) -> PaginationCursor {
        self.state().cursor
    }

    /// Current state in arrival order, as it would be persisted
    #[must_use]
    pub fn snapshot(&self) -> BrowseSnapshot {
        self.state().snapshot()
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.state().coordinator.is_loading()
    }

    /// Enter the view
    ///
    /// With no override, a stored snapshot is adopted as-is and nothing is
    /// requested. An override that differs from the stored filters, or a
    /// snapshot taken with another page size, discards the snapshot. Without
    /// a usable snapshot page 1 is loaded for the override (or the default
    /// filters).
    pub async fn initialize(&self, override_filters: Option<FilterState>) -> LoadOutcome {
        if let Some(snapshot) = self.session.restore() {
            if self.reconciles(&snapshot, override_filters.as_ref()) {
                let restored = snapshot.items.len();
                {
                    let mut st = self.state();
                    st.reset_for(snapshot.filters);
                    st.cursor = snapshot.cursor;
                    st.items = snapshot.items;
                }
                log::debug!("restored {restored} items from session snapshot");
                self.notify();
                return LoadOutcome::Restored { items: restored };
            }

            log::debug!("session snapshot does not match requested filters, discarding");
            self.session.invalidate();
        }

        let filters = override_filters.unwrap_or_default();
        let ticket = {
            let mut st = self.state();
            st.reset_for(filters.clone());
            st.coordinator.begin(&filters, 1, LoadMode::Replace)
        };
        self.launch(ticket).await
    }

    fn reconciles(&self, snapshot: &BrowseSnapshot, requested: Option<&FilterState>) -> bool {
        snapshot.cursor.page_size() == self.settings.page_size
            && requested.is_none_or(|filters| *filters == snapshot.filters)
    }

    /// Replace the search term
    pub async fn set_search(&self, term: impl Into<String>) -> LoadOutcome {
        let term = term.into();
        self.change_filters(move |f| f.with_search(term)).await
    }

    /// Replace or remove the category
    pub async fn set_category(&self, category: Option<CategoryRef>) -> LoadOutcome {
        self.change_filters(move |f| f.with_category(category)).await
    }

    /// Replace the sort key
    pub async fn set_sort(&self, key: SortKey) -> LoadOutcome {
        self.change_filters(move |f| f.with_sort(key)).await
    }

    /// Reset all filters and delete the stored snapshot
    pub async fn clear_filters(&self) -> LoadOutcome {
        self.session.invalidate();
        self.change_filters(|_| FilterState::default()).await
    }

    async fn change_filters<F>(&self, change: F) -> LoadOutcome
    where
        F: FnOnce(&FilterState) -> FilterState,
    {
        let ticket = {
            let mut st = self.state();
            let next = change(st.filters());
            if next == *st.filters() {
                return LoadOutcome::Unchanged;
            }
            st.reset_for(next.clone());
            st.coordinator.begin(&next, 1, LoadMode::Replace)
        };
        self.launch(ticket).await
    }

    /// Load the next page and append it
    ///
    /// # Errors
    ///
    /// Returns `BrowseError::Busy` if a load is in flight.
    pub async fn load_more(&self) -> Result<LoadOutcome, BrowseError> {
        let (filters, page) = {
            let st = self.state();
            if st.coordinator.is_loading() {
                return Err(BrowseError::Busy);
            }
            if !st.cursor.has_more() {
                return Ok(LoadOutcome::Exhausted);
            }
            (st.filters().clone(), st.cursor.next_page())
        };
        self.issue(&filters, page, LoadMode::Append).await
    }

    /// Re-issue the last failed request
    ///
    /// # Errors
    ///
    /// Returns `BrowseError::Busy` if a load is in flight.
    pub async fn retry(&self) -> Result<LoadOutcome, BrowseError> {
        let (filters, (page, mode)) = {
            let st = self.state();
            if st.coordinator.is_loading() {
                return Err(BrowseError::Busy);
            }
            match st.failed {
                Some(failed) => (st.filters().clone(), failed),
                None => return Ok(LoadOutcome::Idle),
            }
        };
        self.issue(&filters, page, mode).await
    }

    /// Load `page` of the current filters
    ///
    /// Prefer [`load_more`](Self::load_more); this is the raw single-flight
    /// entry point.
    ///
    /// # Errors
    ///
    /// Returns `BrowseError::InvalidInput` for page 0 and `BrowseError::Busy`
    /// if a load is in flight.
    pub async fn load(&self, page: u32, mode: LoadMode) -> Result<LoadOutcome, BrowseError> {
        if page == 0 {
            return Err(BrowseError::InvalidInput("pages start at 1".into()));
        }
        let filters = self.filters();
        self.issue(&filters, page, mode).await
    }

    async fn issue(&self, filters: &FilterState, page: u32, mode: LoadMode) -> Result<LoadOutcome, BrowseError> {
        let ticket = self.state().coordinator.begin(filters, page, mode);
        match ticket {
            Err(LoadError::Busy) => Err(BrowseError::Busy),
            other => Ok(self.launch(other).await),
        }
    }

    async fn launch(&self, ticket: Result<LoadTicket, LoadError>) -> LoadOutcome {
        match ticket {
            Ok(ticket) => {
                self.notify();
                self.run(ticket).await
            }
            Err(e) => {
                log::debug!("load not started: {e}");
                LoadOutcome::Superseded
            }
        }
    }

    async fn run(&self, ticket: LoadTicket) -> LoadOutcome {
        let result = coordinator::fetch(self.client.as_ref(), &ticket).await;

        let outcome = {
            let mut st = self.state();
            match st.coordinator.complete(&ticket, result) {
                Ok(page) => {
                    let outcome = st.apply(page);
                    if matches!(outcome, LoadOutcome::Applied { .. }) {
                        self.session.save(&st.snapshot());
                    }
                    outcome
                }
                Err(LoadError::Transport(err)) => {
                    st.fail(&ticket, err.clone());
                    LoadOutcome::Failed(err)
                }
                Err(LoadError::Superseded | LoadError::Busy) => return LoadOutcome::Superseded,
            }
        };

        self.notify();
        outcome
    }

    /// Category directory for the picker
    ///
    /// Failures are logged and yield an empty list.
    pub async fn categories(&self) -> Vec<CategoryRef> {
        match self
            .client
            .fetch_categories(1, self.settings.category_fetch_size)
            .await
        {
            Ok(page) => page
                .tags
                .into_iter()
                .take(self.settings.category_limit)
                .collect(),
            Err(e) => {
                log::warn!("Could not load categories: {e}");
                Vec::new()
            }
        }
    }

    /// Look a product up by barcode
    ///
    /// Browse state is never touched and the lookup does not take part in
    /// single-flight.
    ///
    /// # Errors
    ///
    /// `InvalidInput` for an empty code, `NotFound` when the catalog has no
    /// such product, `Transport` when the request fails.
    pub async fn lookup_barcode(&self, code: &str) -> Result<ProductSummary, BrowseError> {
        let code = code.trim();
        if code.is_empty() {
            return Err(BrowseError::InvalidInput("barcode is empty".into()));
        }

        match self.client.lookup_by_barcode(code).await? {
            BarcodeLookup {
                found: true,
                item: Some(item),
            } => Ok(item),
            _ => Err(BrowseError::NotFound(code.to_string())),
        }
    }
}
