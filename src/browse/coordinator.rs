//! Single-flight load coordination
//!
//! The coordinator is the bookkeeping half of a page load. It hands out a
//! [`LoadTicket`] for every request, refuses a second ticket while one is
//! outstanding, and on completion decides whether the response may be
//! applied at all.
//!
//! # Epochs
//!
//! Every filter change starts a new epoch. A ticket remembers the epoch and
//! the filters it was issued under; when its response arrives under a later
//! epoch the response is dropped without being merged or cached. Starting a
//! new epoch also frees the single-flight slot, so the new filters can load
//! immediately while the old request is left to finish unobserved.
//!
//! ```text
//! begin ──► fetch (await) ──► complete
//!   │                            ├─ current epoch ─► LoadedPage / Transport
//!   └─ slot taken ─► Busy        └─ stale epoch ───► Superseded
//! ```

use super::filter::{CatalogQuery, FilterState};
use crate::catalog::{self, CatalogClient, CatalogError, CatalogPage, ProductSummary};
use thiserror::Error;

/// How a settled page combines with what is already loaded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadMode {
    /// Page 1 of new filters; replaces the loaded items
    Replace,
    /// Next page of the same filters; appended in arrival order
    Append,
}

/// Why a load produced nothing to apply
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    /// Another load of the same epoch is still outstanding
    #[error("A load is already in flight")]
    Busy,

    /// The filters changed while the request was outstanding
    #[error("Response belongs to superseded filters")]
    Superseded,

    /// The catalog request failed
    #[error(transparent)]
    Transport(#[from] CatalogError),
}

/// A request issued by the coordinator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTicket {
    epoch: u64,
    filters: FilterState,
    page: u32,
    page_size: usize,
    mode: LoadMode,
}

impl LoadTicket {
    #[must_use]
    pub const fn epoch(&self) -> u64 {
        self.epoch
    }

    #[must_use]
    pub const fn filters(&self) -> &FilterState {
        &self.filters
    }

    #[must_use]
    pub const fn page(&self) -> u32 {
        self.page
    }

    #[must_use]
    pub const fn page_size(&self) -> usize {
        self.page_size
    }

    #[must_use]
    pub const fn mode(&self) -> LoadMode {
        self.mode
    }
}

/// A response that is still current
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedPage {
    pub ticket: LoadTicket,
    /// Items in API order, unsorted
    pub items: Vec<ProductSummary>,
    /// `items.len() == page_size`
    pub has_more: bool,
}

/// Epoch and single-flight bookkeeping
#[derive(Debug, Clone)]
pub struct LoadCoordinator {
    epoch: u64,
    current: FilterState,
    page_size: usize,
    in_flight: Option<LoadTicket>,
}

impl LoadCoordinator {
    #[must_use]
    pub fn new(filters: FilterState, page_size: usize) -> Self {
        Self {
            epoch: 0,
            current: filters,
            page_size,
            in_flight: None,
        }
    }

    #[must_use]
    pub const fn epoch(&self) -> u64 {
        self.epoch
    }

    #[must_use]
    pub const fn current_filters(&self) -> &FilterState {
        &self.current
    }

    #[must_use]
    pub const fn page_size(&self) -> usize {
        self.page_size
    }

    /// Whether a load of the current epoch is outstanding
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }

    #[must_use]
    pub const fn in_flight(&self) -> Option<&LoadTicket> {
        self.in_flight.as_ref()
    }

    /// Start a new epoch for `filters`
    ///
    /// Any outstanding request becomes stale and its slot is released.
    pub fn supersede(&mut self, filters: FilterState) -> u64 {
        self.epoch += 1;
        self.current = filters;
        if let Some(stale) = self.in_flight.take() {
            log::debug!(
                "epoch {} supersedes in-flight page {} of epoch {}",
                self.epoch,
                stale.page,
                stale.epoch
            );
        }
        self.epoch
    }

    /// Claim the single-flight slot for `page` of `filters`
    ///
    /// # Errors
    ///
    /// `Busy` if a request of this epoch is outstanding, `Superseded` if
    /// `filters` are no longer the current ones.
    pub fn begin(&mut self, filters: &FilterState, page: u32, mode: LoadMode) -> Result<LoadTicket, LoadError> {
        if self.in_flight.is_some() {
            return Err(LoadError::Busy);
        }
        if *filters != self.current {
            return Err(LoadError::Superseded);
        }

        let ticket = LoadTicket {
            epoch: self.epoch,
            filters: filters.clone(),
            page,
            page_size: self.page_size,
            mode,
        };
        self.in_flight = Some(ticket.clone());
        Ok(ticket)
    }

    /// Whether `ticket` still matches the current epoch and filters
    #[must_use]
    pub fn is_current(&self, ticket: &LoadTicket) -> bool {
        ticket.epoch == self.epoch && ticket.filters == self.current
    }

    /// Settle `ticket` with the catalog's answer
    ///
    /// # Errors
    ///
    /// `Superseded` if the ticket is stale (the slot is left alone, it belongs
    /// to a newer request), `Transport` if the request failed.
    pub fn complete(
        &mut self,
        ticket: &LoadTicket,
        result: catalog::Result<CatalogPage>,
    ) -> Result<LoadedPage, LoadError> {
        if !self.is_current(ticket) || self.in_flight.as_ref() != Some(ticket) {
            log::debug!(
                "discarding page {} of epoch {} (current epoch {})",
                ticket.page,
                ticket.epoch,
                self.epoch
            );
            return Err(LoadError::Superseded);
        }
        self.in_flight = None;

        let page = result?;
        let has_more = page.items.len() == ticket.page_size;
        Ok(LoadedPage {
            ticket: ticket.clone(),
            items: page.items,
            has_more,
        })
    }
}

/// Issue the one catalog call `ticket` stands for
///
/// # Errors
///
/// Whatever the catalog returns.
pub async fn fetch<C>(client: &C, ticket: &LoadTicket) -> catalog::Result<CatalogPage>
where
    C: CatalogClient + ?Sized,
{
    let (page, size) = (ticket.page, ticket.page_size);
    match ticket.filters.query() {
        CatalogQuery::Search(term) => {
            log::debug!("search '{term}' page {page}");
            client.search_by_name(&term, page, size).await
        }
        CatalogQuery::Category(id) => {
            log::debug!("category '{id}' page {page}");
            client.fetch_by_category(&id, page, size).await
        }
        CatalogQuery::Generic => {
            log::debug!("generic listing page {page}");
            client.fetch_generic(page, size).await
        }
    }
}
