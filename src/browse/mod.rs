//! Browse module - filterable, paginated, resumable product browsing
//!
//! This module holds the browse-state logic. It is UI-agnostic: a front end
//! drives a [`BrowseController`] with filter and pagination events and
//! renders the [`BrowseView`] it reads back or is notified with.
//!
//! # Architecture
//!
//! - `filter`: immutable filter values and the query precedence rule
//! - `cursor`: pagination cursor with derived `has_more`
//! - `sort`: pure client-side sorting
//! - `coordinator`: single-flight and epoch bookkeeping for page loads
//! - `controller`: orchestration, snapshot restore/persist, observers

pub mod controller;
pub mod coordinator;
pub mod cursor;
pub mod error;
pub mod filter;
pub mod sort;

pub use controller::{BrowseController, BrowseSettings, BrowseView, LoadOutcome, Observer};
pub use coordinator::{LoadCoordinator, LoadError, LoadMode, LoadTicket, LoadedPage};
pub use cursor::{DEFAULT_PAGE_SIZE, PaginationCursor};
pub use error::BrowseError;
pub use filter::{CatalogQuery, FilterState, PRECEDENCE, QuerySource, SortKey};
pub use sort::sort;
