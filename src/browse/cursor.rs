//! Pagination cursor
//!
//! `has_more` is never set directly. It is derived from the size of the last
//! page: a full page means there may be more. The API exposes no reliable
//! total, so when the remaining count is an exact multiple of the page size
//! the cursor reports one extra (empty) page. That is expected.

use serde::{Deserialize, Serialize};

/// Page size used when nothing else is configured
pub const DEFAULT_PAGE_SIZE: usize = 24;

/// Position in a paginated listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationCursor {
    page_number: u32,
    page_size: usize,
    has_more: bool,
}

impl PaginationCursor {
    /// Cursor at page 1 with `has_more` set
    #[must_use]
    pub const fn new(page_size: usize) -> Self {
        Self {
            page_number: 1,
            page_size,
            has_more: true,
        }
    }

    #[must_use]
    pub const fn page_number(&self) -> u32 {
        self.page_number
    }

    #[must_use]
    pub const fn page_size(&self) -> usize {
        self.page_size
    }

    #[must_use]
    pub const fn has_more(&self) -> bool {
        self.has_more
    }

    /// Page a "load more" would request
    #[must_use]
    pub const fn next_page(&self) -> u32 {
        self.page_number.saturating_add(1)
    }

    /// Back to page 1 with `has_more` set
    #[must_use]
    pub const fn reset(&self) -> Self {
        Self::new(self.page_size)
    }

    /// Cursor after `page` settled with `received` items
    #[must_use]
    pub const fn after_page(&self, page: u32, received: usize) -> Self {
        Self {
            page_number: page,
            page_size: self.page_size,
            has_more: received == self.page_size,
        }
    }

    /// Same position, no further automatic loading
    #[must_use]
    pub const fn exhausted(&self) -> Self {
        Self {
            has_more: false,
            ..*self
        }
    }

    /// Whether the fields could have been produced by this type
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.page_number >= 1 && self.page_size > 0
    }
}

impl Default for PaginationCursor {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}
