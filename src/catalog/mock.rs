//! Scripted catalog for testing
//!
//! `MockCatalog` answers listing queries with generated products so tests can
//! tell which query produced which item (`"chocolate-2-5"` is the sixth item
//! of page 2 of a search for "chocolate"). Replies can be scripted per call,
//! and a reply can be held back until the test releases it, which is how
//! late and overlapping responses are simulated.

use super::{
    BarcodeLookup, CatalogClient, CatalogError, CatalogPage, CategoryPage, CategoryRef,
    ProductSummary, Result,
};
use crate::lock;
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use tokio::sync::oneshot;

const GRADES: [Option<&str>; 6] = [Some("a"), Some("b"), Some("c"), Some("d"), Some("e"), None];

/// A call received by the mock, in arrival order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogCall {
    Generic { page: u32, page_size: usize },
    ByName { term: String, page: u32, page_size: usize },
    ByCategory { category_id: String, page: u32, page_size: usize },
    Categories { page: u32, page_size: usize },
    Barcode { code: String },
}

impl CatalogCall {
    /// Whether this call is one of the three product listings
    #[must_use]
    pub const fn is_listing(&self) -> bool {
        matches!(
            self,
            Self::Generic { .. } | Self::ByName { .. } | Self::ByCategory { .. }
        )
    }

    fn label(&self) -> &str {
        match self {
            Self::ByName { term, .. } => term,
            Self::ByCategory { category_id, .. } => category_id,
            _ => "all",
        }
    }
}

enum Reply {
    Len(usize),
    Fail(CatalogError),
    Held(oneshot::Receiver<Result<usize>>),
}

/// Handle to a listing reply the mock is holding back
///
/// Dropping it without releasing makes the pending call fail.
#[derive(Debug)]
pub struct HeldReply {
    tx: oneshot::Sender<Result<usize>>,
}

impl HeldReply {
    /// Let the held call return a page of `len` generated items
    pub fn release(self, len: usize) {
        let _ = self.tx.send(Ok(len));
    }

    /// Let the held call fail with `err`
    pub fn fail(self, err: CatalogError) {
        let _ = self.tx.send(Err(err));
    }
}

/// In-process catalog with scripted replies
///
/// Listing calls consume scripted replies in order; once the script is empty
/// every listing returns a full page.
#[derive(Default)]
pub struct MockCatalog {
    calls: Mutex<Vec<CatalogCall>>,
    replies: Mutex<VecDeque<Reply>>,
    categories: Mutex<Vec<CategoryRef>>,
    categories_error: Mutex<Option<CatalogError>>,
    products: Mutex<HashMap<String, ProductSummary>>,
    barcode_error: Mutex<Option<CatalogError>>,
}

impl MockCatalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Next listing returns `len` items
    pub fn push_page(&self, len: usize) -> &Self {
        lock(&self.replies).push_back(Reply::Len(len));
        self
    }

    /// Next listing fails with `err`
    pub fn push_failure(&self, err: CatalogError) -> &Self {
        lock(&self.replies).push_back(Reply::Fail(err));
        self
    }

    /// Next listing waits until the returned handle is released
    #[must_use]
    pub fn hold_next(&self) -> HeldReply {
        let (tx, rx) = oneshot::channel();
        lock(&self.replies).push_back(Reply::Held(rx));
        HeldReply { tx }
    }

    /// Set the category directory
    pub fn set_categories(&self, categories: Vec<CategoryRef>) {
        *lock(&self.categories) = categories;
    }

    /// Make category fetches fail
    pub fn fail_categories(&self, err: CatalogError) {
        *lock(&self.categories_error) = Some(err);
    }

    /// Register a product findable by its barcode
    pub fn add_product(&self, product: ProductSummary) {
        lock(&self.products).insert(product.code.clone(), product);
    }

    /// Make barcode lookups fail
    pub fn fail_barcodes(&self, err: CatalogError) {
        *lock(&self.barcode_error) = Some(err);
    }

    /// Every call received so far
    #[must_use]
    pub fn calls(&self) -> Vec<CatalogCall> {
        lock(&self.calls).clone()
    }

    /// Listing calls received so far
    #[must_use]
    pub fn listing_calls(&self) -> Vec<CatalogCall> {
        lock(&self.calls)
            .iter()
            .filter(|c| c.is_listing())
            .cloned()
            .collect()
    }

    /// Forget recorded calls
    pub fn clear_calls(&self) {
        lock(&self.calls).clear();
    }

    /// Items the mock generates for `call`, page of `len`
    #[must_use]
    pub fn generated_items(call: &CatalogCall, len: usize) -> Vec<ProductSummary> {
        let (page, page_size) = match call {
            CatalogCall::Generic { page, page_size }
            | CatalogCall::ByName { page, page_size, .. }
            | CatalogCall::ByCategory { page, page_size, .. } => (*page, *page_size),
            _ => return Vec::new(),
        };
        let label = call.label();
        let offset = (page.saturating_sub(1) as usize) * page_size;

        (0..len)
            .map(|i| {
                let mut item = ProductSummary::new(
                    format!("{label}-{page}-{i}"),
                    format!("{label} #{}", offset + i + 1),
                );
                if let Some(grade) = GRADES[i % GRADES.len()] {
                    item = item.with_grade(grade);
                }
                item
            })
            .collect()
    }

    async fn listing(&self, call: CatalogCall) -> Result<CatalogPage> {
        let page_size = match &call {
            CatalogCall::Generic { page_size, .. }
            | CatalogCall::ByName { page_size, .. }
            | CatalogCall::ByCategory { page_size, .. } => *page_size,
            _ => 0,
        };
        lock(&self.calls).push(call.clone());
        let reply = lock(&self.replies).pop_front();

        let len = match reply {
            None => page_size,
            Some(Reply::Len(len)) => len,
            Some(Reply::Fail(err)) => return Err(err),
            Some(Reply::Held(rx)) => match rx.await {
                Ok(result) => result?,
                Err(_) => return Err(CatalogError::Request("held reply dropped".into())),
            },
        };

        Ok(CatalogPage::new(Self::generated_items(&call, len)))
    }
}

#[async_trait]
impl CatalogClient for MockCatalog {
    async fn fetch_generic(&self, page: u32, page_size: usize) -> Result<CatalogPage> {
        self.listing(CatalogCall::Generic { page, page_size }).await
    }

    async fn search_by_name(&self, term: &str, page: u32, page_size: usize) -> Result<CatalogPage> {
        self.listing(CatalogCall::ByName {
            term: term.to_string(),
            page,
            page_size,
        })
        .await
    }

    async fn fetch_by_category(
        &self,
        category_id: &str,
        page: u32,
        page_size: usize,
    ) -> Result<CatalogPage> {
        self.listing(CatalogCall::ByCategory {
            category_id: category_id.to_string(),
            page,
            page_size,
        })
        .await
    }

    async fn fetch_categories(&self, page: u32, page_size: usize) -> Result<CategoryPage> {
        lock(&self.calls).push(CatalogCall::Categories { page, page_size });
        if let Some(err) = lock(&self.categories_error).clone() {
            return Err(err);
        }
        let tags = lock(&self.categories).iter().take(page_size).cloned().collect();
        Ok(CategoryPage { tags })
    }

    async fn lookup_by_barcode(&self, code: &str) -> Result<BarcodeLookup> {
        lock(&self.calls).push(CatalogCall::Barcode {
            code: code.to_string(),
        });
        if let Some(err) = lock(&self.barcode_error).clone() {
            return Err(err);
        }
        Ok(lock(&self.products)
            .get(code)
            .cloned()
            .map_or_else(BarcodeLookup::not_found, BarcodeLookup::found))
    }
}
