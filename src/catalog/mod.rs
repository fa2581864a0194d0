//! Catalog client abstraction
//!
//! The browse core never talks HTTP itself. It consumes a [`CatalogClient`]
//! capability that answers five read-only queries:
//!
//! - **generic listing** - every product, page by page
//! - **by-name search** - products matching a free-text term
//! - **by-category listing** - products tagged with a category id
//! - **categories** - the category directory used to populate pickers
//! - **barcode lookup** - a single product by its code
//!
//! Every query may fail with a [`CatalogError`]; callers treat all failures
//! the same way.
//!
//! # Implementations
//!
//! - [`OpenFoodFactsClient`] - `reqwest` client for the OpenFoodFacts API
//! - [`MockCatalog`] - scripted in-process catalog for tests and demos

pub mod error;
pub mod http;
pub mod mock;

pub use error::CatalogError;
pub use http::OpenFoodFactsClient;
pub use mock::{CatalogCall, HeldReply, MockCatalog};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Result alias for catalog queries
pub type Result<T> = std::result::Result<T, CatalogError>;

/// Image shown when a product carries no picture at all
pub const PLACEHOLDER_IMAGE_URL: &str = "https://via.placeholder.com/240x180?text=No+Image";

/// A product as it appears in a listing
///
/// Codes are expected to be unique within a session, but the upstream API
/// occasionally repeats a product across pages. Duplicates are kept as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSummary {
    pub code: String,
    pub name: Option<String>,
    pub brand: Option<String>,
    /// Single letter A-E, in whatever case the API returned
    pub nutrition_grade: Option<String>,
    pub image_url: Option<String>,
}

impl ProductSummary {
    /// Create a summary carrying only a code and a name
    #[must_use]
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: Some(name.into()),
            brand: None,
            nutrition_grade: None,
            image_url: None,
        }
    }

    /// Set the brand
    #[must_use]
    pub fn with_brand(mut self, brand: impl Into<String>) -> Self {
        self.brand = Some(brand.into());
        self
    }

    /// Set the nutrition grade
    #[must_use]
    pub fn with_grade(mut self, grade: impl Into<String>) -> Self {
        self.nutrition_grade = Some(grade.into());
        self
    }

    /// Set the image URL
    #[must_use]
    pub fn with_image(mut self, url: impl Into<String>) -> Self {
        self.image_url = Some(url.into());
        self
    }

    /// Name for display, falling back to "Unknown Product"
    #[must_use]
    pub fn display_name(&self) -> &str {
        non_empty(self.name.as_deref()).unwrap_or("Unknown Product")
    }

    /// Brand for display, falling back to "Unknown Brand"
    #[must_use]
    pub fn display_brand(&self) -> &str {
        non_empty(self.brand.as_deref()).unwrap_or("Unknown Brand")
    }

    /// Uppercase grade letter, if graded
    #[must_use]
    pub fn grade_label(&self) -> Option<String> {
        non_empty(self.nutrition_grade.as_deref()).map(str::to_uppercase)
    }

    /// Image URL for display, falling back to a placeholder
    #[must_use]
    pub fn display_image(&self) -> &str {
        non_empty(self.image_url.as_deref()).unwrap_or(PLACEHOLDER_IMAGE_URL)
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.is_empty())
}

/// Reference to a category from the category directory
///
/// Identity is the `id`; the display name and count are informational.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryRef {
    pub id: String,
    pub display_name: String,
    pub product_count: u64,
}

impl CategoryRef {
    #[must_use]
    pub fn new(id: impl Into<String>, display_name: impl Into<String>, product_count: u64) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            product_count,
        }
    }

    /// Picker label, e.g. `"Snacks (1204)"`
    #[must_use]
    pub fn label(&self) -> String {
        format!("{} ({})", self.display_name, self.product_count)
    }
}

impl PartialEq for CategoryRef {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for CategoryRef {}

/// One page of a product listing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogPage {
    pub items: Vec<ProductSummary>,
    /// Count reported by the API, if any. Not a reliable total.
    pub raw_count: Option<u64>,
}

impl CatalogPage {
    #[must_use]
    pub fn new(items: Vec<ProductSummary>) -> Self {
        Self {
            raw_count: Some(items.len() as u64),
            items,
        }
    }
}

/// One page of the category directory
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryPage {
    pub tags: Vec<CategoryRef>,
}

/// Answer to a barcode lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BarcodeLookup {
    pub found: bool,
    pub item: Option<ProductSummary>,
}

impl BarcodeLookup {
    #[must_use]
    pub fn found(item: ProductSummary) -> Self {
        Self {
            found: true,
            item: Some(item),
        }
    }

    #[must_use]
    pub const fn not_found() -> Self {
        Self {
            found: false,
            item: None,
        }
    }
}

/// Read-only product catalog
///
/// Pages are 1-based. Implementations must be cheap to share behind an
/// `Arc`; the browse controller holds one for its whole lifetime.
#[async_trait]
pub trait CatalogClient: Send + Sync {
    /// List products without any filter
    async fn fetch_generic(&self, page: u32, page_size: usize) -> Result<CatalogPage>;

    /// Search products whose name matches `term`
    async fn search_by_name(&self, term: &str, page: u32, page_size: usize) -> Result<CatalogPage>;

    /// List products in a category
    async fn fetch_by_category(
        &self,
        category_id: &str,
        page: u32,
        page_size: usize,
    ) -> Result<CatalogPage>;

    /// Fetch the category directory
    async fn fetch_categories(&self, page: u32, page_size: usize) -> Result<CategoryPage>;

    /// Look a single product up by barcode
    async fn lookup_by_barcode(&self, code: &str) -> Result<BarcodeLookup>;
}
