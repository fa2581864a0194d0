//! OpenFoodFacts catalog client
//!
//! Maps the four listing endpoints and the barcode endpoint of the public
//! OpenFoodFacts API onto [`CatalogClient`]. Only the handful of product
//! fields the browse view needs are decoded.

use super::{
    BarcodeLookup, CatalogClient, CatalogError, CatalogPage, CategoryPage, CategoryRef,
    ProductSummary, Result,
};
use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

/// Public OpenFoodFacts instance
pub const DEFAULT_BASE_URL: &str = "https://world.openfoodfacts.org";

const USER_AGENT: &str = concat!("larder/", env!("CARGO_PKG_VERSION"));

/// `reqwest`-backed OpenFoodFacts client
#[derive(Debug, Clone)]
pub struct OpenFoodFactsClient {
    client: Client,
    base_url: Url,
}

impl OpenFoodFactsClient {
    /// Build a client against `base_url` with a request timeout
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Request` if the URL does not parse or the HTTP
    /// client cannot be built.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| CatalogError::Request(format!("invalid base URL '{base_url}': {e}")))?;
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;

        Ok(Self { client, base_url })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| CatalogError::Request(format!("base URL '{}' cannot hold a path", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: Url,
        query: &[(&str, String)],
        context: &str,
    ) -> Result<T> {
        log::debug!("GET {url} {query:?}");
        let response = self.client.get(url).query(query).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(CatalogError::Status {
                status: status.as_u16(),
                context: context.to_string(),
            });
        }

        Ok(response.json::<T>().await?)
    }

    async fn search(&self, query: Vec<(&str, String)>, context: &str) -> Result<CatalogPage> {
        let url = self.endpoint(&["cgi", "search.pl"])?;
        let raw: RawListing = self.get_json(url, &query, context).await?;
        Ok(raw.into())
    }
}

fn paging(page: u32, page_size: usize) -> [(&'static str, String); 2] {
    [("page", page.to_string()), ("page_size", page_size.to_string())]
}

#[async_trait]
impl CatalogClient for OpenFoodFactsClient {
    async fn fetch_generic(&self, page: u32, page_size: usize) -> Result<CatalogPage> {
        let mut query = vec![("search_simple", "1".to_string()), ("json", "true".to_string())];
        query.extend(paging(page, page_size));
        self.search(query, "Fetch products").await
    }

    async fn search_by_name(&self, term: &str, page: u32, page_size: usize) -> Result<CatalogPage> {
        let mut query = vec![
            ("search_terms", term.to_string()),
            ("search_simple", "1".to_string()),
            ("json", "true".to_string()),
        ];
        query.extend(paging(page, page_size));
        self.search(query, "Search products").await
    }

    async fn fetch_by_category(
        &self,
        category_id: &str,
        page: u32,
        page_size: usize,
    ) -> Result<CatalogPage> {
        let url = self.endpoint(&["category", &format!("{category_id}.json")])?;
        let raw: RawListing = self
            .get_json(url, &paging(page, page_size), "Fetch category products")
            .await?;
        Ok(raw.into())
    }

    async fn fetch_categories(&self, page: u32, page_size: usize) -> Result<CategoryPage> {
        let url = self.endpoint(&["categories.json"])?;
        let raw: RawCategories = self
            .get_json(url, &paging(page, page_size), "Fetch categories")
            .await?;
        Ok(CategoryPage {
            tags: raw.tags.into_iter().map(CategoryRef::from).collect(),
        })
    }

    async fn lookup_by_barcode(&self, code: &str) -> Result<BarcodeLookup> {
        let url = self.endpoint(&["api", "v0", "product", &format!("{code}.json")])?;
        let raw: RawBarcode = self
            .get_json(url, &[], "Fetch product by barcode")
            .await?;

        match (raw.status, raw.product) {
            (Some(1), Some(product)) => Ok(BarcodeLookup::found(product.into_summary(code))),
            _ => Ok(BarcodeLookup::not_found()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawListing {
    #[serde(default)]
    count: Option<Value>,
    #[serde(default)]
    products: Vec<RawProduct>,
}

impl From<RawListing> for CatalogPage {
    fn from(raw: RawListing) -> Self {
        let items: Vec<ProductSummary> = raw
            .products
            .into_iter()
            .map(|p| p.into_summary(""))
            .collect();
        // `count` arrives as a number from search.pl and as a string from some
        // category endpoints.
        let raw_count = raw.count.as_ref().and_then(|v| match v {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.parse().ok(),
            _ => None,
        });
        Self { items, raw_count }
    }
}

#[derive(Debug, Deserialize)]
struct RawProduct {
    #[serde(default)]
    code: Option<Value>,
    #[serde(default)]
    product_name: Option<String>,
    #[serde(default)]
    brands: Option<String>,
    #[serde(default)]
    nutrition_grades: Option<String>,
    #[serde(default)]
    image_front_small_url: Option<String>,
    #[serde(default)]
    image_url: Option<String>,
}

impl RawProduct {
    fn into_summary(self, fallback_code: &str) -> ProductSummary {
        let code = match self.code {
            Some(Value::String(s)) => s,
            Some(Value::Number(n)) => n.to_string(),
            _ => fallback_code.to_string(),
        };
        ProductSummary {
            code,
            name: self.product_name,
            brand: self.brands,
            nutrition_grade: self.nutrition_grades,
            image_url: self.image_front_small_url.or(self.image_url),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawCategories {
    #[serde(default)]
    tags: Vec<RawCategory>,
}

#[derive(Debug, Deserialize)]
struct RawCategory {
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    products: u64,
}

impl From<RawCategory> for CategoryRef {
    fn from(raw: RawCategory) -> Self {
        Self::new(raw.id, raw.name, raw.products)
    }
}

#[derive(Debug, Deserialize)]
struct RawBarcode {
    #[serde(default)]
    status: Option<i64>,
    #[serde(default)]
    product: Option<RawProduct>,
}
