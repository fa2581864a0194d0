//! Filter state and query precedence
//!
//! A [`FilterState`] is an immutable value: every change produces a new one.
//! Which catalog query a filter state maps to is decided by [`PRECEDENCE`],
//! an ordered list of sources tried first to last.

use crate::catalog::CategoryRef;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Client-side sort order
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortKey {
    /// Arrival order
    #[default]
    None,
    NameAsc,
    NameDesc,
    GradeAsc,
    GradeDesc,
}

impl SortKey {
    /// All keys, in picker order
    pub const ALL: [Self; 5] = [
        Self::None,
        Self::NameAsc,
        Self::NameDesc,
        Self::GradeAsc,
        Self::GradeDesc,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::NameAsc => "name-asc",
            Self::NameDesc => "name-desc",
            Self::GradeAsc => "grade-asc",
            Self::GradeDesc => "grade-desc",
        }
    }

    /// Human-readable label
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::None => "Arrival order",
            Self::NameAsc => "Name A-Z",
            Self::NameDesc => "Name Z-A",
            Self::GradeAsc => "Nutrition grade A-E",
            Self::GradeDesc => "Nutrition grade E-A",
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "none" => Ok(Self::None),
            "name-asc" => Ok(Self::NameAsc),
            "name-desc" => Ok(Self::NameDesc),
            "grade-asc" | "nutri-asc" => Ok(Self::GradeAsc),
            "grade-desc" | "nutri-desc" => Ok(Self::GradeDesc),
            other => Err(format!(
                "unknown sort key '{other}' (expected one of: none, name-asc, name-desc, grade-asc, grade-desc)"
            )),
        }
    }
}

/// Current search term, category and sort key
///
/// Two filter states are equal when all three fields are equal; categories
/// compare by id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterState {
    search_term: String,
    category: Option<CategoryRef>,
    sort_key: SortKey,
}

impl FilterState {
    #[must_use]
    pub fn new(search_term: impl Into<String>, category: Option<CategoryRef>, sort_key: SortKey) -> Self {
        Self {
            search_term: search_term.into(),
            category,
            sort_key,
        }
    }

    #[must_use]
    pub fn search_term(&self) -> &str {
        &self.search_term
    }

    #[must_use]
    pub const fn category(&self) -> Option<&CategoryRef> {
        self.category.as_ref()
    }

    #[must_use]
    pub const fn sort_key(&self) -> SortKey {
        self.sort_key
    }

    /// Copy with a different search term
    #[must_use]
    pub fn with_search(&self, term: impl Into<String>) -> Self {
        Self {
            search_term: term.into(),
            ..self.clone()
        }
    }

    /// Copy with a different category
    #[must_use]
    pub fn with_category(&self, category: Option<CategoryRef>) -> Self {
        Self {
            category,
            ..self.clone()
        }
    }

    /// Copy with a different sort key
    #[must_use]
    pub fn with_sort(&self, sort_key: SortKey) -> Self {
        Self {
            sort_key,
            ..self.clone()
        }
    }

    /// Whether this is the default (cleared) state
    #[must_use]
    pub fn is_cleared(&self) -> bool {
        *self == Self::default()
    }

    /// Catalog query these filters translate to
    #[must_use]
    pub fn query(&self) -> CatalogQuery {
        PRECEDENCE
            .iter()
            .find_map(|source| source.select(self))
            .unwrap_or(CatalogQuery::Generic)
    }
}

/// Where a catalog query can come from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuerySource {
    SearchTerm,
    Category,
    Generic,
}

/// Query sources, highest priority first
///
/// A non-blank search term wins over a category; with neither, the generic
/// listing is used. Sort is never part of the query.
pub const PRECEDENCE: [QuerySource; 3] = [
    QuerySource::SearchTerm,
    QuerySource::Category,
    QuerySource::Generic,
];

impl QuerySource {
    /// The query this source yields for `filters`, if it applies
    #[must_use]
    pub fn select(self, filters: &FilterState) -> Option<CatalogQuery> {
        match self {
            Self::SearchTerm => {
                let term = filters.search_term.trim();
                (!term.is_empty()).then(|| CatalogQuery::Search(term.to_string()))
            }
            Self::Category => filters
                .category
                .as_ref()
                .map(|c| CatalogQuery::Category(c.id.clone())),
            Self::Generic => Some(CatalogQuery::Generic),
        }
    }
}

/// Exactly one of the three listing queries
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogQuery {
    Search(String),
    Category(String),
    Generic,
}
