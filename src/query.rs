//! Search query representation.

use serde::{Deserialize, Serialize};

use crate::Category;

/// A search query with all parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchQuery {
    /// The search terms as received from the caller.
    pub query: String,
    /// Target category.
    #[serde(default)]
    pub category: Category,
    /// Specific sources to use (by id). Empty means every registered source.
    #[serde(default)]
    pub sources: Vec<String>,
    /// Maximum number of ranked results to return.
    #[serde(default)]
    pub limit: Option<usize>,
}

impl SearchQuery {
    /// Creates a new search query with the given terms.
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            category: Category::All,
            sources: Vec::new(),
            limit: None,
        }
    }

    /// Sets the category to search.
    pub fn with_category(mut self, category: Category) -> Self {
        self.category = category;
        self
    }

    /// Restricts the search to specific sources.
    pub fn with_sources(mut self, sources: Vec<String>) -> Self {
        self.sources = sources;
        self
    }

    /// Caps the number of ranked results.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Returns true if the query has no searchable terms.
    pub fn is_blank(&self) -> bool {
        self.query.trim().is_empty()
    }

    /// The search terms, URL-decoded once so re-encoding for a site does not
    /// double-encode an already encoded query.
    pub fn terms(&self) -> String {
        let trimmed = self.query.trim();
        urlencoding::decode(trimmed)
            .map(|s| s.into_owned())
            .unwrap_or_else(|_| trimmed.to_string())
    }

    /// The terms percent-encoded for use in a query string or path segment.
    pub fn encoded_terms(&self) -> String {
        urlencoding::encode(&self.terms()).into_owned()
    }
}
