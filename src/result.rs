//! Search result types.

use serde::{Deserialize, Serialize};

use crate::size::{normalize_size, UNKNOWN_SIZE};
use crate::Category;

/// A single torrent found by one source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TorrentResult {
    /// Magnet URI or direct download URI. Empty if unresolved.
    pub link: String,
    /// Display title with HTML entities decoded.
    pub name: String,
    /// Human-readable size, or `"Unknown"`.
    pub size_display: String,
    /// Size in bytes, 0 if unparseable.
    pub size_bytes: u64,
    pub seeders: u32,
    pub leechers: u32,
    /// Display name of the source, e.g. "The Pirate Bay".
    pub source_name: String,
    /// Base URL of the source site.
    pub source_site_url: String,
    /// Human-facing detail page.
    pub description_link: String,
    pub category_label: String,
    /// Unix timestamp in seconds.
    pub published_at: i64,
    /// Set when `published_at` is the fetch time rather than the upload time.
    #[serde(default)]
    pub published_approximate: bool,
}

impl TorrentResult {
    /// Creates a result with the given name and link.
    ///
    /// Size defaults to unknown and the publish date to now (approximate).
    pub fn new(name: impl Into<String>, link: impl Into<String>) -> Self {
        Self {
            link: link.into(),
            name: html_escape::decode_html_entities(&name.into()).trim().to_string(),
            size_display: UNKNOWN_SIZE.to_string(),
            size_bytes: 0,
            seeders: 0,
            leechers: 0,
            source_name: String::new(),
            source_site_url: String::new(),
            description_link: String::new(),
            category_label: String::new(),
            published_at: chrono::Utc::now().timestamp(),
            published_approximate: true,
        }
    }

    /// Sets the size from a site-reported string such as `"1.4 GiB"`.
    pub fn with_size_text(mut self, text: &str) -> Self {
        let (display, bytes) = normalize_size(text);
        self.size_display = display;
        self.size_bytes = bytes;
        self
    }

    /// Sets the size from an exact byte count.
    pub fn with_size_bytes(mut self, bytes: u64) -> Self {
        self.size_display = crate::size::format_size(bytes);
        self.size_bytes = bytes;
        self
    }

    pub fn with_peers(mut self, seeders: u32, leechers: u32) -> Self {
        self.seeders = seeders;
        self.leechers = leechers;
        self
    }

    /// Sets the originating source label and site URL.
    pub fn with_source(mut self, name: impl Into<String>, site_url: impl Into<String>) -> Self {
        self.source_name = name.into();
        self.source_site_url = site_url.into();
        self
    }

    pub fn with_description_link(mut self, link: impl Into<String>) -> Self {
        self.description_link = link.into();
        self
    }

    pub fn with_category_label(mut self, label: impl Into<String>) -> Self {
        self.category_label = label.into();
        self
    }

    /// Sets a publish date recovered from the site.
    pub fn with_published_at(mut self, timestamp: i64) -> Self {
        self.published_at = timestamp;
        self.published_approximate = false;
        self
    }
}

/// A source that failed to contribute results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFailure {
    /// Registry id of the source.
    pub source_id: String,
    pub message: String,
}

/// A registered source as exposed to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceInfo {
    pub id: String,
    pub display_name: String,
    /// Categories the site filters on natively; others search `all`.
    pub categories: Vec<Category>,
}

/// Container for merged, ranked search results.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchResults {
    /// Ranked results.
    results: Vec<TorrentResult>,
    /// Per-source diagnostics.
    errors: Vec<SourceFailure>,
    /// Number of results.
    pub count: usize,
    /// Search duration in milliseconds.
    pub duration_ms: u64,
}

impl SearchResults {
    /// Creates a new empty result container.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a container from already ranked results.
    pub fn from_results(results: Vec<TorrentResult>) -> Self {
        Self {
            count: results.len(),
            results,
            ..Default::default()
        }
    }

    /// Adds a result.
    pub fn add_result(&mut self, result: TorrentResult) {
        self.results.push(result);
        self.count = self.results.len();
    }

    /// Records a failed source.
    pub fn add_error(&mut self, source_id: impl Into<String>, message: impl Into<String>) {
        self.errors.push(SourceFailure {
            source_id: source_id.into(),
            message: message.into(),
        });
    }

    /// Returns the results.
    pub fn items(&self) -> &[TorrentResult] {
        &self.results
    }

    /// Consumes the container, returning the results.
    pub fn into_items(self) -> Vec<TorrentResult> {
        self.results
    }

    /// Returns the per-source failures.
    pub fn errors(&self) -> &[SourceFailure] {
        &self.errors
    }

    /// Keeps at most `limit` results.
    pub fn truncate(&mut self, limit: usize) {
        self.results.truncate(limit);
        self.count = self.results.len();
    }

    /// Sets the search duration.
    pub fn set_duration(&mut self, duration_ms: u64) {
        self.duration_ms = duration_ms;
    }
}
