//! Source adapter trait and configuration.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{CategoryMap, Result, SearchQuery, TorrentResult};

/// Configuration for a torrent source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Display name of the source.
    pub name: String,
    /// Registry identifier (e.g., "piratebay").
    pub shortcut: String,
    /// Time budget for one search on this source, in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,
    /// Whether the source is enabled.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Maximum listing pages requested per search.
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,
}

fn default_timeout() -> u64 {
    20
}

fn default_enabled() -> bool {
    true
}

fn default_max_pages() -> u32 {
    1
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            shortcut: String::new(),
            timeout: default_timeout(),
            enabled: true,
            max_pages: default_max_pages(),
        }
    }
}

/// Trait implemented by every torrent source.
///
/// Implementations hold only fixed configuration and are shared across
/// concurrent searches.
#[async_trait]
pub trait Engine: Send + Sync {
    /// Returns the engine configuration.
    fn config(&self) -> &EngineConfig;

    /// Base URL of the site, used for `source_site_url`.
    fn site_url(&self) -> &str;

    /// The site's category table.
    fn categories(&self) -> &CategoryMap;

    /// Performs a search, reporting fetch or parse failures as errors.
    ///
    /// Rows that fail to parse are skipped, not reported.
    async fn fetch_results(&self, query: &SearchQuery) -> Result<Vec<TorrentResult>>;

    /// Performs a search, absorbing every failure into an empty list.
    async fn search(&self, query: &SearchQuery) -> Vec<TorrentResult> {
        match self.fetch_results(query).await {
            Ok(results) => results,
            Err(e) => {
                warn!("Engine {} failed: {}", self.name(), e);
                Vec::new()
            }
        }
    }

    /// Returns the engine name.
    fn name(&self) -> &str {
        &self.config().name
    }

    /// Returns the engine shortcut.
    fn shortcut(&self) -> &str {
        &self.config().shortcut
    }

    /// Returns whether the engine is enabled.
    fn is_enabled(&self) -> bool {
        self.config().enabled
    }

    /// Starts a result attributed to this engine.
    fn result(&self, name: &str, link: impl Into<String>) -> TorrentResult
    where
        Self: Sized,
    {
        TorrentResult::new(name, link).with_source(self.name(), self.site_url())
    }
}
