//! EZTV TV releases.
//!
//! The search page only links shows by IMDb id, so a search is two
//! requests: the HTML search page, then the torrents API for the first id.

use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use tracing::debug;

use super::{capture, join_url, lenient_string, lenient_u64, pattern, peers};
use crate::fetcher::PageFetcher;
use crate::magnet::checked_magnet;
use crate::{Category, CategoryMap, Engine, EngineConfig, Result, SearchQuery, TorrentResult};

const SITE_URL: &str = "https://eztv.re";

const CATEGORIES: CategoryMap = CategoryMap::new("0", &[(Category::Tv, "0")]);

static IMDB_ID: LazyLock<Regex> = LazyLock::new(|| pattern(r"imdb_id=(\d+)"));

/// EZTV.
pub struct Eztv {
    config: EngineConfig,
    fetcher: Arc<dyn PageFetcher>,
    base_url: String,
}

#[derive(Deserialize)]
struct ApiResponse {
    #[serde(default, deserialize_with = "lenient_u64")]
    torrents_count: u64,
    #[serde(default)]
    torrents: Vec<ApiTorrent>,
}

#[derive(Deserialize)]
struct ApiTorrent {
    #[serde(default)]
    title: String,
    #[serde(default)]
    magnet_url: String,
    #[serde(default, deserialize_with = "lenient_string")]
    episode_url: String,
    #[serde(default, deserialize_with = "lenient_u64")]
    seeds: u64,
    #[serde(default, deserialize_with = "lenient_u64")]
    peers: u64,
    #[serde(default, deserialize_with = "lenient_u64")]
    size_bytes: u64,
    #[serde(default, deserialize_with = "lenient_u64")]
    date_released_unix: u64,
}

impl Eztv {
    /// Creates a new EZTV engine.
    pub fn new(fetcher: Arc<dyn PageFetcher>) -> Self {
        Self {
            config: EngineConfig {
                name: "EZTV".to_string(),
                shortcut: "eztv".to_string(),
                ..Default::default()
            },
            fetcher,
            base_url: SITE_URL.to_string(),
        }
    }

    /// Points the engine at a mirror.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Creates with custom configuration.
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    fn search_url(&self, query: &SearchQuery) -> String {
        format!("{}/search/{}", self.base_url, query.encoded_terms())
    }

    fn api_url(&self, imdb_id: &str) -> String {
        format!("{}/api/get-torrents?limit=50&imdb_id={}", self.base_url, imdb_id)
    }

    fn find_imdb_id<'t>(&self, html: &'t str) -> Option<&'t str> {
        capture(&IMDB_ID, html)
    }

    fn parse_results(&self, json: &str) -> Result<Vec<TorrentResult>> {
        let response: ApiResponse = serde_json::from_str(json)?;
        if response.torrents_count == 0 {
            return Ok(Vec::new());
        }

        let results = response
            .torrents
            .into_iter()
            .filter(|t| !t.title.is_empty() && checked_magnet(&t.magnet_url).is_some())
            .map(|t| {
                let mut result = self
                    .result(&t.title, t.magnet_url)
                    .with_size_bytes(t.size_bytes)
                    .with_peers(peers(t.seeds), peers(t.peers))
                    .with_description_link(join_url(&self.base_url, &t.episode_url))
                    .with_category_label("TV Shows");
                if t.date_released_unix > 0 {
                    result = result.with_published_at(t.date_released_unix as i64);
                }
                result
            })
            .collect();
        Ok(results)
    }
}

#[async_trait]
impl Engine for Eztv {
    fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn site_url(&self) -> &str {
        SITE_URL
    }

    fn categories(&self) -> &CategoryMap {
        &CATEGORIES
    }

    async fn fetch_results(&self, query: &SearchQuery) -> Result<Vec<TorrentResult>> {
        let html = self.fetcher.get(&self.search_url(query)).await?;
        let Some(imdb_id) = self.find_imdb_id(&html) else {
            debug!("{}: no show matched '{}'", self.name(), query.terms());
            return Ok(Vec::new());
        };

        let json = self.fetcher.get_raw(&self.api_url(imdb_id)).await?;
        self.parse_results(&json)
    }
}
