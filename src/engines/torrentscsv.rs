//! Torrents-CSV, a JSON search service over a public torrent dump.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use super::{lenient_u64, peers};
use crate::fetcher::PageFetcher;
use crate::magnet::{is_null_hash, magnet_link};
use crate::{CategoryMap, Engine, EngineConfig, Result, SearchQuery, TorrentResult};

const SITE_URL: &str = "https://torrents-csv.com";

const CATEGORIES: CategoryMap = CategoryMap::new("", &[]);

/// Torrents-CSV.
pub struct TorrentsCsv {
    config: EngineConfig,
    fetcher: Arc<dyn PageFetcher>,
    base_url: String,
}

#[derive(Deserialize)]
struct ApiResponse {
    #[serde(default)]
    torrents: Vec<ApiTorrent>,
}

#[derive(Deserialize)]
struct ApiTorrent {
    #[serde(default)]
    infohash: String,
    #[serde(default)]
    name: String,
    #[serde(default, deserialize_with = "lenient_u64")]
    size_bytes: u64,
    #[serde(default, deserialize_with = "lenient_u64")]
    created_unix: u64,
    #[serde(default, deserialize_with = "lenient_u64")]
    seeders: u64,
    #[serde(default, deserialize_with = "lenient_u64")]
    leechers: u64,
}

impl TorrentsCsv {
    /// Creates a new Torrents-CSV engine.
    pub fn new(fetcher: Arc<dyn PageFetcher>) -> Self {
        Self {
            config: EngineConfig {
                name: "Torrents CSV".to_string(),
                shortcut: "torrentscsv".to_string(),
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
        format!(
            "{}/service/search?size=100&q={}",
            self.base_url,
            query.encoded_terms()
        )
    }

    fn parse_results(&self, json: &str, query: &SearchQuery) -> Result<Vec<TorrentResult>> {
        let response: ApiResponse = serde_json::from_str(json)?;
        let description = format!(
            "{}/#/search/torrent/{}/1",
            self.base_url,
            query.encoded_terms()
        );

        let results = response
            .torrents
            .into_iter()
            .filter(|t| !is_null_hash(&t.infohash) && !t.name.is_empty())
            .filter_map(|t| {
                let link = magnet_link(&t.infohash, &t.name)?;
                let mut result = self
                    .result(&t.name, link)
                    .with_size_bytes(t.size_bytes)
                    .with_peers(peers(t.seeders), peers(t.leechers))
                    .with_description_link(description.clone())
                    .with_category_label("Unknown");
                if t.created_unix > 0 {
                    result = result.with_published_at(t.created_unix as i64);
                }
                Some(result)
            })
            .collect();
        Ok(results)
    }
}

#[async_trait]
impl Engine for TorrentsCsv {
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
        let json = self.fetcher.get_raw(&self.search_url(query)).await?;
        self.parse_results(&json, query)
    }
}
