//! The Pirate Bay, through its apibay JSON API.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use super::{lenient_string, lenient_u64, peers};
use crate::fetcher::PageFetcher;
use crate::magnet::{is_null_hash, magnet_link};
use crate::{Category, CategoryMap, Engine, EngineConfig, Result, SearchQuery, TorrentResult};

const SITE_URL: &str = "https://thepiratebay.org";
const API_URL: &str = "https://apibay.org";

const CATEGORIES: CategoryMap = CategoryMap::new(
    "0",
    &[
        (Category::Music, "100"),
        (Category::Movies, "200"),
        (Category::Tv, "205"),
        (Category::Software, "300"),
        (Category::Games, "400"),
        (Category::Books, "601"),
    ],
);

/// The Pirate Bay.
pub struct PirateBay {
    config: EngineConfig,
    fetcher: Arc<dyn PageFetcher>,
    api_url: String,
}

#[derive(Deserialize)]
struct ApiTorrent {
    #[serde(default, deserialize_with = "lenient_string")]
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    info_hash: String,
    #[serde(default, deserialize_with = "lenient_u64")]
    seeders: u64,
    #[serde(default, deserialize_with = "lenient_u64")]
    leechers: u64,
    #[serde(default, deserialize_with = "lenient_u64")]
    size: u64,
    #[serde(default, deserialize_with = "lenient_u64")]
    added: u64,
    #[serde(default, deserialize_with = "lenient_string")]
    category: String,
}

impl PirateBay {
    /// Creates a new Pirate Bay engine.
    pub fn new(fetcher: Arc<dyn PageFetcher>) -> Self {
        Self {
            config: EngineConfig {
                name: "The Pirate Bay".to_string(),
                shortcut: "piratebay".to_string(),
                timeout: 15,
                ..Default::default()
            },
            fetcher,
            api_url: API_URL.to_string(),
        }
    }

    /// Points the engine at a different API host.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }

    /// Creates with custom configuration.
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    fn search_url(&self, query: &SearchQuery) -> String {
        let mut url = format!("{}/q.php?q={}", self.api_url, query.encoded_terms());
        let category = CATEGORIES.token(query.category);
        if category != "0" {
            url.push_str("&cat=");
            url.push_str(category);
        }
        url
    }

    fn parse_results(&self, json: &str) -> Result<Vec<TorrentResult>> {
        let torrents: Vec<ApiTorrent> = serde_json::from_str(json)?;

        let mut results = Vec::new();
        for torrent in torrents {
            if is_null_hash(&torrent.info_hash) {
                continue;
            }
            let name = html_escape::decode_html_entities(&torrent.name);
            let Some(link) = magnet_link(&torrent.info_hash, &name) else {
                debug!("{}: skipping {} without hash", self.name(), torrent.id);
                continue;
            };
            let mut result = self
                .result(&name, link)
                .with_size_bytes(torrent.size)
                .with_peers(peers(torrent.seeders), peers(torrent.leechers))
                .with_description_link(format!("{}/description.php?id={}", SITE_URL, torrent.id))
                .with_category_label(category_label(&torrent.category));
            if torrent.added > 0 {
                result = result.with_published_at(torrent.added as i64);
            }
            results.push(result);
        }
        Ok(results)
    }
}

/// Maps a site category id such as `"207"` to its top-level label.
fn category_label(id: &str) -> &'static str {
    match id.chars().next() {
        Some('1') => "Music",
        Some('2') => "Movies",
        Some('3') => "Software",
        Some('4') => "Games",
        _ if id == "0" => "All",
        _ => "Other",
    }
}

#[async_trait]
impl Engine for PirateBay {
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
        self.parse_results(&json)
    }
}
