//! TorrentProject. Magnets live on the detail pages.

use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use regex::Regex;
use tracing::debug;

use super::{capture, join_url, parse_count, parse_rows, pattern, require, resolve_rows};
use crate::fetcher::PageFetcher;
use crate::magnet::checked_magnet;
use crate::{CategoryMap, Engine, EngineConfig, Result, SearchQuery, TorrentResult};

const SITE_URL: &str = "https://torrentproject.cc";

const CATEGORIES: CategoryMap = CategoryMap::new("0", &[]);

static ROW: LazyLock<Regex> = LazyLock::new(|| pattern(r"(?s)<tr class='gac_bb'>(.*?)</tr>"));
static TITLE: LazyLock<Regex> = LazyLock::new(|| pattern(r#"title=\\"(.+?)\\""#));
static HREF: LazyLock<Regex> = LazyLock::new(|| pattern(r#"href=\\"([^"\\]+)\\""#));
static SIZE: LazyLock<Regex> = LazyLock::new(|| pattern(r"<td>([^<]+)</td>"));
static SEEDS: LazyLock<Regex> =
    LazyLock::new(|| pattern(r#"style=\\"color: green;\\">([\d,]+)</span>"#));
static LEECHES: LazyLock<Regex> =
    LazyLock::new(|| pattern(r#"style=\\"color: red;\\">([\d,]+)</span>"#));
static MAGNET: LazyLock<Regex> = LazyLock::new(|| pattern(r#"href=\\"(magnet:[^"\\]+)\\""#));

struct Listing {
    detail_url: String,
    name: String,
    size: String,
    seeders: u32,
    leechers: u32,
}

/// TorrentProject.
pub struct TorrentProject {
    config: EngineConfig,
    fetcher: Arc<dyn PageFetcher>,
    base_url: String,
}

impl TorrentProject {
    /// Creates a new TorrentProject engine.
    pub fn new(fetcher: Arc<dyn PageFetcher>) -> Self {
        Self {
            config: EngineConfig {
                name: "TorrentProject".to_string(),
                shortcut: "torrentproject".to_string(),
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
        format!("{}/browse?t={}", self.base_url, query.encoded_terms())
    }

    fn parse_listing(&self, html: &str) -> Vec<Listing> {
        let rows = ROW.captures_iter(html).filter_map(|c| c.get(1)).map(|m| m.as_str());
        parse_rows(self.name(), rows, |row| {
            let name = require(&TITLE, row, "name")?;
            let href = require(&HREF, row, "link")?;
            Ok(Listing {
                detail_url: join_url(&self.base_url, href),
                name: name.to_string(),
                size: capture(&SIZE, row).unwrap_or_default().to_string(),
                seeders: capture(&SEEDS, row).map(parse_count).unwrap_or(0),
                leechers: capture(&LEECHES, row).map(parse_count).unwrap_or(0),
            })
        })
    }

    async fn resolve(&self, listing: Listing) -> Option<TorrentResult> {
        let page = match self.fetcher.get(&listing.detail_url).await {
            Ok(page) => page,
            Err(e) => {
                debug!("{}: detail page {} failed: {}", self.name(), listing.detail_url, e);
                return None;
            }
        };
        let magnet = capture(&MAGNET, &page).and_then(checked_magnet)?;
        Some(
            self.result(&listing.name, magnet)
                .with_size_text(&listing.size)
                .with_peers(listing.seeders, listing.leechers)
                .with_description_link(listing.detail_url)
                .with_category_label("Unknown"),
        )
    }
}

#[async_trait]
impl Engine for TorrentProject {
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
        let listings = self.parse_listing(&html);
        Ok(resolve_rows(listings, |listing| self.resolve(listing)).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::literal_text;
    use crate::fetcher::testing::StaticFetcher;
    use crate::Category;

    const LISTING: &str = r#"<table>
        <tr class='gac_bb'><td><a href="/t1/big-buck-bunny" title="Big Buck Bunny 1080p">Big Buck Bunny 1080p</a></td>
            <td>885.3 MB</td><td><span style="color: green;">312</span></td><td><span style="color: red;">7</span></td></tr>
        <tr class='gac_bb'><td><span>no link here</span></td><td>1 GB</td></tr>
        <tr class='gac_bb'><td><a href="https://mirror.test/t2/sintel" title="Sintel">Sintel</a></td>
            <td>1.2 GB</td><td><span style="color: green;">2,001</span></td><td><span style="color: red;">15</span></td></tr>
    </table>"#;

    const DETAIL: &str = r#"<div><a href="magnet:?xt=urn:btih:dd8255ecdc7ca55fb0bbf81323d87062db1f6d1c&amp;dn=Big+Buck+Bunny">Magnet</a></div>"#;

    fn engine(fetcher: StaticFetcher) -> TorrentProject {
        TorrentProject::new(Arc::new(fetcher)).with_base_url("https://tp.test")
    }

    #[test]
    fn test_search_url_ignores_category() {
        let engine = engine(StaticFetcher::new());
        let query = SearchQuery::new("big buck").with_category(Category::Movies);
        assert_eq!(engine.search_url(&query), "https://tp.test/browse?t=big%20buck");
    }

    #[test]
    fn test_parse_listing_skips_rows_without_link() {
        let engine = engine(StaticFetcher::new());
        let listings = engine.parse_listing(&literal_text(LISTING));
        assert_eq!(listings.len(), 2);
        assert_eq!(listings[0].detail_url, "https://tp.test/t1/big-buck-bunny");
        assert_eq!(listings[0].size, "885.3 MB");
        assert_eq!((listings[0].seeders, listings[0].leechers), (312, 7));
        assert_eq!(listings[1].detail_url, "https://mirror.test/t2/sintel");
        assert_eq!(listings[1].seeders, 2001);
    }

    #[tokio::test]
    async fn test_placeholder_hash_on_detail_page_dropped() {
        let detail = DETAIL.replace(
            "dd8255ecdc7ca55fb0bbf81323d87062db1f6d1c",
            crate::magnet::NULL_INFO_HASH,
        );
        let fetcher = StaticFetcher::new()
            .with_page("https://tp.test/browse", LISTING)
            .with_page("https://tp.test/t1/", detail);
        assert!(engine(fetcher).search(&SearchQuery::new("bunny")).await.is_empty());
    }

    #[tokio::test]
    async fn test_search_end_to_end() {
        let fetcher = StaticFetcher::new()
            .with_page("https://tp.test/browse", LISTING)
            .with_page("https://tp.test/t1/", DETAIL);
        let results = engine(fetcher).search(&SearchQuery::new("bunny")).await;

        assert_eq!(results.len(), 1);
        let result = &results[0];
        assert_eq!(result.name, "Big Buck Bunny 1080p");
        assert_eq!(
            result.link,
            "magnet:?xt=urn:btih:dd8255ecdc7ca55fb0bbf81323d87062db1f6d1c&dn=Big+Buck+Bunny"
        );
        assert_eq!(result.category_label, "Unknown");
        assert_eq!(result.size_display, "885.3 MB");
    }
}
