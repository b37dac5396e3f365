//! TorLock.
//!
//! Listing rows expose only the numeric torrent id, and the magnet link is
//! built from that id as if it were an info-hash. Such links do not resolve
//! in BitTorrent clients; the record still carries a working description
//! link.

use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use super::{capitalize, capture, join_url, parse_count, parse_rows, pattern, selector};
use crate::error::ParseError;
use crate::fetcher::PageFetcher;
use crate::magnet::magnet_link;
use crate::{Category, CategoryMap, Engine, EngineConfig, Result, SearchQuery, TorrentResult};

const SITE_URL: &str = "https://www.torlock.com";

const CATEGORIES: CategoryMap = CategoryMap::new(
    "all",
    &[
        (Category::Anime, "anime"),
        (Category::Software, "software"),
        (Category::Games, "game"),
        (Category::Movies, "movie"),
        (Category::Music, "music"),
        (Category::Tv, "television"),
        (Category::Books, "ebooks"),
    ],
);

static TORRENT_ID: LazyLock<Regex> = LazyLock::new(|| pattern(r"^/torrent/(\d+)/"));

/// TorLock.
pub struct TorLock {
    config: EngineConfig,
    fetcher: Arc<dyn PageFetcher>,
    base_url: String,
}

impl TorLock {
    /// Creates a new TorLock engine.
    pub fn new(fetcher: Arc<dyn PageFetcher>) -> Self {
        Self {
            config: EngineConfig {
                name: "TorLock".to_string(),
                shortcut: "torlock".to_string(),
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
        let slug = query.terms().split_whitespace().collect::<Vec<_>>().join("-");
        format!(
            "{}/{}/torrents/{}.html?sort=seeds",
            self.base_url,
            CATEGORIES.token(query.category),
            urlencoding::encode(&slug)
        )
    }

    fn parse_results(&self, html: &str, label: &str) -> Result<Vec<TorrentResult>> {
        let document = Html::parse_document(html);
        let row_selector = selector("tr")?;
        let link_selector = selector(r#"a[href^="/torrent/"]"#)?;
        let size_selector = selector("td.ts")?;
        let seeds_selector = selector("td.tul")?;
        let leeches_selector = selector("td.tdl")?;

        let rows = document
            .select(&row_selector)
            .filter(|row| row.select(&link_selector).next().is_some());
        let results = parse_rows(self.name(), rows, |row| {
            let anchor = row
                .select(&link_selector)
                .next()
                .ok_or(ParseError::MissingField("link"))?;
            let href = anchor.value().attr("href").unwrap_or_default();
            let id = capture(&TORRENT_ID, href).ok_or(ParseError::MissingField("id"))?;
            let name = cell_text(anchor);
            if name.is_empty() {
                return Err(ParseError::MissingField("name"));
            }
            let link = magnet_link(id, &name).ok_or(ParseError::MissingField("id"))?;

            Ok(self
                .result(&name, link)
                .with_size_text(&first_text(row, &size_selector))
                .with_peers(
                    parse_count(&first_text(row, &seeds_selector)),
                    parse_count(&first_text(row, &leeches_selector)),
                )
                .with_description_link(join_url(&self.base_url, href))
                .with_category_label(label))
        });
        Ok(results)
    }
}

fn cell_text(element: ElementRef) -> String {
    element.text().collect::<String>().trim().to_string()
}

fn first_text(row: ElementRef, selector: &Selector) -> String {
    row.select(selector).next().map(cell_text).unwrap_or_default()
}

#[async_trait]
impl Engine for TorLock {
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
        let html = self.fetcher.get_raw(&self.search_url(query)).await?;
        let label = capitalize(CATEGORIES.token(query.category));
        self.parse_results(&html, &label)
    }
}
