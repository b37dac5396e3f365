//! GloTorrents (glodls).

use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use regex::Regex;

use super::{
    capitalize, capture, join_url, parse_count, parse_rows, pattern, require, require_magnet,
};
use crate::fetcher::PageFetcher;
use crate::{Category, CategoryMap, Engine, EngineConfig, Result, SearchQuery, TorrentResult};

const SITE_URL: &str = "https://glodls.to";

const CATEGORIES: CategoryMap = CategoryMap::new(
    "0",
    &[
        (Category::Movies, "1"),
        (Category::Tv, "41"),
        (Category::Music, "22"),
        (Category::Games, "10"),
        (Category::Anime, "28"),
        (Category::Software, "18"),
    ],
);

static ROW: LazyLock<Regex> = LazyLock::new(|| pattern(r"(?s)<tr class='t-row'>(.*?)</tr>"));
static TITLE: LazyLock<Regex> = LazyLock::new(|| pattern(r#"title=\\"(.+?)\\""#));
static DETAIL: LazyLock<Regex> = LazyLock::new(|| pattern(r#"href=\\"(/[^"\\]+\.html)\\""#));
static MAGNET: LazyLock<Regex> = LazyLock::new(|| pattern(r#"href=\\"(magnet:[^"\\]+)\\""#));
static SIZE: LazyLock<Regex> = LazyLock::new(|| pattern(r"([0-9.,]+ (?:TB|GB|MB|KB))"));
static SEEDS: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"<font color='green'><b>([\d,]+)</b>"));
static LEECHES: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"<font color='#[0-9a-zA-Z]{6}'><b>([\d,]+)</b>"));

/// GloTorrents.
pub struct GloTorrents {
    config: EngineConfig,
    fetcher: Arc<dyn PageFetcher>,
    base_url: String,
}

impl GloTorrents {
    /// Creates a new GloTorrents engine.
    pub fn new(fetcher: Arc<dyn PageFetcher>) -> Self {
        Self {
            config: EngineConfig {
                name: "GloTorrents".to_string(),
                shortcut: "glotorrents".to_string(),
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
            "{}/search_results.php?search={}&cat={}&order=seeders&by=DESC",
            self.base_url,
            query.encoded_terms(),
            CATEGORIES.token(query.category)
        )
    }

    fn parse_results(&self, html: &str, label: &str) -> Vec<TorrentResult> {
        let rows = ROW.captures_iter(html).filter_map(|c| c.get(1)).map(|m| m.as_str());
        parse_rows(self.name(), rows, |row| {
            let name = require(&TITLE, row, "name")?;
            let magnet = require_magnet(&MAGNET, row)?;
            let description = capture(&DETAIL, row)
                .map(|href| join_url(&self.base_url, href))
                .unwrap_or_else(|| self.base_url.clone());
            Ok(self
                .result(name, magnet)
                .with_size_text(capture(&SIZE, row).unwrap_or_default())
                .with_peers(
                    capture(&SEEDS, row).map(parse_count).unwrap_or(0),
                    capture(&LEECHES, row).map(parse_count).unwrap_or(0),
                )
                .with_description_link(description)
                .with_category_label(label))
        })
    }
}

#[async_trait]
impl Engine for GloTorrents {
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
        Ok(self.parse_results(&html, &capitalize(query.category.key())))
    }
}
