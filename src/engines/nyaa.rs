//! Nyaa, anime and Asian media.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use scraper::{ElementRef, Html};

use super::{join_url, parse_count, parse_rows, selector};
use crate::error::ParseError;
use crate::fetcher::PageFetcher;
use crate::magnet::checked_magnet;
use crate::{Category, CategoryMap, Engine, EngineConfig, Result, SearchQuery, TorrentResult};

const SITE_URL: &str = "https://nyaa.si";

const CATEGORIES: CategoryMap = CategoryMap::new(
    "0_0",
    &[
        (Category::Anime, "1_0"),
        (Category::Music, "2_0"),
        (Category::Books, "3_0"),
        (Category::Software, "6_1"),
        (Category::Games, "6_2"),
    ],
);

/// Nyaa.
pub struct Nyaa {
    config: EngineConfig,
    fetcher: Arc<dyn PageFetcher>,
    base_url: String,
}

impl Nyaa {
    /// Creates a new Nyaa engine.
    pub fn new(fetcher: Arc<dyn PageFetcher>) -> Self {
        Self {
            config: EngineConfig {
                name: "Nyaa.si".to_string(),
                shortcut: "nyaa".to_string(),
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
            "{}/?f=0&c={}&q={}&s=seeders&o=desc",
            self.base_url,
            CATEGORIES.token(query.category),
            query.encoded_terms()
        )
    }

    fn parse_results(&self, html: &str) -> Result<Vec<TorrentResult>> {
        let document = Html::parse_document(html);
        let row_selector = selector("table.torrent-list tbody tr")?;
        let cell_selector = selector("td")?;
        let category_selector = selector("a[title]")?;
        let name_selector = selector(r#"a[href^="/view/"]:not(.comments)"#)?;
        let magnet_selector = selector(r#"a[href^="magnet:"]"#)?;

        let results = parse_rows(self.name(), document.select(&row_selector), |row| {
            let cells: Vec<ElementRef> = row.select(&cell_selector).collect();
            if cells.len() < 7 {
                return Err(ParseError::MissingField("cells"));
            }

            let anchor = cells[1]
                .select(&name_selector)
                .last()
                .ok_or(ParseError::MissingField("name"))?;
            let name = anchor
                .value()
                .attr("title")
                .map(str::to_string)
                .unwrap_or_else(|| text(anchor));
            if name.is_empty() {
                return Err(ParseError::MissingField("name"));
            }
            let view = anchor.value().attr("href").unwrap_or_default();

            let magnet = cells[2]
                .select(&magnet_selector)
                .next()
                .and_then(|a| a.value().attr("href"))
                .ok_or(ParseError::MissingField("magnet"))?;
            let magnet = checked_magnet(magnet)
                .ok_or_else(|| ParseError::Malformed(format!("unusable magnet link {}", magnet)))?;

            let category = cells[0]
                .select(&category_selector)
                .next()
                .and_then(|a| a.value().attr("title"))
                .unwrap_or("Unknown");

            let mut result = self
                .result(&name, magnet)
                .with_size_text(&text(cells[3]))
                .with_peers(parse_count(&text(cells[5])), parse_count(&text(cells[6])))
                .with_description_link(join_url(&self.base_url, view))
                .with_category_label(category);
            if let Some(published) = published_at(cells[4]) {
                result = result.with_published_at(published);
            }
            Ok(result)
        });

        Ok(results)
    }
}

fn text(element: ElementRef) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Reads the `data-timestamp` attribute, or the `YYYY-MM-DD HH:MM` text
/// interpreted as UTC.
fn published_at(cell: ElementRef) -> Option<i64> {
    if let Some(ts) = cell
        .value()
        .attr("data-timestamp")
        .and_then(|ts| ts.trim().parse().ok())
    {
        return Some(ts);
    }
    NaiveDateTime::parse_from_str(&text(cell), "%Y-%m-%d %H:%M")
        .ok()
        .map(|dt| dt.and_utc().timestamp())
}

#[async_trait]
impl Engine for Nyaa {
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
        self.parse_results(&html)
    }
}
