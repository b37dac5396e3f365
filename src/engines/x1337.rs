//! 1337x.
//!
//! Listing pages are walked up to `max_pages`; magnets come from each
//! row's detail page.

use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use regex::Regex;
use scraper::{ElementRef, Html};
use tracing::debug;

use super::{capture, join_url, parse_count, parse_rows, pattern, resolve_rows, selector};
use crate::error::ParseError;
use crate::fetcher::PageFetcher;
use crate::magnet::checked_magnet;
use crate::{Category, CategoryMap, Engine, EngineConfig, Result, SearchQuery, TorrentResult};

const SITE_URL: &str = "https://1337x.to";

/// Rows on a full listing page; fewer means the last page was reached.
const FULL_PAGE: usize = 20;

const CATEGORIES: CategoryMap = CategoryMap::new(
    "All",
    &[
        (Category::Movies, "Movies"),
        (Category::Tv, "TV"),
        (Category::Music, "Music"),
        (Category::Games, "Games"),
        (Category::Anime, "Anime"),
        (Category::Software, "Apps"),
    ],
);

static MAGNET: LazyLock<Regex> = LazyLock::new(|| pattern(r#"href=\\"(magnet:[^"\\]+)\\""#));

struct Listing {
    detail_url: String,
    name: String,
    size: String,
    seeders: u32,
    leechers: u32,
}

/// 1337x.
pub struct X1337 {
    config: EngineConfig,
    fetcher: Arc<dyn PageFetcher>,
    base_url: String,
}

impl X1337 {
    /// Creates a new 1337x engine.
    pub fn new(fetcher: Arc<dyn PageFetcher>) -> Self {
        Self {
            config: EngineConfig {
                name: "1337x".to_string(),
                shortcut: "1337x".to_string(),
                max_pages: 2,
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

    fn page_url(&self, query: &SearchQuery, page: u32) -> String {
        let terms = query.encoded_terms();
        if CATEGORIES.is_all(query.category) {
            format!("{}/search/{}/{}/", self.base_url, terms, page)
        } else {
            format!(
                "{}/category-search/{}/{}/{}/",
                self.base_url,
                terms,
                CATEGORIES.token(query.category),
                page
            )
        }
    }

    /// Returns the parsed rows and the raw row count of the page.
    fn parse_listing(&self, html: &str) -> Result<(Vec<Listing>, usize)> {
        let document = Html::parse_document(html);
        let row_selector = selector("table.table-list tbody tr")?;
        let name_selector = selector(r#"td.name a[href^="/torrent/"]"#)?;
        let size_selector = selector("td.size")?;
        let seeds_selector = selector("td.seeds")?;
        let leeches_selector = selector("td.leeches")?;

        let rows: Vec<ElementRef> = document.select(&row_selector).collect();
        let count = rows.len();
        let listings = parse_rows(self.name(), rows, |row| {
            let anchor = row
                .select(&name_selector)
                .next()
                .ok_or(ParseError::MissingField("name"))?;
            let name = anchor.text().collect::<String>().trim().to_string();
            let href = anchor.value().attr("href").unwrap_or_default();
            if name.is_empty() {
                return Err(ParseError::MissingField("name"));
            }

            // The size cell also nests the uploader's seed count in a span.
            let size = row
                .select(&size_selector)
                .next()
                .and_then(|td| td.text().next())
                .unwrap_or_default()
                .trim()
                .to_string();
            let count_of = |s: &scraper::Selector| {
                row.select(s)
                    .next()
                    .map(|td| parse_count(&td.text().collect::<String>()))
                    .unwrap_or(0)
            };

            Ok(Listing {
                detail_url: join_url(&self.base_url, href),
                name,
                size,
                seeders: count_of(&seeds_selector),
                leechers: count_of(&leeches_selector),
            })
        });
        Ok((listings, count))
    }

    async fn resolve(&self, listing: Listing, label: &str) -> Option<TorrentResult> {
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
                .with_category_label(label),
        )
    }
}

#[async_trait]
impl Engine for X1337 {
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
        let mut listings = Vec::new();
        for page in 1..=self.config.max_pages.max(1) {
            let parsed = match self.fetcher.get_raw(&self.page_url(query, page)).await {
                Ok(html) => self.parse_listing(&html),
                Err(e) => Err(e.into()),
            };
            let (rows, count) = match parsed {
                Ok(parsed) => parsed,
                Err(e) if page == 1 => return Err(e),
                Err(e) => {
                    debug!("{}: page {} failed, keeping earlier pages: {}", self.name(), page, e);
                    break;
                }
            };
            listings.extend(rows);
            if count < FULL_PAGE {
                break;
            }
        }

        let label = CATEGORIES.token(query.category);
        Ok(resolve_rows(listings, |listing| self.resolve(listing, label)).await)
    }
}
