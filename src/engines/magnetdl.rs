//! MagnetDL. Listings are filed under the first letter of the query slug
//! and already carry magnets.

use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use regex::Regex;
use tracing::debug;

use super::{capture, join_url, parse_count, parse_rows, pattern, require, require_magnet};
use crate::fetcher::PageFetcher;
use crate::{CategoryMap, Engine, EngineConfig, Result, SearchQuery, TorrentResult};

const SITE_URL: &str = "https://www.magnetdl.com";

/// Rows on a full listing page.
const FULL_PAGE: usize = 40;

const CATEGORIES: CategoryMap = CategoryMap::new("", &[]);

static ROW: LazyLock<Regex> = LazyLock::new(|| pattern(r"(?s)<tr>(.*?)</tr>"));
static MAGNET: LazyLock<Regex> = LazyLock::new(|| pattern(r#"href=\\"(magnet:\?[^"\\]+)\\""#));
static NAME: LazyLock<Regex> =
    LazyLock::new(|| pattern(r#"<td class=\\"n\\"><a href=\\"[^"\\]+\\"[^>]*>([^<]+)</a>"#));
static DETAIL: LazyLock<Regex> =
    LazyLock::new(|| pattern(r#"<td class=\\"n\\"><a href=\\"([^"\\]+)\\""#));
static CATEGORY: LazyLock<Regex> =
    LazyLock::new(|| pattern(r#"<td class=\\"t\d+\\">([^<]+)</td>"#));
static SIZE: LazyLock<Regex> = LazyLock::new(|| pattern(r"<td>([0-9.,]+ [KMGT]i?B)</td>"));
static SEEDS: LazyLock<Regex> = LazyLock::new(|| pattern(r#"<td class=\\"s\\">([\d,]+)</td>"#));
static LEECHES: LazyLock<Regex> = LazyLock::new(|| pattern(r#"<td class=\\"l\\">([\d,]+)</td>"#));

/// MagnetDL.
pub struct MagnetDl {
    config: EngineConfig,
    fetcher: Arc<dyn PageFetcher>,
    base_url: String,
}

impl MagnetDl {
    /// Creates a new MagnetDL engine.
    pub fn new(fetcher: Arc<dyn PageFetcher>) -> Self {
        Self {
            config: EngineConfig {
                name: "MagnetDL".to_string(),
                shortcut: "magnetdl".to_string(),
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
        let slug = query
            .terms()
            .to_lowercase()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join("-");
        let letter = match slug.chars().next() {
            Some(c) if c.is_alphabetic() => c,
            _ => '0',
        };
        format!(
            "{}/{}/{}/{}/",
            self.base_url,
            urlencoding::encode(&letter.to_string()),
            urlencoding::encode(&slug),
            page
        )
    }

    /// Returns the parsed results and the number of magnet rows on the page.
    fn parse_page(&self, html: &str) -> (Vec<TorrentResult>, usize) {
        let rows: Vec<&str> = ROW
            .captures_iter(html)
            .filter_map(|c| c.get(1))
            .map(|m| m.as_str())
            .filter(|row| row.contains("magnet:?"))
            .collect();
        let count = rows.len();

        let results = parse_rows(self.name(), rows, |row| {
            let magnet = require_magnet(&MAGNET, row)?;
            let name = require(&NAME, row, "name")?;
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
                .with_category_label(capture(&CATEGORY, row).unwrap_or("Unknown")))
        });
        (results, count)
    }
}

#[async_trait]
impl Engine for MagnetDl {
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
        let mut results = Vec::new();
        for page in 1..=self.config.max_pages.max(1) {
            let html = match self.fetcher.get(&self.page_url(query, page)).await {
                Ok(html) => html,
                Err(e) if page == 1 => return Err(e.into()),
                Err(e) => {
                    debug!("{}: page {} failed, keeping earlier pages: {}", self.name(), page, e);
                    break;
                }
            };
            let (rows, count) = self.parse_page(&html);
            results.extend(rows);
            if count < FULL_PAGE {
                break;
            }
        }
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::literal_text;
    use crate::fetcher::testing::StaticFetcher;

    fn row(id: u32, name: &str) -> String {
        format!(
            r#"<tr><td class="m"><a href="magnet:?xt=urn:btih:{id:040x}&amp;dn={name}" title="Direct Download" rel="nofollow"><img src="/img/m.gif" alt="Magnet"></a></td><td class="n"><a href="/file/{id}/{name}/" title="{name}">{name}</a></td><td>2 days</td><td class="t5">Software</td><td>1</td><td>3.37 GB</td><td class="s">1,204</td><td class="l">31</td></tr>"#,
            id = id,
            name = name,
        )
    }

    fn page(rows: impl IntoIterator<Item = String>) -> String {
        format!(
            r#"<table class="download"><thead><tr><th>Name</th></tr></thead><tbody>{}<tr><td colspan="8">ad</td></tr></tbody></table>"#,
            rows.into_iter().collect::<String>()
        )
    }

    fn engine(fetcher: Arc<StaticFetcher>) -> MagnetDl {
        MagnetDl::new(fetcher).with_base_url("https://mdl.test")
    }

    #[test]
    fn test_page_url_slug() {
        let engine = engine(Arc::new(StaticFetcher::new()));
        assert_eq!(
            engine.page_url(&SearchQuery::new("Ubuntu  Desktop"), 1),
            "https://mdl.test/u/ubuntu-desktop/1/"
        );
        assert_eq!(
            engine.page_url(&SearchQuery::new("2001 a space odyssey"), 2),
            "https://mdl.test/0/2001-a-space-odyssey/2/"
        );
    }

    #[test]
    fn test_parse_page() {
        let engine = engine(Arc::new(StaticFetcher::new()));
        let html = literal_text(&page([row(1, "ubuntu-22.04")]));
        let (results, count) = engine.parse_page(&html);
        assert_eq!(count, 1);

        let result = &results[0];
        assert_eq!(result.name, "ubuntu-22.04");
        assert_eq!(
            result.link,
            format!("magnet:?xt=urn:btih:{:040x}&dn=ubuntu-22.04", 1)
        );
        assert_eq!(result.size_display, "3.37 GB");
        assert_eq!((result.seeders, result.leechers), (1204, 31));
        assert_eq!(result.description_link, "https://mdl.test/file/1/ubuntu-22.04/");
        assert_eq!(result.category_label, "Software");
    }

    #[tokio::test]
    async fn test_short_page_stops_pagination() {
        let fetcher = Arc::new(
            StaticFetcher::new().with_page("https://mdl.test/u/", page([row(1, "ubuntu")])),
        );
        let results = engine(fetcher.clone()).search(&SearchQuery::new("ubuntu")).await;
        assert_eq!(results.len(), 1);
        assert_eq!(fetcher.calls(), 1);
    }

    #[tokio::test]
    async fn test_full_page_fetches_second_page() {
        let fetcher = Arc::new(
            StaticFetcher::new()
                .with_page("https://mdl.test/u/ubuntu/1/", page((1..=40).map(|i| row(i, "ubuntu"))))
                .with_page("https://mdl.test/u/ubuntu/2/", page([row(99, "ubuntu")])),
        );
        let results = engine(fetcher.clone()).search(&SearchQuery::new("ubuntu")).await;
        assert_eq!(results.len(), 41);
        assert_eq!(fetcher.calls(), 2);
    }

    #[tokio::test]
    async fn test_placeholder_hash_rows_skipped() {
        let null_row = format!(
            r#"<tr><td class="m"><a href="magnet:?xt=urn:btih:{}&amp;dn=x" title="Direct Download"><img></a></td><td class="n"><a href="/file/0/x/" title="x">x</a></td><td class="s">9</td></tr>"#,
            crate::magnet::NULL_INFO_HASH
        );
        let fetcher = Arc::new(
            StaticFetcher::new().with_page("https://mdl.test/u/", page([null_row, row(7, "ubuntu")])),
        );
        let results = engine(fetcher).search(&SearchQuery::new("ubuntu")).await;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].link, format!("magnet:?xt=urn:btih:{:040x}&dn=ubuntu", 7));
    }

    #[tokio::test]
    async fn test_failed_second_page_keeps_first() {
        let fetcher = Arc::new(
            StaticFetcher::new()
                .with_page("https://mdl.test/u/ubuntu/1/", page((1..=40).map(|i| row(i, "ubuntu")))),
        );
        let results = engine(fetcher.clone()).search(&SearchQuery::new("ubuntu")).await;
        assert_eq!(results.len(), 40);
        assert_eq!(fetcher.calls(), 2);
    }

    #[tokio::test]
    async fn test_failed_first_page_is_an_error() {
        let engine = engine(Arc::new(StaticFetcher::new()));
        assert!(engine.fetch_results(&SearchQuery::new("ubuntu")).await.is_err());
    }
}
