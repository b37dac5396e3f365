//! LimeTorrents.
//!
//! Listing rows carry no hash; each row costs one extra detail-page fetch.

use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use regex::{Captures, Regex};
use tracing::debug;

use super::{capitalize, join_url, parse_count, parse_rows, pattern, resolve_rows};
use crate::error::ParseError;
use crate::fetcher::PageFetcher;
use crate::magnet::{is_info_hash, magnet_link};
use crate::{Category, CategoryMap, Engine, EngineConfig, Result, SearchQuery, TorrentResult};

const SITE_URL: &str = "https://www.limetorrents.pro";

const CATEGORIES: CategoryMap = CategoryMap::new(
    "all",
    &[
        (Category::Movies, "movies"),
        (Category::Tv, "tv"),
        (Category::Music, "music"),
        (Category::Games, "games"),
        (Category::Software, "applications"),
    ],
);

static ROW: LazyLock<Regex> = LazyLock::new(|| {
    pattern(concat!(
        r#"(?s)<div class=\\"tt-name\\">(?:<a[^>]*></a>)?<a href=\\"([^"\\]+)\\"[^>]*>([^<]+)</a>"#,
        r#".*?<div class=\\"tt-size\\"><span>([^<]+)</span></div>"#,
        r#".*?<div class=\\"ttseed\\">([^<]+)</div>"#,
        r#".*?<div class=\\"ttleech\\">([^<]+)</div>"#,
    ))
});

static INFO_HASH: LazyLock<Regex> = LazyLock::new(|| pattern(r"\b([a-fA-F0-9]{40})\b"));

/// A listing row waiting for its detail page.
struct Listing {
    href: String,
    name: String,
    size: String,
    seeders: u32,
    leechers: u32,
}

/// LimeTorrents.
pub struct LimeTorrents {
    config: EngineConfig,
    fetcher: Arc<dyn PageFetcher>,
    base_url: String,
}

impl LimeTorrents {
    /// Creates a new LimeTorrents engine.
    pub fn new(fetcher: Arc<dyn PageFetcher>) -> Self {
        Self {
            config: EngineConfig {
                name: "LimeTorrents".to_string(),
                shortcut: "limetorrents".to_string(),
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
        let terms = query.encoded_terms();
        if CATEGORIES.is_all(query.category) {
            format!("{}/search/{}/1/", self.base_url, terms)
        } else {
            format!(
                "{}/search/{}/category/{}/1/",
                self.base_url,
                terms,
                CATEGORIES.token(query.category)
            )
        }
    }

    fn parse_listing(&self, html: &str) -> Vec<Listing> {
        parse_rows(self.name(), ROW.captures_iter(html), |row: Captures| {
            let href = row.get(1).map(|m| m.as_str()).unwrap_or_default();
            let name = row.get(2).map(|m| m.as_str().trim()).unwrap_or_default();
            if href.is_empty() || name.is_empty() {
                return Err(ParseError::MissingField("name"));
            }
            Ok(Listing {
                href: href.to_string(),
                name: name.to_string(),
                size: row.get(3).map(|m| m.as_str()).unwrap_or_default().to_string(),
                seeders: row.get(4).map(|m| parse_count(m.as_str())).unwrap_or(0),
                leechers: row.get(5).map(|m| parse_count(m.as_str())).unwrap_or(0),
            })
        })
    }

    async fn resolve(&self, listing: Listing, label: &str) -> Option<TorrentResult> {
        let detail_url = join_url(&self.base_url, &listing.href);
        let page = match self.fetcher.get(&detail_url).await {
            Ok(page) => page,
            Err(e) => {
                debug!("{}: detail page {} failed: {}", self.name(), detail_url, e);
                return None;
            }
        };
        let hash = INFO_HASH
            .captures_iter(&page)
            .filter_map(|c| c.get(1))
            .map(|m| m.as_str())
            .find(|hash| is_info_hash(hash))?;
        let link = magnet_link(hash, &listing.name)?;
        Some(
            self.result(&listing.name, link)
                .with_size_text(&listing.size)
                .with_peers(listing.seeders, listing.leechers)
                .with_description_link(detail_url)
                .with_category_label(label),
        )
    }
}

#[async_trait]
impl Engine for LimeTorrents {
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
        let label = capitalize(CATEGORIES.token(query.category));
        Ok(resolve_rows(listings, |listing| self.resolve(listing, &label)).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::testing::StaticFetcher;

    const LISTING: &str = r#"<table class="table2"><tr>
        <td class="tdleft"><div class="tt-name"><a href="http://itorrents.org/torrent/x.torrent" rel="nofollow" class="csprite_dl14"></a><a href="/Ubuntu-22-04-torrent-101.html">Ubuntu 22.04 &amp; Extras</a></div></td>
        <td class="tdnormal"><div class="tt-size"><span>3.4 GB</span></div></td>
        <td class="tdseed"><div class="ttseed">1,200</div></td>
        <td class="tdleech"><div class="ttleech">40</div></td>
    </tr><tr>
        <td class="tdleft"><div class="tt-name"><a href="/Debian-12-torrent-102.html">Debian 12</a></div></td>
        <td class="tdnormal"><div class="tt-size"><span>650 MB</span></div></td>
        <td class="tdseed"><div class="ttseed">80</div></td>
        <td class="tdleech"><div class="ttleech">-</div></td>
    </tr></table>"#;

    const UBUNTU_DETAIL: &str = r#"<div class="torrentinfo"><p>Infohash : <span>08ADA5A7A6183AAE1E09D831DF6748D566095A10</span></p></div>"#;

    fn engine(fetcher: StaticFetcher) -> LimeTorrents {
        LimeTorrents::new(Arc::new(fetcher)).with_base_url("https://lime.test")
    }

    #[test]
    fn test_limetorrents_new() {
        let engine = engine(StaticFetcher::new());
        assert_eq!(engine.name(), "LimeTorrents");
        assert_eq!(engine.shortcut(), "limetorrents");
    }

    #[test]
    fn test_search_url() {
        let engine = engine(StaticFetcher::new());
        assert_eq!(
            engine.search_url(&SearchQuery::new("ubuntu iso")),
            "https://lime.test/search/ubuntu%20iso/1/"
        );
        assert_eq!(
            engine.search_url(&SearchQuery::new("ubuntu").with_category(Category::Software)),
            "https://lime.test/search/ubuntu/category/applications/1/"
        );
        assert_eq!(
            engine.search_url(&SearchQuery::new("ubuntu").with_category(Category::Anime)),
            "https://lime.test/search/ubuntu/1/"
        );
    }

    #[test]
    fn test_parse_listing() {
        let engine = engine(StaticFetcher::new());
        let listings = engine.parse_listing(&crate::fetcher::literal_text(LISTING));
        assert_eq!(listings.len(), 2);
        assert_eq!(listings[0].href, "/Ubuntu-22-04-torrent-101.html");
        assert_eq!(listings[0].name, "Ubuntu 22.04 & Extras");
        assert_eq!(listings[0].size, "3.4 GB");
        assert_eq!((listings[0].seeders, listings[0].leechers), (1200, 40));
        assert_eq!((listings[1].seeders, listings[1].leechers), (80, 0));
    }

    #[tokio::test]
    async fn test_search_resolves_detail_pages() {
        let fetcher = Arc::new(
            StaticFetcher::new()
                .with_page("https://lime.test/search/", LISTING)
                .with_page("https://lime.test/Ubuntu-22-04-torrent-101.html", UBUNTU_DETAIL)
                .with_page("https://lime.test/Debian-12-torrent-102.html", "<p>no hash</p>"),
        );
        let engine = LimeTorrents::new(fetcher.clone()).with_base_url("https://lime.test");

        let results = engine.search(&SearchQuery::new("linux")).await;
        assert_eq!(fetcher.calls(), 3);
        assert_eq!(results.len(), 1);

        let result = &results[0];
        assert_eq!(result.name, "Ubuntu 22.04 & Extras");
        assert!(result.link.starts_with(
            "magnet:?xt=urn:btih:08ADA5A7A6183AAE1E09D831DF6748D566095A10&dn=Ubuntu%2022.04%20%26%20Extras&tr="
        ));
        assert_eq!(result.size_bytes, (3.4f64 * (1u64 << 30) as f64) as u64);
        assert_eq!(result.description_link, "https://lime.test/Ubuntu-22-04-torrent-101.html");
        assert_eq!(result.category_label, "All");
        assert!(result.published_approximate);
    }

    #[tokio::test]
    async fn test_detail_failure_drops_row_only() {
        let fetcher = StaticFetcher::new()
            .with_page("https://lime.test/search/", LISTING)
            .with_page("https://lime.test/Debian-12-torrent-102.html", UBUNTU_DETAIL);
        let results = engine(fetcher)
            .search(&SearchQuery::new("linux").with_category(Category::Software))
            .await;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].name, "Debian 12");
        assert_eq!(results[0].category_label, "Applications");
    }

    #[tokio::test]
    async fn test_placeholder_hash_skipped_for_real_one() {
        let detail = format!(
            r#"<p>Related: <span>{}</span></p><p>Infohash : <span>08ADA5A7A6183AAE1E09D831DF6748D566095A10</span></p>"#,
            crate::magnet::NULL_INFO_HASH
        );
        let fetcher = StaticFetcher::new()
            .with_page("https://lime.test/search/", LISTING)
            .with_page("https://lime.test/Ubuntu-22-04-torrent-101.html", detail)
            .with_page(
                "https://lime.test/Debian-12-torrent-102.html",
                format!("<span>{}</span>", crate::magnet::NULL_INFO_HASH),
            );
        let results = engine(fetcher).search(&SearchQuery::new("linux")).await;
        assert_eq!(results.len(), 1);
        assert!(results[0]
            .link
            .starts_with("magnet:?xt=urn:btih:08ADA5A7A6183AAE1E09D831DF6748D566095A10&"));
    }
}
