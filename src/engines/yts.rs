//! YTS movie releases, through the list_movies JSON API.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use super::{lenient_u64, peers};
use crate::fetcher::PageFetcher;
use crate::magnet::magnet_link;
use crate::{
    Category, CategoryMap, Engine, EngineConfig, Result, SearchError, SearchQuery, TorrentResult,
};

const SITE_URL: &str = "https://yts.mx";

const CATEGORIES: CategoryMap = CategoryMap::new("All", &[(Category::Movies, "movie")]);

/// YTS.
pub struct Yts {
    config: EngineConfig,
    fetcher: Arc<dyn PageFetcher>,
    base_url: String,
}

#[derive(Deserialize)]
struct ApiResponse {
    status: String,
    #[serde(default)]
    status_message: String,
    data: Option<ApiData>,
}

#[derive(Deserialize)]
struct ApiData {
    #[serde(default)]
    movie_count: u64,
    #[serde(default)]
    movies: Vec<ApiMovie>,
}

#[derive(Deserialize)]
struct ApiMovie {
    title: String,
    #[serde(default, deserialize_with = "lenient_u64")]
    year: u64,
    #[serde(default)]
    url: String,
    #[serde(default)]
    torrents: Vec<ApiTorrent>,
}

#[derive(Deserialize)]
struct ApiTorrent {
    hash: String,
    #[serde(default)]
    quality: String,
    #[serde(default, rename = "type")]
    kind: String,
    #[serde(default, deserialize_with = "lenient_u64")]
    seeds: u64,
    #[serde(default, deserialize_with = "lenient_u64")]
    peers: u64,
    #[serde(default, deserialize_with = "lenient_u64")]
    size_bytes: u64,
    #[serde(default, deserialize_with = "lenient_u64")]
    date_uploaded_unix: u64,
}

impl Yts {
    /// Creates a new YTS engine.
    pub fn new(fetcher: Arc<dyn PageFetcher>) -> Self {
        Self {
            config: EngineConfig {
                name: "YTS".to_string(),
                shortcut: "yts".to_string(),
                timeout: 15,
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
            "{}/api/v2/list_movies.json?query_term={}&limit=50&sort_by=seeds",
            self.base_url,
            query.encoded_terms()
        )
    }

    fn parse_results(&self, json: &str) -> Result<Vec<TorrentResult>> {
        let response: ApiResponse = serde_json::from_str(json)?;
        if response.status != "ok" {
            return Err(SearchError::Parse(format!(
                "YTS status {}: {}",
                response.status, response.status_message
            )));
        }
        let Some(data) = response.data.filter(|d| d.movie_count > 0) else {
            return Ok(Vec::new());
        };

        let mut results = Vec::new();
        for movie in data.movies {
            let title = html_escape::decode_html_entities(&movie.title).into_owned();
            for torrent in movie.torrents {
                let Some(link) = magnet_link(&torrent.hash, &title) else {
                    continue;
                };
                let name = format!(
                    "{} ({}) {} {}",
                    title, movie.year, torrent.quality, torrent.kind
                );
                let mut result = self
                    .result(&name, link)
                    .with_size_bytes(torrent.size_bytes)
                    .with_peers(peers(torrent.seeds), peers(torrent.peers))
                    .with_description_link(movie.url.clone())
                    .with_category_label("Movies");
                if torrent.date_uploaded_unix > 0 {
                    result = result.with_published_at(torrent.date_uploaded_unix as i64);
                }
                results.push(result);
            }
        }
        Ok(results)
    }
}

#[async_trait]
impl Engine for Yts {
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::testing::StaticFetcher;

    const FIXTURE: &str = r#"{
        "status": "ok",
        "status_message": "Query was successful",
        "data": {
            "movie_count": 1,
            "limit": 50,
            "page_number": 1,
            "movies": [{
                "id": 1,
                "url": "https://yts.mx/movies/sintel-2010",
                "title": "Sintel",
                "year": 2010,
                "torrents": [
                    {"hash": "A1B2C3D4E5F60718293A4B5C6D7E8F9012345678", "quality": "720p", "type": "web", "seeds": 40, "peers": 2, "size": "245.3 MB", "size_bytes": 257215283, "date_uploaded": "2019-01-01 00:00:00", "date_uploaded_unix": 1546300800},
                    {"hash": "0000000000000000000000000000000000000000", "quality": "1080p", "type": "web", "seeds": 10, "peers": 1, "size_bytes": 1, "date_uploaded_unix": 0}
                ]
            }]
        }
    }"#;

    fn engine(fetcher: StaticFetcher) -> Yts {
        Yts::new(Arc::new(fetcher)).with_base_url("https://yts.test")
    }

    #[test]
    fn test_yts_new() {
        let engine = engine(StaticFetcher::new());
        assert_eq!(engine.name(), "YTS");
        assert_eq!(engine.shortcut(), "yts");
    }

    #[test]
    fn test_search_url() {
        let engine = engine(StaticFetcher::new());
        assert_eq!(
            engine.search_url(&SearchQuery::new("the matrix")),
            "https://yts.test/api/v2/list_movies.json?query_term=the%20matrix&limit=50&sort_by=seeds"
        );
    }

    #[test]
    fn test_parse_results() {
        let engine = engine(StaticFetcher::new());
        let results = engine.parse_results(FIXTURE).unwrap();
        assert_eq!(results.len(), 1);
        let result = &results[0];
        assert_eq!(result.name, "Sintel (2010) 720p web");
        assert!(result
            .link
            .starts_with("magnet:?xt=urn:btih:A1B2C3D4E5F60718293A4B5C6D7E8F9012345678&dn=Sintel&tr="));
        assert_eq!(result.size_bytes, 257_215_283);
        assert_eq!((result.seeders, result.leechers), (40, 2));
        assert_eq!(result.description_link, "https://yts.mx/movies/sintel-2010");
        assert_eq!(result.category_label, "Movies");
        assert_eq!(result.published_at, 1_546_300_800);
    }

    #[test]
    fn test_parse_no_movies() {
        let engine = engine(StaticFetcher::new());
        let json = r#"{"status":"ok","status_message":"","data":{"movie_count":0,"limit":50}}"#;
        assert!(engine.parse_results(json).unwrap().is_empty());
    }

    #[test]
    fn test_parse_error_status() {
        let engine = engine(StaticFetcher::new());
        let json = r#"{"status":"error","status_message":"bad query"}"#;
        assert!(engine.parse_results(json).is_err());
    }

    #[tokio::test]
    async fn test_search_end_to_end() {
        let fetcher = StaticFetcher::new().with_page("https://yts.test/api/v2/", FIXTURE);
        let engine = engine(fetcher);
        let results = engine
            .search(&SearchQuery::new("sintel").with_category(Category::Music))
            .await;
        assert_eq!(results.len(), 1);
    }
}
