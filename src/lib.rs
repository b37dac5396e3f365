//! # torrent-search
//!
//! A concurrent torrent search aggregator.
//!
//! One query fans out to every registered torrent index at once. Each
//! source is scraped or queried through its JSON API, its rows are
//! normalized into [`TorrentResult`] records, and the combined list is
//! ranked by seeders. A slow or broken source never takes the rest down:
//! its failure is reported next to the results.
//!
//! ## Example
//!
//! ```rust,no_run
//! use torrent_search::{Category, Search, SearchOptions, SearchQuery};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let search = Search::with_default_engines(&SearchOptions::default())?;
//!
//!     let query = SearchQuery::new("big buck bunny")
//!         .with_category(Category::Movies)
//!         .with_limit(10);
//!     let results = search.search(query).await?;
//!
//!     for result in results.items() {
//!         println!("{} [{}] S:{} {}", result.name, result.size_display, result.seeders, result.link);
//!     }
//!     for failure in results.errors() {
//!         eprintln!("{}: {}", failure.source_id, failure.message);
//!     }
//!     Ok(())
//! }
//! ```

mod aggregator;
mod category;
mod config;
mod engine;
mod error;
mod query;
mod result;
mod search;

pub mod engines;
pub mod fetcher;
pub mod fetcher_http;
pub mod magnet;
pub mod size;

pub use aggregator::{rank, Aggregator};
pub use category::{Category, CategoryMap};
pub use config::SearchOptions;
pub use engine::{Engine, EngineConfig};
pub use error::{FetchError, ParseError, Result, SearchError};
pub use fetcher::{FetchRequest, PageFetcher, TextMode};
pub use fetcher_http::HttpFetcher;
pub use query::SearchQuery;
pub use result::{SearchResults, SourceFailure, SourceInfo, TorrentResult};
pub use search::Search;
