//! Torrent source implementations.
//!
//! Listing rows that fail to parse are skipped with a debug log; only a
//! response that cannot be read at all fails the whole engine call.

use std::future::Future;
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use regex::Regex;
use scraper::Selector;
use serde::{Deserialize, Deserializer};
use tracing::debug;
use url::Url;

use crate::error::ParseError;
use crate::fetcher::PageFetcher;
use crate::magnet::checked_magnet;
use crate::{Engine, SearchError, TorrentResult};

// JSON APIs
mod eztv;
mod piratebay;
mod torrentscsv;
mod yts;

// HTML listings
mod glotorrents;
mod limetorrents;
mod magnetdl;
mod nyaa;
mod torlock;
mod torrentproject;
mod x1337;

pub use eztv::Eztv;
pub use glotorrents::GloTorrents;
pub use limetorrents::LimeTorrents;
pub use magnetdl::MagnetDl;
pub use nyaa::Nyaa;
pub use piratebay::PirateBay;
pub use torlock::TorLock;
pub use torrentproject::TorrentProject;
pub use torrentscsv::TorrentsCsv;
pub use x1337::X1337;
pub use yts::Yts;

/// Detail pages fetched at once by engines that need a second request per row.
pub(crate) const DETAIL_CONCURRENCY: usize = 4;

/// Builds every built-in engine in registry order, sharing one fetcher.
pub fn default_engines(fetcher: Arc<dyn PageFetcher>) -> Vec<Arc<dyn Engine>> {
    vec![
        Arc::new(PirateBay::new(Arc::clone(&fetcher))),
        Arc::new(Yts::new(Arc::clone(&fetcher))),
        Arc::new(Eztv::new(Arc::clone(&fetcher))),
        Arc::new(Nyaa::new(Arc::clone(&fetcher))),
        Arc::new(LimeTorrents::new(Arc::clone(&fetcher))),
        Arc::new(TorrentProject::new(Arc::clone(&fetcher))),
        Arc::new(TorrentsCsv::new(Arc::clone(&fetcher))),
        Arc::new(X1337::new(Arc::clone(&fetcher))),
        Arc::new(MagnetDl::new(Arc::clone(&fetcher))),
        Arc::new(TorLock::new(Arc::clone(&fetcher))),
        Arc::new(GloTorrents::new(fetcher)),
    ]
}

/// Compiles a pattern known to be valid at compile time.
pub(crate) fn pattern(source: &str) -> Regex {
    match Regex::new(source) {
        Ok(re) => re,
        Err(e) => panic!("invalid built-in pattern {:?}: {}", source, e),
    }
}

pub(crate) fn selector(css: &str) -> crate::Result<Selector> {
    Selector::parse(css)
        .map_err(|e| SearchError::Parse(format!("Failed to parse selector: {:?}", e)))
}

/// First capture group of `re` in `text`.
pub(crate) fn capture<'t>(re: &Regex, text: &'t str) -> Option<&'t str> {
    re.captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim())
}

/// Like [`capture`], failing with the field name when absent.
pub(crate) fn require<'t>(
    re: &Regex,
    text: &'t str,
    field: &'static str,
) -> std::result::Result<&'t str, ParseError> {
    capture(re, text)
        .filter(|s| !s.is_empty())
        .ok_or(ParseError::MissingField(field))
}

/// Like [`require`] for a magnet link, rejecting the all-zero placeholder hash.
pub(crate) fn require_magnet<'t>(
    re: &Regex,
    text: &'t str,
) -> std::result::Result<&'t str, ParseError> {
    let magnet = require(re, text, "magnet")?;
    checked_magnet(magnet)
        .ok_or_else(|| ParseError::Malformed(format!("unusable magnet link {}", magnet)))
}

/// Parses a peer count such as `"1,204"`; anything else is 0.
pub(crate) fn parse_count(text: &str) -> u32 {
    let digits: String = text.trim().chars().filter(|c| *c != ',').collect();
    digits.parse().unwrap_or(0)
}

/// Resolves `href` against a site base URL.
pub(crate) fn join_url(base: &str, href: &str) -> String {
    match Url::parse(base).and_then(|base| base.join(href)) {
        Ok(url) => url.into(),
        Err(_) => format!("{}/{}", base.trim_end_matches('/'), href.trim_start_matches('/')),
    }
}

/// Upper-cases the first letter of a site category token.
pub(crate) fn capitalize(token: &str) -> String {
    let mut chars = token.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Parses each row, logging and skipping the ones that fail.
pub(crate) fn parse_rows<R, T>(
    engine: &str,
    rows: impl IntoIterator<Item = R>,
    parse: impl Fn(R) -> std::result::Result<T, ParseError>,
) -> Vec<T> {
    rows.into_iter()
        .filter_map(|row| match parse(row) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                debug!("{}: skipping row: {}", engine, e);
                None
            }
        })
        .collect()
}

/// Runs a second lookup per row with bounded concurrency, keeping listing
/// order and dropping rows whose lookup yields nothing.
pub(crate) async fn resolve_rows<T, F, Fut>(rows: Vec<T>, resolve: F) -> Vec<TorrentResult>
where
    F: Fn(T) -> Fut,
    Fut: Future<Output = Option<TorrentResult>>,
{
    stream::iter(rows)
        .map(resolve)
        .buffered(DETAIL_CONCURRENCY)
        .filter_map(|resolved| async move { resolved })
        .collect()
        .await
}

/// Accepts a JSON number or a numeric string; anything else is 0.
pub(crate) fn lenient_u64<'de, D>(deserializer: D) -> std::result::Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Number {
        Int(u64),
        Float(f64),
        Text(String),
        Other(serde::de::IgnoredAny),
    }

    Ok(match Option::<Number>::deserialize(deserializer)? {
        Some(Number::Int(n)) => n,
        Some(Number::Float(f)) if f >= 0.0 => f as u64,
        Some(Number::Text(s)) => s.trim().parse().unwrap_or(0),
        _ => 0,
    })
}

/// Accepts a JSON string or number as text.
pub(crate) fn lenient_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<serde_json::Value>::deserialize(deserializer)? {
        Some(serde_json::Value::String(s)) => s,
        Some(serde_json::Value::Number(n)) => n.to_string(),
        _ => String::new(),
    })
}

/// Clamps a JSON count into a peer count.
pub(crate) fn peers(count: u64) -> u32 {
    u32::try_from(count).unwrap_or(u32::MAX)
}
