//! Result merging and ranking.

use crate::{SearchResults, TorrentResult};

/// Merges per-source result lists and ranks them by seeders.
///
/// Records are never merged or deduplicated across sources: identical
/// torrents found by two sites appear twice.
#[derive(Debug, Default)]
pub struct Aggregator;

impl Aggregator {
    /// Creates a new aggregator.
    pub fn new() -> Self {
        Self
    }

    /// Concatenates per-source lists in the given order and ranks them.
    pub fn aggregate(&self, source_results: Vec<(String, Vec<TorrentResult>)>) -> SearchResults {
        let merged = source_results
            .into_iter()
            .flat_map(|(_, results)| results)
            .collect();
        SearchResults::from_results(rank(merged))
    }
}

/// Sorts by seeders, descending. The sort is stable, so ties keep their
/// incoming order.
pub fn rank(mut results: Vec<TorrentResult>) -> Vec<TorrentResult> {
    results.sort_by(|a, b| b.seeders.cmp(&a.seeders));
    results
}
