//! Search orchestration.

use std::any::Any;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::task::JoinSet;
use tokio::time::{timeout, timeout_at, Duration, Instant};
use tracing::{debug, info, warn};

use crate::engines;
use crate::fetcher::PageFetcher;
use crate::fetcher_http::HttpFetcher;
use crate::{
    Aggregator, Category, Engine, Result, SearchError, SearchOptions, SearchQuery, SearchResults,
    SourceInfo, TorrentResult,
};

/// Meta search that fans a query out to every registered source.
pub struct Search {
    engines: Vec<Arc<dyn Engine>>,
    aggregator: Aggregator,
    default_timeout: Duration,
}

type TaskOutcome = (usize, String, Result<Vec<TorrentResult>>);

impl Search {
    /// Creates a new search instance with no sources.
    pub fn new() -> Self {
        Self {
            engines: Vec::new(),
            aggregator: Aggregator::new(),
            default_timeout: SearchOptions::default().overall_timeout(),
        }
    }

    /// Creates a search with every built-in source sharing one HTTP fetcher.
    pub fn with_default_engines(options: &SearchOptions) -> Result<Self> {
        let fetcher: Arc<dyn PageFetcher> =
            Arc::new(HttpFetcher::new(options.fetch_timeout(), &options.user_agent)?);
        let mut search = Self::new();
        search.set_timeout(options.overall_timeout());
        for engine in engines::default_engines(fetcher) {
            search.add_shared_engine(engine);
        }
        Ok(search)
    }

    /// Adds a source. A source with the same shortcut is replaced in place.
    pub fn add_engine<E: Engine + 'static>(&mut self, engine: E) {
        self.add_shared_engine(Arc::new(engine));
    }

    /// Adds an already shared source.
    pub fn add_shared_engine(&mut self, engine: Arc<dyn Engine>) {
        match self
            .engines
            .iter()
            .position(|e| e.shortcut() == engine.shortcut())
        {
            Some(index) => self.engines[index] = engine,
            None => self.engines.push(engine),
        }
    }

    /// Sets the overall deadline for searches.
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.default_timeout = timeout;
    }

    /// Returns the number of configured engines.
    pub fn engine_count(&self) -> usize {
        self.engines.len()
    }

    /// Every registered source, in registry order.
    pub fn list_sources(&self) -> Vec<SourceInfo> {
        self.engines
            .iter()
            .map(|e| SourceInfo {
                id: e.shortcut().to_string(),
                display_name: e.name().to_string(),
                categories: e.categories().supported(),
            })
            .collect()
    }

    /// The canonical categories every search accepts.
    pub fn list_categories(&self) -> Vec<Category> {
        Category::ALL.to_vec()
    }

    /// Performs a search across the selected sources.
    ///
    /// Per-source failures, timeouts and panics are reported in
    /// [`SearchResults::errors`] next to the results of the other sources.
    /// A blank query returns no results without contacting any source.
    /// Otherwise only a search with no sources registered at all is an error.
    pub async fn search(&self, query: SearchQuery) -> Result<SearchResults> {
        if query.is_blank() {
            debug!("Empty query, skipping all sources");
            return Ok(SearchResults::new());
        }

        if self.engines.is_empty() {
            return Err(SearchError::NoEngines);
        }

        let start = std::time::Instant::now();
        let deadline = Instant::now() + self.default_timeout;
        let query = Arc::new(query);

        let engines_to_use = self.select_engines(&query);
        debug!("Searching {} sources", engines_to_use.len());

        let mut tasks: JoinSet<TaskOutcome> = JoinSet::new();
        let mut pending: HashMap<usize, String> = HashMap::new();

        for (index, engine) in engines_to_use {
            let query = Arc::clone(&query);
            let id = engine.shortcut().to_string();
            pending.insert(index, id.clone());
            if engine.categories().lookup(query.category).is_none() {
                debug!("{} has no {} category, searching all", id, query.category);
            }

            tasks.spawn(async move {
                let budget = Duration::from_secs(engine.config().timeout);
                let outcome = AssertUnwindSafe(timeout(budget, engine.fetch_results(&query)))
                    .catch_unwind()
                    .await;
                let outcome = match outcome {
                    Ok(Ok(results)) => results,
                    Ok(Err(_)) => Err(SearchError::Timeout),
                    Err(panic) => Err(SearchError::Panicked(panic_message(panic.as_ref()))),
                };
                (index, id, outcome)
            });
        }

        let mut completed: Vec<(usize, String, Vec<TorrentResult>)> = Vec::new();
        let mut failures: Vec<(usize, String, String)> = Vec::new();

        loop {
            match timeout_at(deadline, tasks.join_next()).await {
                Ok(Some(Ok((index, id, outcome)))) => {
                    pending.remove(&index);
                    match outcome {
                        Ok(results) => {
                            info!("Got {} results from {}", results.len(), id);
                            completed.push((index, id, results));
                        }
                        Err(e) => {
                            warn!("Source {} failed: {}", id, e);
                            failures.push((index, id, e.to_string()));
                        }
                    }
                }
                Ok(Some(Err(e))) => {
                    warn!("Source task did not complete: {}", e);
                }
                Ok(None) => break,
                Err(_) => {
                    warn!(
                        "Search deadline reached, abandoning {} sources",
                        pending.len()
                    );
                    tasks.detach_all();
                    break;
                }
            }
        }

        for (index, id) in pending {
            failures.push((index, id, SearchError::Timeout.to_string()));
        }

        completed.sort_by_key(|(index, _, _)| *index);
        failures.sort_by_key(|(index, _, _)| *index);

        let mut search_results = self.aggregator.aggregate(
            completed
                .into_iter()
                .map(|(_, id, results)| (id, results))
                .collect(),
        );
        for (_, id, message) in failures {
            search_results.add_error(id, message);
        }
        if let Some(limit) = query.limit {
            search_results.truncate(limit);
        }
        search_results.set_duration(start.elapsed().as_millis() as u64);

        Ok(search_results)
    }

    /// Selects enabled engines, restricted to the query's sources if any.
    fn select_engines(&self, query: &SearchQuery) -> Vec<(usize, Arc<dyn Engine>)> {
        for unknown in query
            .sources
            .iter()
            .filter(|id| !self.engines.iter().any(|e| e.shortcut() == id.as_str()))
        {
            debug!("Unknown source '{}' ignored", unknown);
        }

        self.engines
            .iter()
            .enumerate()
            .filter(|(_, engine)| {
                engine.is_enabled()
                    && (query.sources.is_empty()
                        || query.sources.iter().any(|id| id == engine.shortcut()))
            })
            .map(|(index, engine)| (index, Arc::clone(engine)))
            .collect()
    }
}

impl Default for Search {
    fn default() -> Self {
        Self::new()
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
