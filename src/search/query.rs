use super::{QueryEngine, SearchError, SearchResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Result cap used when the caller does not pick one
pub const DEFAULT_MAX_RESULTS: usize = 10;

/// Where a search is in its lifecycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchStatus {
    /// Constructed, not executed yet
    #[default]
    Pending,
    /// The engine returned results
    Completed,
    /// The engine failed; results are empty
    Failed,
}

/// A single query against a search engine, together with its outcome.
///
/// A search is created with its query text and result cap, then run once with
/// [`Search::execute`]. Running it again replaces the timestamp and results.
/// Once handed to [`crate::history::SearchHistory`] it is only read, except for
/// the click counters of its results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Search {
    query: String,
    max_results: usize,
    #[serde(default)]
    timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    results: Vec<SearchResult>,
    #[serde(default)]
    status: SearchStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    engine: Option<String>,
}

impl Search {
    /// Create a search capped at [`DEFAULT_MAX_RESULTS`] results
    pub fn new(query: impl Into<String>) -> Self {
        Self::with_max_results(query, DEFAULT_MAX_RESULTS)
    }

    /// Create a search with a custom result cap. A cap of 0 is raised to 1.
    pub fn with_max_results(query: impl Into<String>, max_results: usize) -> Self {
        Self {
            query: query.into(),
            max_results: max_results.max(1),
            timestamp: None,
            results: Vec::new(),
            status: SearchStatus::Pending,
            engine: None,
        }
    }

    /// Run the search against `engine`.
    ///
    /// The timestamp is set before the engine is called, so it is present after
    /// this returns whether or not the engine succeeded. On failure the results
    /// stay empty and the status becomes [`SearchStatus::Failed`].
    pub async fn execute(&mut self, engine: &dyn QueryEngine) -> Result<&[SearchResult], SearchError> {
        self.timestamp = Some(Utc::now());
        self.results.clear();
        self.status = SearchStatus::Pending;
        self.engine = Some(engine.name().to_string());

        tracing::debug!(
            query = %self.query,
            engine = engine.name(),
            max_results = self.max_results,
            "executing search"
        );

        match engine.query_engine(&self.query, self.max_results).await {
            Ok(mut results) => {
                if results.len() > self.max_results {
                    tracing::warn!(
                        engine = engine.name(),
                        returned = results.len(),
                        max_results = self.max_results,
                        "engine exceeded result cap, truncating"
                    );
                    results.truncate(self.max_results);
                }
                self.results = results;
                self.status = SearchStatus::Completed;
                Ok(&self.results)
            }
            Err(e) => {
                tracing::warn!(
                    query = %self.query,
                    engine = engine.name(),
                    error = %e,
                    "search failed"
                );
                self.status = SearchStatus::Failed;
                Err(e)
            }
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn max_results(&self) -> usize {
        self.max_results
    }

    /// When the search was last executed; `None` before the first run
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.timestamp
    }

    pub fn results(&self) -> &[SearchResult] {
        &self.results
    }

    pub(crate) fn results_mut(&mut self) -> &mut [SearchResult] {
        &mut self.results
    }

    pub fn status(&self) -> SearchStatus {
        self.status
    }

    /// Name of the engine that last executed this search
    pub fn engine(&self) -> Option<&str> {
        self.engine.as_deref()
    }

    pub fn is_executed(&self) -> bool {
        self.timestamp.is_some()
    }
}
