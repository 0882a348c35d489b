//! Common test utilities and fixtures

#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use serde_json::json;
use sift::search::{QueryEngine, Search, SearchError, SearchResult};
use std::path::PathBuf;
use tempfile::TempDir;

/// Test fixture owning a temporary directory
pub struct TestFixture {
    /// Temporary directory that gets cleaned up automatically
    pub temp_dir: TempDir,
}

impl TestFixture {
    /// Create a new test fixture with a temporary directory
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        Self { temp_dir }
    }

    /// Get the path to the temporary directory
    pub fn path(&self) -> PathBuf {
        self.temp_dir.path().to_path_buf()
    }

    /// Path of a history file inside the fixture (not created)
    pub fn history_path(&self) -> PathBuf {
        self.path().join("history.ser")
    }

    /// Create a file with given content
    pub fn create_file(&self, name: &str, content: &str) -> PathBuf {
        let filepath = self.path().join(name);
        std::fs::write(&filepath, content).expect("Failed to write test file");
        filepath
    }

    /// Read file content
    pub fn read_file(&self, name: &str) -> String {
        std::fs::read_to_string(self.path().join(name)).expect("Failed to read test file")
    }
}

/// Noon UTC on the given day of March 2024
pub fn day(d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, d, 12, 0, 0).unwrap()
}

/// An executed search with a fixed timestamp and one result per URL
pub fn executed_search(query: &str, ts: DateTime<Utc>, urls: &[&str]) -> Search {
    let results: Vec<serde_json::Value> = urls
        .iter()
        .enumerate()
        .map(|(i, url)| {
            json!({
                "query": query,
                "url": url,
                "headline": format!("{query} #{i}"),
                "summary": format!("summary of {url}"),
                "click_count": 0
            })
        })
        .collect();

    serde_json::from_value(json!({
        "query": query,
        "max_results": 10,
        "timestamp": ts,
        "results": results,
        "status": "completed",
        "engine": "fixture"
    }))
    .expect("fixture search must deserialize")
}

/// In-process engine returning canned URLs, or failing when given none
pub struct StaticEngine {
    pub urls: Vec<String>,
}

impl StaticEngine {
    pub fn new(urls: &[&str]) -> Self {
        Self {
            urls: urls.iter().map(|u| u.to_string()).collect(),
        }
    }
}

#[async_trait::async_trait]
impl QueryEngine for StaticEngine {
    fn name(&self) -> &str {
        "static"
    }

    async fn query_engine(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<SearchResult>, SearchError> {
        if self.urls.is_empty() {
            return Err(SearchError::ApiError("static engine has no results".into()));
        }
        self.urls
            .iter()
            .take(max_results)
            .map(|url| SearchResult::new(query, url, "headline", "summary").map_err(SearchError::from))
            .collect()
    }
}
