//! Sift library
//!
//! Runs web searches through a pluggable [`search::QueryEngine`] and keeps a
//! durable, date-addressable [`history::SearchHistory`] of executed searches
//! with per-result click counts.

pub mod cli;
pub mod config;
pub mod history;
pub mod logging;
pub mod search;

pub use history::{HistoryError, SearchHistory};
pub use search::{QueryEngine, Search, SearchError, SearchResult};
