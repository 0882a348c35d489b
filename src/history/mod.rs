//! Durable, chronologically ordered log of executed searches.
//!
//! The whole log is rewritten on every change. Writes land in a sibling
//! temporary file first and are renamed over the log, so the last successful
//! flush survives a failed one.

use crate::search::Search;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// File name used when no history location is configured
pub const DEFAULT_HISTORY_FILE: &str = "history.ser";

const FORMAT_VERSION: u32 = 1;

/// History persistence errors
#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    #[error("Failed to read history file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse history file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Unsupported history format version {found} in {}", path.display())]
    UnsupportedVersion { path: PathBuf, found: u32 },

    #[error("Failed to write history file {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize history: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("Search for '{0}' has not been executed")]
    NotExecuted(String),

    #[error("No history entry at index {0}")]
    EntryOutOfRange(usize),

    #[error("History entry {entry} has no result at index {result}")]
    ResultOutOfRange { entry: usize, result: usize },
}

impl HistoryError {
    /// The stored log exists but could not be loaded
    pub fn is_load_failure(&self) -> bool {
        matches!(
            self,
            Self::Read { .. } | Self::Parse { .. } | Self::UnsupportedVersion { .. }
        )
    }

    /// A change may not have reached the disk
    pub fn is_write_failure(&self) -> bool {
        matches!(self, Self::Write { .. } | Self::Serialize(_))
    }
}

/// On-disk layout of the log
#[derive(Serialize)]
struct HistoryFileRef<'a> {
    version: u32,
    searches: &'a [Search],
}

#[derive(Deserialize)]
struct HistoryFile {
    version: u32,
    #[serde(default)]
    searches: Vec<Search>,
}

/// Append-only search history backed by a file.
///
/// Entries are expected to be appended in chronological order. This is not
/// enforced; an out-of-order append is logged and kept as given.
///
/// All operations take `&self`. Mutations hold an internal lock across the
/// append and the flush, so concurrent writers in one process never drop an
/// entry. Writers in other processes are not coordinated.
#[derive(Debug)]
pub struct SearchHistory {
    path: PathBuf,
    entries: Mutex<Vec<Search>>,
}

impl SearchHistory {
    /// Open the history stored at `path`.
    ///
    /// A missing file is created empty. A file that exists but cannot be
    /// parsed is an error; the history is never silently reset.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, HistoryError> {
        let path = path.into();
        let entries = load(&path)?;

        tracing::debug!(
            path = %path.display(),
            entries = entries.len(),
            "search history loaded"
        );

        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    /// Open [`DEFAULT_HISTORY_FILE`] in the current directory
    pub fn open_default() -> Result<Self, HistoryError> {
        Self::open(DEFAULT_HISTORY_FILE)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Append an executed search and flush the log.
    ///
    /// If the flush fails the entry is dropped from memory again, so the
    /// in-memory log never runs ahead of the file.
    pub fn add_entry(&self, search: Search) -> Result<(), HistoryError> {
        let Some(timestamp) = search.timestamp() else {
            return Err(HistoryError::NotExecuted(search.query().to_string()));
        };

        let mut entries = self.lock();

        if let Some(last) = entries.last().and_then(Search::timestamp) {
            if timestamp < last {
                tracing::warn!(
                    query = %search.query(),
                    timestamp = %timestamp,
                    latest = %last,
                    "history entry appended out of chronological order"
                );
            }
        }

        entries.push(search);
        if let Err(e) = persist(&self.path, &entries) {
            entries.pop();
            return Err(e);
        }

        tracing::debug!(entries = entries.len(), "history entry added");
        Ok(())
    }

    /// The last `n` searches, oldest first
    pub fn recent_searches(&self, n: usize) -> Vec<Search> {
        let entries = self.lock();
        let start = entries.len().saturating_sub(n);
        entries[start..].to_vec()
    }

    /// The search stored at `index`
    pub fn get(&self, index: usize) -> Option<Search> {
        self.lock().get(index).cloned()
    }

    /// Every search, oldest first
    pub fn entries(&self) -> Vec<Search> {
        self.lock().clone()
    }

    /// Searches whose timestamp lies in `[begin, end]`, oldest first.
    ///
    /// A missing bound leaves that side open, so `(None, None)` returns the
    /// whole history. An inverted window yields nothing.
    pub fn history_date_ordered(
        &self,
        begin: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Vec<Search> {
        let entries = self.lock();
        let range = date_range_of(&entries, begin, end);
        entries[range].to_vec()
    }

    /// Index window of [`SearchHistory::history_date_ordered`]
    pub fn date_range(
        &self,
        begin: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Range<usize> {
        date_range_of(&self.lock(), begin, end)
    }

    /// Count a click on one stored result and flush the log.
    ///
    /// Returns the updated click count. The stored count is left unchanged if
    /// the flush fails.
    pub fn record_click(&self, entry: usize, result: usize) -> Result<u64, HistoryError> {
        let mut entries = self.lock();

        let mut updated = entries
            .get(entry)
            .cloned()
            .ok_or(HistoryError::EntryOutOfRange(entry))?;
        let item = updated
            .results_mut()
            .get_mut(result)
            .ok_or(HistoryError::ResultOutOfRange { entry, result })?;

        item.increment_click_counter();
        let count = item.click_count();

        let previous = std::mem::replace(&mut entries[entry], updated);
        if let Err(e) = persist(&self.path, &entries) {
            entries[entry] = previous;
            return Err(e);
        }

        tracing::debug!(entry, result, clicks = count, "result click recorded");
        Ok(count)
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Search>> {
        // A panicking holder cannot leave the Vec itself invalid.
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Index window of entries with timestamps inside `[begin, end]`.
///
/// Relies on `entries` being chronologically ordered; searches without a
/// timestamp sort before everything.
fn date_range_of(
    entries: &[Search],
    begin: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
) -> Range<usize> {
    if let (Some(begin), Some(end)) = (begin, end) {
        if begin > end {
            return 0..0;
        }
    }

    let lo = match begin {
        Some(begin) => entries.partition_point(|s| s.timestamp().map_or(true, |t| t < begin)),
        None => 0,
    };
    // No upper bound keeps entries stamped ahead of the local clock.
    let hi = match end {
        Some(end) => entries.partition_point(|s| s.timestamp().map_or(true, |t| t <= end)),
        None => entries.len(),
    };

    if lo >= hi {
        return 0..0;
    }
    lo..hi
}

fn load(path: &Path) -> Result<Vec<Search>, HistoryError> {
    if !path.exists() {
        create_empty(path)?;
        tracing::info!(path = %path.display(), "created empty search history");
        return Ok(Vec::new());
    }

    let content = fs::read_to_string(path).map_err(|source| HistoryError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    if content.trim().is_empty() {
        return Ok(Vec::new());
    }

    let file: HistoryFile = serde_json::from_str(&content).map_err(|source| HistoryError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    if file.version != FORMAT_VERSION {
        return Err(HistoryError::UnsupportedVersion {
            path: path.to_path_buf(),
            found: file.version,
        });
    }

    Ok(file.searches)
}

fn create_empty(path: &Path) -> Result<(), HistoryError> {
    let write_err = |source: std::io::Error| HistoryError::Write {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(write_err)?;
    }
    fs::File::create(path).map_err(write_err)?;
    Ok(())
}

fn persist(path: &Path, entries: &[Search]) -> Result<(), HistoryError> {
    let json = serde_json::to_string(&HistoryFileRef {
        version: FORMAT_VERSION,
        searches: entries,
    })
    .map_err(HistoryError::Serialize)?;

    let tmp_path = temp_path_for(path);
    let write_err = |source: std::io::Error| HistoryError::Write {
        path: path.to_path_buf(),
        source,
    };

    let mut file = fs::File::create(&tmp_path).map_err(write_err)?;
    if let Err(e) = file.write_all(json.as_bytes()).and_then(|()| file.sync_all()) {
        drop(file);
        let _ = fs::remove_file(&tmp_path);
        return Err(write_err(e));
    }
    drop(file);

    if let Err(e) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(write_err(e));
    }

    sync_parent_dir(path);
    Ok(())
}

/// Flush the directory entry of a fresh rename. Best effort: not every
/// platform can open a directory for syncing.
fn sync_parent_dir(path: &Path) {
    let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) else {
        return;
    };
    if let Err(e) = fs::File::open(parent).and_then(|dir| dir.sync_all()) {
        tracing::debug!(dir = %parent.display(), error = %e, "could not sync history directory");
    }
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| DEFAULT_HISTORY_FILE.into());
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    /// Build an executed search with a fixed timestamp
    fn search_at(query: &str, ts: DateTime<Utc>) -> Search {
        serde_json::from_value(json!({
            "query": query,
            "max_results": 10,
            "timestamp": ts,
            "results": [],
            "status": "completed"
        }))
        .unwrap()
    }

    fn t(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, day, 12, 0, 0).unwrap()
    }

    fn queries(searches: &[Search]) -> Vec<&str> {
        searches.iter().map(Search::query).collect()
    }

    fn five() -> Vec<Search> {
        (1..=5).map(|d| search_at(&format!("e{d}"), t(d))).collect()
    }

    #[test]
    fn test_range_inclusive_bounds() {
        let entries = five();
        assert_eq!(date_range_of(&entries, Some(t(2)), Some(t(4))), 1..4);
        assert_eq!(queries(&entries[1..4]), vec!["e2", "e3", "e4"]);
    }

    #[test]
    fn test_range_open_bounds() {
        let entries = five();
        assert_eq!(date_range_of(&entries, None, None), 0..5);
        assert_eq!(date_range_of(&entries, Some(t(3)), None), 2..5);
        assert_eq!(date_range_of(&entries, None, Some(t(3))), 0..3);
    }

    #[test]
    fn test_range_unbounded_keeps_future_entries() {
        let now = Utc::now();
        let entries: Vec<Search> = (0..5)
            .map(|m| search_at(&format!("f{m}"), now + chrono::Duration::minutes(m)))
            .collect();

        assert_eq!(date_range_of(&entries, None, None), 0..5);
        assert_eq!(date_range_of(&entries, Some(now), None), 0..5);
        assert_eq!(
            date_range_of(&entries, None, Some(now + chrono::Duration::minutes(2))),
            0..3
        );
    }

    #[test]
    fn test_persist_replaces_file_and_leaves_no_temp() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join(DEFAULT_HISTORY_FILE);
        std::fs::write(&path, "stale").unwrap();

        persist(&path, &five()).unwrap();

        assert!(!temp_path_for(&path).exists());
        assert_eq!(load(&path).unwrap().len(), 5);
    }

    #[test]
    fn test_range_between_entries() {
        let entries = five();
        let begin = t(2) + chrono::Duration::hours(1);
        let end = t(4) - chrono::Duration::hours(1);
        assert_eq!(date_range_of(&entries, Some(begin), Some(end)), 2..3);
    }

    #[test]
    fn test_range_inverted_is_empty() {
        let entries = five();
        assert!(date_range_of(&entries, Some(t(4)), Some(t(2))).is_empty());
    }

    #[test]
    fn test_range_outside_history_is_empty() {
        let entries = five();
        assert!(date_range_of(&entries, Some(t(20)), Some(t(25))).is_empty());
        let early = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        assert!(date_range_of(&entries, None, Some(early)).is_empty());
    }

    #[test]
    fn test_range_empty_history() {
        assert!(date_range_of(&[], None, None).is_empty());
        assert!(date_range_of(&[], Some(t(1)), Some(t(2))).is_empty());
    }

    #[test]
    fn test_temp_path_is_sibling() {
        let tmp = temp_path_for(Path::new("/data/history.ser"));
        assert_eq!(tmp, PathBuf::from("/data/history.ser.tmp"));
    }

    #[test]
    fn test_error_classification() {
        let load = HistoryError::UnsupportedVersion {
            path: PathBuf::from("h"),
            found: 9,
        };
        assert!(load.is_load_failure());
        assert!(!load.is_write_failure());

        let write = HistoryError::Write {
            path: PathBuf::from("h"),
            source: std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
        };
        assert!(write.is_write_failure());
        assert!(!write.is_load_failure());
    }
}
