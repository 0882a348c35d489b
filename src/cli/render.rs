use crate::search::{Search, SearchStatus};
use std::fmt::Write;

/// Format one search with its ranked results.
///
/// `index` is the search's 0-based position in the history, if it was stored.
/// Entries and results are shown numbered from 1.
pub fn search(index: Option<usize>, search: &Search) -> String {
    let mut out = String::new();

    let _ = write!(out, "{}", header(search));
    if let Some(index) = index {
        let _ = write!(out, "  [entry {}]", index + 1);
    }
    out.push('\n');

    if search.results().is_empty() {
        out.push_str("  No results found.\n");
        return out;
    }

    for (rank, result) in search.results().iter().enumerate() {
        let _ = writeln!(out, "  {}. {}", rank + 1, result.headline());
        let _ = writeln!(out, "     {}", result.url());
        if !result.summary().is_empty() {
            let _ = writeln!(out, "     {}", result.summary());
        }
        if result.click_count() > 0 {
            let _ = writeln!(out, "     opened {} time(s)", result.click_count());
        }
    }

    out
}

/// Format a run of history entries starting at 0-based `first_index`
pub fn listing(first_index: usize, searches: &[Search]) -> String {
    if searches.is_empty() {
        return "No searches in history.\n".to_string();
    }

    let mut out = String::new();
    for (offset, s) in searches.iter().enumerate() {
        let clicks: u64 = s.results().iter().map(|r| r.click_count()).sum();
        let _ = writeln!(
            out,
            "{:>4}  {}  ({} results, {} clicks)",
            first_index + offset + 1,
            header(s),
            s.results().len(),
            clicks
        );
    }
    out
}

fn header(search: &Search) -> String {
    let when = search
        .timestamp()
        .map(|ts| ts.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "never run".to_string());

    let status = match search.status() {
        SearchStatus::Failed => " (failed)",
        SearchStatus::Pending | SearchStatus::Completed => "",
    };

    format!("{when}  \"{}\"{status}", search.query())
}
