//! Command-line front end.
//!
//! Stands in for a graphical result view: it prints searches and reports
//! result clicks back to the history.

mod render;

use crate::config;
use crate::history::SearchHistory;
use crate::search::providers::BingSearchProvider;
use crate::search::Search;
use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "sift")]
#[command(about = "Web search with a durable search history", long_about = None)]
pub struct Cli {
    /// Use this config file instead of the default one
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Search the web and store the search in the history
    Search {
        /// Query text
        #[arg(required = true)]
        query: Vec<String>,

        /// Maximum number of results (default from config)
        #[arg(short = 'n', long)]
        max_results: Option<usize>,

        /// Do not record this search in the history
        #[arg(long)]
        no_history: bool,
    },

    /// Show the most recent searches
    Recent {
        /// Number of searches to show
        #[arg(short = 'n', long, default_value_t = 10)]
        count: usize,
    },

    /// Show searches within a date range (dates without a time are UTC days)
    History {
        /// Earliest date, RFC 3339 or YYYY-MM-DD
        #[arg(long, value_parser = parse_begin)]
        from: Option<DateTime<Utc>>,

        /// Latest date, RFC 3339 or YYYY-MM-DD (defaults to now)
        #[arg(long, value_parser = parse_end)]
        to: Option<DateTime<Utc>>,
    },

    /// Open a stored result in the browser and count the click
    Open {
        /// History entry number, as shown by `recent` or `history` (from 1)
        #[arg(value_parser = parse_position)]
        entry: usize,

        /// Result number within the entry (from 1)
        #[arg(value_parser = parse_position)]
        result: usize,

        /// Only print the URL
        #[arg(long)]
        no_browser: bool,
    },
}

/// Parse arguments and run the selected command
pub async fn run() -> Result<()> {
    let cli = Cli::parse();

    let config = match cli.config.as_deref() {
        Some(path) => config::load_or_create_at(path)?,
        None => config::load_or_create_config()?,
    };
    let _log_guard = crate::logging::init(&config)?;

    let history_path = config::history_path(&config)?;
    let history = SearchHistory::open(&history_path)
        .with_context(|| format!("Failed to open search history at {}", history_path.display()))?;

    match cli.command {
        Commands::Search {
            query,
            max_results,
            no_history,
        } => {
            let provider = BingSearchProvider::new(config.bing.clone())
                .context("Failed to initialize Bing provider")?;
            let query = query.join(" ");
            let mut search =
                Search::with_max_results(query.as_str(), max_results.unwrap_or(config.max_results));

            search
                .execute(&provider)
                .await
                .with_context(|| format!("Search for '{query}' failed"))?;

            if no_history {
                print!("{}", render::search(None, &search));
            } else {
                let index = history.len();
                history
                    .add_entry(search.clone())
                    .context("Search succeeded but could not be saved to history")?;
                print!("{}", render::search(Some(index), &search));
            }
        }
        Commands::Recent { count } => {
            let start = history.len().saturating_sub(count);
            print!("{}", render::listing(start, &history.recent_searches(count)));
        }
        Commands::History { from, to } => {
            let range = history.date_range(from, to);
            print!("{}", render::listing(range.start, &history.history_date_ordered(from, to)));
        }
        Commands::Open {
            entry,
            result,
            no_browser,
        } => {
            // Positions are shown from 1, the history counts from 0
            let (entry, result) = (entry - 1, result - 1);
            let clicks = history.record_click(entry, result).with_context(|| {
                format!("Cannot open result {} of entry {}", result + 1, entry + 1)
            })?;
            let search = history
                .get(entry)
                .with_context(|| format!("History entry {} disappeared", entry + 1))?;
            let url = search.results()[result].url();
            println!("{url}");

            if !no_browser {
                if let Err(e) = open::that(url.as_str()) {
                    tracing::warn!(url = %url, error = %e, "failed to open browser");
                    eprintln!("Could not open a browser ({e}); copy the URL above instead.");
                }
            }
            tracing::debug!(entry, result, clicks, "result opened");
        }
    }

    Ok(())
}

/// Parse a position as shown to the user, counted from 1
fn parse_position(raw: &str) -> Result<usize, String> {
    match raw.parse::<usize>() {
        Ok(0) => Err("positions start at 1".to_string()),
        Ok(n) => Ok(n),
        Err(e) => Err(format!("invalid position '{raw}': {e}")),
    }
}

fn parse_begin(raw: &str) -> Result<DateTime<Utc>, String> {
    parse_date(raw, false)
}

fn parse_end(raw: &str) -> Result<DateTime<Utc>, String> {
    parse_date(raw, true)
}

/// Parse RFC 3339, or a bare date meaning the start (or end) of that UTC day
fn parse_date(raw: &str, end_of_day: bool) -> Result<DateTime<Utc>, String> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }

    let invalid = || format!("invalid date '{raw}': expected RFC 3339 or YYYY-MM-DD");
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| invalid())?;
    let naive = if end_of_day {
        date.and_hms_nano_opt(23, 59, 59, 999_999_999)
    } else {
        date.and_hms_opt(0, 0, 0)
    }
    .ok_or_else(invalid)?;

    Ok(Utc.from_utc_datetime(&naive))
}
