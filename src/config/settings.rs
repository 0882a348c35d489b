use crate::search::providers::{BingConfig, ACCOUNT_KEY_PLACEHOLDER};
use crate::search::DEFAULT_MAX_RESULTS;
use serde::{Deserialize, Serialize};

/// Environment variable that overrides the configured Bing account key
pub const BING_KEY_ENV: &str = "SIFT_BING_ACCOUNT_KEY";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    /// Location of the search history log (defaults to the config directory)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub history_path: Option<String>,

    /// Result cap for searches started without an explicit one
    #[serde(default = "default_max_results")]
    pub max_results: usize,

    /// Bing provider settings
    #[serde(default)]
    pub bing: BingConfig,

    /// Write debug logs to a file
    #[serde(default)]
    pub debug: bool,

    /// Debug log file or directory (defaults next to the config file)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug_log_path: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug_log_rotation: Option<DebugLogRotation>,

    /// Number of rotated log files to keep (0 keeps all)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug_log_keep: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            history_path: None,
            max_results: DEFAULT_MAX_RESULTS,
            bing: BingConfig::new(ACCOUNT_KEY_PLACEHOLDER),
            debug: false,
            debug_log_path: None,
            debug_log_rotation: None,
            debug_log_keep: None,
        }
    }
}

impl Config {
    /// Apply overrides from the process environment
    pub fn apply_env_overrides(&mut self) {
        if let Ok(key) = std::env::var(BING_KEY_ENV) {
            if !key.trim().is_empty() {
                tracing::debug!(var = BING_KEY_ENV, "using bing account key from environment");
                self.bing.account_key = key.trim().to_string();
            }
        }
    }
}

/// How debug log files are rotated
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DebugLogRotation {
    /// One file, appended across runs
    None,
    /// A new file per day
    Daily,
}

fn default_max_results() -> usize {
    DEFAULT_MAX_RESULTS
}
