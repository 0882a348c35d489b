pub mod settings;

pub use settings::Config;

use crate::history::DEFAULT_HISTORY_FILE;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Get the configuration directory, creating it if needed
pub fn config_dir() -> Result<PathBuf> {
    let dir = dirs::config_dir()
        .context("Failed to get config directory")?
        .join("sift");

    fs::create_dir_all(&dir).context("Failed to create config directory")?;

    Ok(dir)
}

/// Get the configuration file path
pub fn config_path() -> Result<PathBuf> {
    Ok(config_dir()?.join("config.toml"))
}

/// Load configuration from the default location, or create it if missing
pub fn load_or_create_config() -> Result<Config> {
    load_or_create_at(&config_path()?)
}

/// Load configuration from `path`, writing defaults there if it does not exist
pub fn load_or_create_at(path: &Path) -> Result<Config> {
    let mut config = if path.exists() {
        load_from(path)?
    } else {
        let config = Config::default();
        save_to(&config, path)?;

        eprintln!("Created default config at: {}", path.display());
        eprintln!("Please edit this file to add your Bing account key.");

        config
    };

    config.apply_env_overrides();
    Ok(config)
}

/// Load configuration from an existing file
pub fn load_from(path: &Path) -> Result<Config> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
    Ok(config)
}

/// Save configuration to `path`
pub fn save_to(config: &Config, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
    }
    let content = toml::to_string_pretty(config).context("Failed to serialize config")?;
    fs::write(path, content)
        .with_context(|| format!("Failed to write config file: {}", path.display()))?;
    Ok(())
}

/// Resolve where the search history lives
pub fn history_path(config: &Config) -> Result<PathBuf> {
    match config.history_path.as_deref() {
        Some(raw) if !raw.trim().is_empty() => Ok(PathBuf::from(expand_tilde(raw.trim()))),
        _ => Ok(config_dir()?.join(DEFAULT_HISTORY_FILE)),
    }
}

/// Expand a leading `~` to the home directory
pub fn expand_tilde(raw: &str) -> String {
    if raw == "~" || raw.starts_with("~/") {
        if let Some(home) = dirs::home_dir() {
            let suffix = raw.strip_prefix('~').unwrap_or("");
            return format!("{}{}", home.display(), suffix);
        }
    }
    raw.to_string()
}
