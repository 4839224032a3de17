//! Per-user directories of quire.

use std::path::PathBuf;

use anyhow::{Context, Result};

pub const APP_NAME: &str = "quire";

/// Name of the config file inside [`get_config_dir`].
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Name of the default log file inside [`get_cache_dir`].
pub const LOG_FILE_NAME: &str = "quire.log";

/// Holds `config.toml` and the persisted print defaults.
///
/// `$XDG_CONFIG_HOME/quire`, usually `~/.config/quire`.
pub fn get_config_dir() -> Result<PathBuf> {
    app_dir(dirs::config_dir(), "config")
}

/// Holds the log file unless `logging.file_path` points elsewhere.
pub fn get_cache_dir() -> Result<PathBuf> {
    app_dir(dirs::cache_dir(), "cache")
}

fn app_dir(base: Option<PathBuf>, kind: &str) -> Result<PathBuf> {
    base.map(|p| p.join(APP_NAME))
        .with_context(|| format!("Failed to determine {} directory", kind))
}
