//! Path constants for configuration and log files.

use std::path::PathBuf;

/// The name of the configuration and cache directories
pub const CONFIG_DIR_NAME: &str = "lrcsync";

/// The name of the main configuration file
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Get the configuration directory path (~/.config/lrcsync/)
#[must_use]
pub fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join(CONFIG_DIR_NAME)
}

/// Get the config file path (~/.config/lrcsync/config.toml)
#[must_use]
pub fn config_path() -> PathBuf {
    config_dir().join(CONFIG_FILE_NAME)
}

/// Get the cache directory path (~/.cache/lrcsync/)
#[must_use]
pub fn cache_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".cache")
        .join(CONFIG_DIR_NAME)
}

/// Get the path of a log file inside the cache directory
#[must_use]
pub fn log_path(file_name: &str) -> PathBuf {
    cache_dir().join(file_name)
}
