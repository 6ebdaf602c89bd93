//! Path constants for configuration, playlist and log files.

use std::path::PathBuf;

/// The name of the configuration directory under ~/.config/
pub const CONFIG_DIR_NAME: &str = "vinyl";

/// The name of the main configuration file
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// The name of the playlist store
pub const PLAYLISTS_FILE_NAME: &str = "playlists.json";

/// The name of the log file written when file logging is enabled
pub const LOG_FILE_NAME: &str = "vinyl.log";

/// Get the configuration directory path (~/.config/vinyl/)
#[must_use]
pub fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join(CONFIG_DIR_NAME)
}

/// Get the config file path (~/.config/vinyl/config.toml)
#[must_use]
pub fn config_path() -> PathBuf {
    config_dir().join(CONFIG_FILE_NAME)
}

/// Get the default playlist store path (~/.config/vinyl/playlists.json)
#[must_use]
pub fn playlists_path() -> PathBuf {
    config_dir().join(PLAYLISTS_FILE_NAME)
}

/// Get the log file path (~/.config/vinyl/vinyl.log)
#[must_use]
pub fn log_path() -> PathBuf {
    config_dir().join(LOG_FILE_NAME)
}
