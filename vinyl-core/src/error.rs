use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    // Configuration errors
    #[error("Config file not found at {path}. A template has been created with default settings.")]
    ConfigNotFound { path: PathBuf },

    #[error("Invalid config: {message}")]
    ConfigInvalid { message: String },

    #[error("Failed to parse config file: {0}")]
    ConfigParseError(#[from] toml::de::Error),

    // Library errors
    #[error("No supported audio files found in {path}")]
    EmptyAlbum { path: PathBuf },

    // Tag errors
    #[error("Failed to read tags from {path}: {reason}")]
    TagRead { path: PathBuf, reason: String },

    // Queue errors
    #[error("Track index {index} out of range (queue has {len} tracks)")]
    TrackIndexOutOfRange { index: usize, len: usize },

    #[error("Row {row} is not a playable track")]
    NotATrackRow { row: usize },

    #[error("Nothing is loaded in the play queue")]
    QueueEmpty,

    // Playlist errors
    #[error("A playlist named {name:?} already exists")]
    DuplicatePlaylist { name: String },

    #[error("Playlist {name:?} does not exist")]
    PlaylistNotFound { name: String },

    #[error("Playlist {name:?} is empty")]
    EmptyPlaylist { name: String },

    // Player errors
    #[error("Player error: {reason}")]
    Player { reason: String },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // IO errors
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CoreError>;
