use crate::error::{CoreError, Result};
use crate::queue::RepeatMode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VinylConfig {
    #[serde(default)]
    pub library: LibraryConfig,
    #[serde(default)]
    pub playback: PlaybackConfig,
    #[serde(default)]
    pub lyrics: LyricsConfig,
    #[serde(default)]
    pub playlists: PlaylistsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Sections owned by other crates, parsed on demand with [`section`](Self::section)
    #[serde(flatten)]
    pub extra: toml::Table,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LibraryConfig {
    /// Root of the `Artist/Album/track` tree
    #[serde(default = "default_root")]
    pub root: PathBuf,
}

fn default_root() -> PathBuf {
    PathBuf::from("Tracks")
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self { root: default_root() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaybackConfig {
    /// Start-up volume, 0-100
    #[serde(default = "default_volume")]
    pub volume: u8,
    #[serde(default)]
    pub repeat: RepeatMode,
}

const fn default_volume() -> u8 {
    100
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            volume: default_volume(),
            repeat: RepeatMode::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LyricsConfig {
    /// Subtracted from every lyric timestamp
    #[serde(default)]
    pub offset_ms: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlaylistsConfig {
    /// Playlist store; defaults to ~/.config/vinyl/playlists.json
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl PlaylistsConfig {
    #[must_use]
    pub fn path(&self) -> PathBuf {
        self.file.clone().unwrap_or_else(crate::paths::playlists_path)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Also write logs to ~/.config/vinyl/vinyl.log
    #[serde(default)]
    pub enabled: bool,
}

impl VinylConfig {
    /// Get the configuration directory path (~/.config/vinyl/)
    #[must_use]
    pub fn config_dir() -> PathBuf {
        crate::paths::config_dir()
    }

    /// Get the config file path (~/.config/vinyl/config.toml)
    #[must_use]
    pub fn config_path() -> PathBuf {
        crate::paths::config_path()
    }

    /// Load config from the default location or create a template on first run.
    ///
    /// `extra_templates` are appended to the base template (one per crate that owns a section).
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ConfigNotFound`] after writing the template, or an
    /// error if the file cannot be read, parsed or validated.
    pub fn load_or_create(extra_templates: &[&str]) -> Result<Self> {
        Self::load_or_create_at(&Self::config_path(), extra_templates)
    }

    /// Like [`load_or_create`](Self::load_or_create) for an explicit path.
    ///
    /// # Errors
    ///
    /// See [`load_or_create`](Self::load_or_create).
    pub fn load_or_create_at(config_path: &Path, extra_templates: &[&str]) -> Result<Self> {
        if !config_path.exists() {
            // Create config directory if it doesn't exist
            if let Some(parent) = config_path.parent() {
                fs::create_dir_all(parent)?;
            }

            // Write template config
            let mut template = CONFIG_TEMPLATE.to_string();
            for extra in extra_templates {
                template.push('\n');
                template.push_str(extra);
            }
            fs::write(config_path, template)?;

            return Err(CoreError::ConfigNotFound {
                path: config_path.to_path_buf(),
            });
        }

        let content = fs::read_to_string(config_path)?;
        Self::parse(&content)
    }

    /// Parse and validate config text.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is malformed or a value is out of range.
    pub fn parse(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ConfigInvalid`] for a volume above 100.
    pub fn validate(&self) -> Result<()> {
        if self.playback.volume > 100 {
            return Err(CoreError::ConfigInvalid {
                message: format!("playback.volume must be 0-100, got {}", self.playback.volume),
            });
        }
        Ok(())
    }

    /// Deserialize a section owned by another crate, `None` if absent.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ConfigInvalid`] if the section has the wrong shape.
    pub fn section<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>> {
        self.extra
            .get(name)
            .map(|value| {
                value.clone().try_into::<T>().map_err(|e| CoreError::ConfigInvalid {
                    message: format!("[{name}]: {e}"),
                })
            })
            .transpose()
    }
}

const CONFIG_TEMPLATE: &str = r##"# Vinyl Configuration
# ~/.config/vinyl/config.toml

[library]
# Directory laid out as Artist/Album/tracks
root = "Tracks"

[playback]
# 0-100
volume = 100
# "off", "queue" or "track"
repeat = "off"

[lyrics]
# Shift every lyric line earlier by this many milliseconds
offset_ms = 0

[playlists]
# Defaults to ~/.config/vinyl/playlists.json
# file = ""

[logging]
# Also write logs to ~/.config/vinyl/vinyl.log
enabled = false
"##;
