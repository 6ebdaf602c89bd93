//! Named playlists persisted as a JSON object of name -> ordered paths.
//!
//! The file is read once at startup and rewritten after every mutation.
//! A missing or corrupt file means "no playlists yet"; a failed write is
//! logged and the in-memory state stays authoritative.

use crate::error::{CoreError, Result};
use crate::natural_sort::sort_natural;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const LOG_TARGET: &str = "vinyl::playlist";

pub struct PlaylistStore {
    path: PathBuf,
    playlists: BTreeMap<String, Vec<PathBuf>>,
}

impl PlaylistStore {
    /// Load the store from `path`.
    #[must_use]
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let playlists = match fs::read_to_string(&path) {
            Ok(contents) => serde_json::from_str(&contents).unwrap_or_else(|e| {
                warn!(target: LOG_TARGET, "Ignoring corrupt playlist file {}: {}", path.display(), e);
                BTreeMap::new()
            }),
            Err(e) => {
                debug!(target: LOG_TARGET, "No playlist file at {}: {}", path.display(), e);
                BTreeMap::new()
            }
        };
        info!(target: LOG_TARGET, "Loaded {} playlists", playlists.len());
        Self { path, playlists }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create an empty playlist.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::DuplicatePlaylist`] if the name is taken.
    pub fn create(&mut self, name: &str) -> Result<()> {
        if self.playlists.contains_key(name) {
            return Err(CoreError::DuplicatePlaylist {
                name: name.to_string(),
            });
        }
        self.playlists.insert(name.to_string(), Vec::new());
        info!(target: LOG_TARGET, "Created playlist {name:?}");
        self.save();
        Ok(())
    }

    /// Append a song to a playlist.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::PlaylistNotFound`] for an unknown playlist.
    pub fn add_song(&mut self, name: &str, song: impl Into<PathBuf>) -> Result<()> {
        let songs = self
            .playlists
            .get_mut(name)
            .ok_or_else(|| CoreError::PlaylistNotFound {
                name: name.to_string(),
            })?;
        let song = song.into();
        debug!(target: LOG_TARGET, "Adding {} to {name:?}", song.display());
        songs.push(song);
        self.save();
        Ok(())
    }

    /// Songs of a playlist in stored order.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::PlaylistNotFound`] for an unknown playlist.
    pub fn songs(&self, name: &str) -> Result<&[PathBuf]> {
        self.playlists
            .get(name)
            .map(Vec::as_slice)
            .ok_or_else(|| CoreError::PlaylistNotFound {
                name: name.to_string(),
            })
    }

    /// Playlist names in natural order
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.playlists.keys().cloned().collect();
        sort_natural(&mut names);
        names
    }

    fn save(&self) {
        if let Err(e) = self.try_save() {
            warn!(target: LOG_TARGET, "Failed to write playlists to {}: {}", self.path.display(), e);
        }
    }

    fn try_save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(&self.playlists)?;
        fs::write(&self.path, contents)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_is_empty_store() {
        let dir = TempDir::new().unwrap();
        let store = PlaylistStore::load(dir.path().join("playlists.json"));
        assert!(store.names().is_empty());
    }

    #[test]
    fn test_corrupt_file_is_empty_store() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("playlists.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(PlaylistStore::load(&path).names().is_empty());
    }

    #[test]
    fn test_mutations_persist() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("playlists.json");

        let mut store = PlaylistStore::load(&path);
        store.create("Road Trip").unwrap();
        store.add_song("Road Trip", "/music/a.mp3").unwrap();
        store.add_song("Road Trip", "/music/b.mp3").unwrap();
        store.create("Mix 10").unwrap();
        store.create("Mix 2").unwrap();

        let reloaded = PlaylistStore::load(&path);
        assert_eq!(reloaded.names(), ["Mix 2", "Mix 10", "Road Trip"]);
        assert_eq!(
            reloaded.songs("Road Trip").unwrap(),
            [PathBuf::from("/music/a.mp3"), PathBuf::from("/music/b.mp3")]
        );
    }

    #[test]
    fn test_duplicate_and_unknown_playlists() {
        let dir = TempDir::new().unwrap();
        let mut store = PlaylistStore::load(dir.path().join("p.json"));
        store.create("A").unwrap();
        assert!(matches!(store.create("A"), Err(CoreError::DuplicatePlaylist { .. })));
        assert!(matches!(
            store.add_song("B", "/x.mp3"),
            Err(CoreError::PlaylistNotFound { .. })
        ));
        assert!(store.songs("B").is_err());
    }
}
