//! Tag-reading collaborator contract.
//!
//! The core never parses tag containers itself; it asks a [`TagReader`]
//! (see the `vinyl-tags` crate) and treats every failure as "field absent".

use crate::error::Result;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// Standard tag fields the player displays.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackTags {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub disc_number: Option<u32>,
    /// Playback length from the container's audio properties
    pub duration: Option<Duration>,
}

impl TrackTags {
    /// Title if present and not blank.
    #[must_use]
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref().map(str::trim).filter(|t| !t.is_empty())
    }

    /// Disc number, defaulting to 1 when absent or zero.
    #[must_use]
    pub fn disc_or_default(&self) -> u32 {
        self.disc_number.filter(|&disc| disc > 0).unwrap_or(1)
    }
}

/// Embedded picture bytes as stored in the tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddedPicture {
    pub data: Vec<u8>,
    pub mime_type: Option<String>,
}

/// Reads metadata from audio files.
pub trait TagReader: Send + Sync {
    /// Get the reader name (for logs)
    fn name(&self) -> &'static str;

    /// Read the standard tag fields of a file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or its tags cannot be parsed.
    fn read_tags(&self, path: &Path) -> Result<TrackTags>;

    /// Read the first embedded picture of a file, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or its tags cannot be parsed.
    fn read_picture(&self, path: &Path) -> Result<Option<EmbeddedPicture>>;

    /// Like [`read_tags`](Self::read_tags) but malformed metadata becomes empty tags.
    fn read_tags_or_default(&self, path: &Path) -> TrackTags {
        self.read_tags(path).unwrap_or_else(|e| {
            debug!("{}: treating tags as absent for {}: {}", self.name(), path.display(), e);
            TrackTags::default()
        })
    }
}

/// A reader that knows nothing; every track falls back to filename-derived data.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTags;

impl TagReader for NoTags {
    fn name(&self) -> &'static str {
        "none"
    }

    fn read_tags(&self, _path: &Path) -> Result<TrackTags> {
        Ok(TrackTags::default())
    }

    fn read_picture(&self, _path: &Path) -> Result<Option<EmbeddedPicture>> {
        Ok(None)
    }
}
