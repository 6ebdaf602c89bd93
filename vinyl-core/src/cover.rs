//! Cover art extraction for indexed albums.
//!
//! Runs as one batched background task over the whole catalog once indexing
//! has handed off its result. A missing, unreadable or undecodable picture
//! becomes [`CoverArt::Placeholder`]; callers never see an error.

use crate::library::AlbumRecord;
use crate::tags::{EmbeddedPicture, TagReader};
use image::ImageReader;
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

const LOG_TARGET: &str = "vinyl::cover";

/// Album artwork as shown in the album tree and now-playing panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoverArt {
    /// A decodable picture embedded in the representative track
    Embedded {
        data: Arc<[u8]>,
        mime_type: Option<String>,
        width: u32,
        height: u32,
    },
    /// The default "no cover" image
    Placeholder,
}

impl CoverArt {
    #[must_use]
    pub const fn is_placeholder(&self) -> bool {
        matches!(self, Self::Placeholder)
    }

    /// Validate embedded picture bytes; anything that does not decode is a placeholder.
    #[must_use]
    pub fn from_picture(picture: EmbeddedPicture) -> Self {
        let dimensions = ImageReader::new(Cursor::new(picture.data.as_slice()))
            .with_guessed_format()
            .ok()
            .and_then(|reader| reader.into_dimensions().ok());

        match dimensions {
            Some((width, height)) if width > 0 && height > 0 => Self::Embedded {
                data: Arc::from(picture.data),
                mime_type: picture.mime_type,
                width,
                height,
            },
            _ => Self::Placeholder,
        }
    }
}

/// Extracts embedded cover art using a [`TagReader`].
#[derive(Clone)]
pub struct CoverArtResolver {
    reader: Arc<dyn TagReader>,
}

impl CoverArtResolver {
    #[must_use]
    pub fn new(reader: Arc<dyn TagReader>) -> Self {
        Self { reader }
    }

    /// Cover of a single track: first embedded picture that decodes, else the placeholder.
    #[must_use]
    pub fn cover_for_track(&self, path: &Path) -> CoverArt {
        match self.reader.read_picture(path) {
            Ok(Some(picture)) => {
                let cover = CoverArt::from_picture(picture);
                if cover.is_placeholder() {
                    debug!(target: LOG_TARGET, "Embedded picture in {} does not decode", path.display());
                }
                cover
            }
            Ok(None) => CoverArt::Placeholder,
            Err(e) => {
                debug!(target: LOG_TARGET, "No cover for {}: {}", path.display(), e);
                CoverArt::Placeholder
            }
        }
    }

    /// Enrich every album with its cover, preserving order.
    #[must_use]
    pub fn extract_covers(&self, albums: Vec<AlbumRecord>) -> Vec<AlbumRecord> {
        let total = albums.len();
        let enriched: Vec<_> = albums
            .into_iter()
            .map(|mut album| {
                let cover = self.cover_for_track(&album.representative_path());
                if !cover.is_placeholder() {
                    debug!(target: LOG_TARGET, "Extracted cover for {}", album.album);
                }
                album.cover = Some(cover);
                album
            })
            .collect();

        let found = enriched
            .iter()
            .filter(|a| a.cover.as_ref().is_some_and(|c| !c.is_placeholder()))
            .count();
        info!(target: LOG_TARGET, "Cover extraction finished: {found}/{total} albums have embedded art");
        enriched
    }

    /// Run [`extract_covers`](Self::extract_covers) as a single blocking background task.
    #[must_use]
    pub fn spawn(self, albums: Vec<AlbumRecord>) -> JoinHandle<Vec<AlbumRecord>> {
        tokio::task::spawn_blocking(move || self.extract_covers(albums))
    }
}
