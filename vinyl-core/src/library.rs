//! Library indexing: `root/Artist/Album/*.<audio ext>` into album records.
//!
//! The scan is a one-shot walk that reports progress per artist and ends with
//! the complete album list. Unreadable directories are logged and skipped;
//! the scan itself never fails.

use crate::cover::CoverArt;
use crate::formats::is_audio_file;
use crate::natural_sort::sort_natural_by;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

const LOG_TARGET: &str = "vinyl::library";

/// Capacity of the progress channel between the indexing worker and its listener
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// One album of the catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct AlbumRecord {
    pub artist: String,
    pub album: String,
    /// Absolute (or root-relative, as given) directory of the album
    pub album_dir: PathBuf,
    /// Filename of the natural-order-first audio file in the album
    pub representative_track: String,
    /// Filled in by the cover resolver; `None` until then
    pub cover: Option<CoverArt>,
}

impl AlbumRecord {
    /// Full path of the representative track.
    #[must_use]
    pub fn representative_path(&self) -> PathBuf {
        self.album_dir.join(&self.representative_track)
    }

    /// Case-insensitive match against artist or album name (album tree filter).
    #[must_use]
    pub fn matches(&self, query: &str) -> bool {
        let query = query.to_lowercase();
        self.artist.to_lowercase().contains(&query) || self.album.to_lowercase().contains(&query)
    }
}

/// Progress reported by a running scan.
#[derive(Debug, Clone, PartialEq)]
pub enum IndexEvent {
    /// Free-form log line (missing root, unreadable directory, empty album)
    Log(String),
    /// One artist directory was processed
    ArtistIndexed {
        artist: String,
        albums: Vec<String>,
        /// 1-based position among the root's entries
        position: usize,
        total: usize,
    },
    /// The scan completed; carries every album found
    Finished { albums: Vec<AlbumRecord> },
    /// The scan was cancelled; partial results were discarded
    Cancelled,
}

impl IndexEvent {
    /// Human-readable line for the splash log.
    #[must_use]
    pub fn summary(&self) -> String {
        match self {
            Self::Log(message) => message.clone(),
            Self::ArtistIndexed {
                artist,
                albums,
                position,
                total,
            } => {
                if albums.is_empty() {
                    format!("{artist}: no valid albums found ({position}/{total})")
                } else {
                    format!(
                        "{artist}: indexed albums -> {} ({position}/{total})",
                        albums.join(", ")
                    )
                }
            }
            Self::Finished { albums } => format!("Indexing finished: {} albums", albums.len()),
            Self::Cancelled => "Indexing cancelled".to_string(),
        }
    }
}

/// A directory entry with its display name.
#[derive(Debug, Clone)]
struct Entry {
    name: String,
    path: PathBuf,
}

/// Walks a library root and produces the album catalog.
#[derive(Debug, Clone)]
pub struct LibraryIndexer {
    root: PathBuf,
    cancel_token: CancellationToken,
}

impl LibraryIndexer {
    /// Create an indexer for a library root
    ///
    /// # Arguments
    /// * `root` - Directory whose subdirectories are artists
    /// * `cancel_token` - Optional token; cancelling it stops the walk between entries
    pub fn new(root: impl Into<PathBuf>, cancel_token: Option<CancellationToken>) -> Self {
        Self {
            root: root.into(),
            cancel_token: cancel_token.unwrap_or_default(),
        }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Start the scan on a blocking worker.
    ///
    /// Events arrive on the returned receiver; the last one is always
    /// [`IndexEvent::Finished`] or [`IndexEvent::Cancelled`].
    #[must_use]
    pub fn spawn(self) -> (JoinHandle<()>, mpsc::Receiver<IndexEvent>) {
        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let handle = tokio::task::spawn_blocking(move || {
            self.scan(&mut |event| {
                if tx.blocking_send(event).is_err() {
                    debug!(target: LOG_TARGET, "Index listener dropped, discarding event");
                }
            });
        });
        (handle, rx)
    }

    /// Run the scan on the current thread, reporting through `emit`.
    pub fn scan(&self, emit: &mut dyn FnMut(IndexEvent)) {
        info!(target: LOG_TARGET, "Indexing library at {}", self.root.display());

        if !self.root.is_dir() {
            warn!(target: LOG_TARGET, "Library root not found: {}", self.root.display());
            emit(IndexEvent::Log("Tracks directory not found.".into()));
            emit(IndexEvent::Finished { albums: Vec::new() });
            return;
        }

        let artists = match list_sorted(&self.root) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(target: LOG_TARGET, "Error listing {}: {}", self.root.display(), e);
                emit(IndexEvent::Log(format!("Error listing tracks folder: {e}")));
                emit(IndexEvent::Finished { albums: Vec::new() });
                return;
            }
        };

        emit(IndexEvent::Log("Starting indexing...".into()));
        let total = artists.len();
        let mut albums = Vec::new();

        for (i, artist) in artists.iter().enumerate() {
            if self.cancel_token.is_cancelled() {
                info!(target: LOG_TARGET, "Indexing cancelled, discarding {} albums", albums.len());
                emit(IndexEvent::Cancelled);
                return;
            }
            if !artist.path.is_dir() {
                continue;
            }

            let Some(found) = self.index_artist(artist, emit) else {
                if self.cancel_token.is_cancelled() {
                    emit(IndexEvent::Cancelled);
                    return;
                }
                continue;
            };

            let names = found.iter().map(|a| a.album.clone()).collect();
            albums.extend(found);
            emit(IndexEvent::ArtistIndexed {
                artist: artist.name.clone(),
                albums: names,
                position: i + 1,
                total,
            });
        }

        info!(target: LOG_TARGET, "Indexed {} albums from {} entries", albums.len(), total);
        emit(IndexEvent::Finished { albums });
    }

    /// Index one artist directory. `None` if it could not be listed or the scan was cancelled.
    fn index_artist(
        &self,
        artist: &Entry,
        emit: &mut dyn FnMut(IndexEvent),
    ) -> Option<Vec<AlbumRecord>> {
        let album_dirs = match list_sorted(&artist.path) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(target: LOG_TARGET, "{}: error listing albums: {}", artist.name, e);
                emit(IndexEvent::Log(format!("{}: error listing albums: {e}", artist.name)));
                return None;
            }
        };

        let mut records = Vec::new();
        for album in album_dirs {
            if self.cancel_token.is_cancelled() {
                return None;
            }
            if !album.path.is_dir() {
                continue;
            }

            let files = match list_audio_files(&album.path) {
                Ok(files) => files,
                Err(e) => {
                    warn!(target: LOG_TARGET, "{} - {}: error listing files: {}", artist.name, album.name, e);
                    emit(IndexEvent::Log(format!(
                        "{} - {}: error listing files: {e}",
                        artist.name, album.name
                    )));
                    continue;
                }
            };

            let Some(first) = files.into_iter().next() else {
                debug!(target: LOG_TARGET, "{} - {}: no supported audio files", artist.name, album.name);
                emit(IndexEvent::Log(format!(
                    "{} - {}: no supported audio files, skipped",
                    artist.name, album.name
                )));
                continue;
            };

            records.push(AlbumRecord {
                artist: artist.name.clone(),
                album: album.name,
                album_dir: album.path,
                representative_track: first,
                cover: None,
            });
        }

        Some(records)
    }
}

/// List a directory's entries in natural order of their names.
fn list_sorted(dir: &Path) -> io::Result<Vec<Entry>> {
    let mut entries = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        entries.push(Entry {
            name: entry.file_name().to_string_lossy().into_owned(),
            path: entry.path(),
        });
    }
    sort_natural_by(&mut entries, |e| e.name.as_str());
    Ok(entries)
}

/// Filenames of the recognised audio files directly inside `dir`, in natural order.
///
/// # Errors
///
/// Returns an error if the directory cannot be listed.
pub fn list_audio_files(dir: &Path) -> io::Result<Vec<String>> {
    Ok(list_sorted(dir)?
        .into_iter()
        .filter(|e| e.path.is_file() && is_audio_file(&e.name))
        .map(|e| e.name)
        .collect())
}
