//! Filename search over the whole library, plus random song selection.

use crate::formats::is_audio_file;
use rand::Rng;
use rand::seq::IndexedRandom;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use walkdir::{DirEntry, WalkDir};

const LOG_TARGET: &str = "vinyl::search";

const EVENT_CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchEvent {
    /// Percentage of audio files examined so far
    Progress(u8),
    /// A song whose filename contains the query
    Match(PathBuf),
    Finished,
    Cancelled,
}

/// Case-insensitive substring search over audio filenames under a root.
pub struct SongSearch {
    root: PathBuf,
    query: String,
    cancel_token: CancellationToken,
}

impl SongSearch {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, query: &str, cancel_token: Option<CancellationToken>) -> Self {
        Self {
            root: root.into(),
            query: query.to_lowercase(),
            cancel_token: cancel_token.unwrap_or_default(),
        }
    }

    /// Run the search on a blocking worker, streaming events over a bounded channel.
    #[must_use]
    pub fn spawn(self) -> (JoinHandle<()>, mpsc::Receiver<SearchEvent>) {
        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let handle = tokio::task::spawn_blocking(move || {
            self.run(&mut |event| {
                let _ = tx.blocking_send(event);
            });
        });
        (handle, rx)
    }

    /// Count audio files, then walk again reporting progress and matches.
    pub fn run(&self, emit: &mut dyn FnMut(SearchEvent)) {
        info!(target: LOG_TARGET, "Searching {} for {:?}", self.root.display(), self.query);

        let total = audio_files(&self.root).count();
        if total == 0 {
            emit(SearchEvent::Progress(100));
            emit(SearchEvent::Finished);
            return;
        }

        let mut last_percent = None;
        let mut matches = 0_usize;
        for (seen, entry) in audio_files(&self.root).enumerate() {
            if self.cancel_token.is_cancelled() {
                debug!(target: LOG_TARGET, "Search cancelled after {seen} files");
                emit(SearchEvent::Cancelled);
                return;
            }

            let percent = percent(seen + 1, total);
            if last_percent != Some(percent) {
                last_percent = Some(percent);
                emit(SearchEvent::Progress(percent));
            }

            if entry.file_name().to_string_lossy().to_lowercase().contains(&self.query) {
                matches += 1;
                emit(SearchEvent::Match(entry.into_path()));
            }
        }

        if last_percent != Some(100) {
            emit(SearchEvent::Progress(100));
        }
        info!(target: LOG_TARGET, "Search finished: {matches} matches in {total} files");
        emit(SearchEvent::Finished);
    }
}

fn percent(seen: usize, total: usize) -> u8 {
    u8::try_from(seen.saturating_mul(100) / total.max(1)).unwrap_or(100)
}

/// Every recognised audio file under `root`, in file-name order; unreadable directories are skipped.
fn audio_files(root: &Path) -> impl Iterator<Item = DirEntry> {
    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file() && is_audio_file(entry.path()))
}

/// Every audio file in the library
#[must_use]
pub fn all_songs(root: &Path) -> Vec<PathBuf> {
    audio_files(root).map(DirEntry::into_path).collect()
}

/// A uniformly random song from the library, if it has any
#[must_use]
pub fn pick_random_song<R: Rng + ?Sized>(root: &Path, rng: &mut R) -> Option<PathBuf> {
    all_songs(root).choose(rng).cloned()
}
