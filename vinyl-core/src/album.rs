//! Loading an album directory into playable track entries.
//!
//! The flat play order is disc ascending, then natural order of filenames
//! within a disc. Disc headings are display rows only and appear only when
//! an album spans more than one disc.

use crate::error::{CoreError, Result};
use crate::library::list_audio_files;
use crate::tags::{TagReader, TrackTags};
use regex::Regex;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::debug;

const LOG_TARGET: &str = "vinyl::album";

/// "01 - Title", "3. Title", "12_Title"
static TRACK_PREFIX: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^(\d+)\s*[.\-_]\s*(.+)$").ok());

/// One playable track of the queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackEntry {
    pub filename: String,
    pub path: PathBuf,
    /// 1 when the tag is absent or not a positive integer
    pub disc_number: u32,
    /// Leading number of the filename, if any
    pub track_number: Option<u32>,
    /// Tag title, or the filename stem without its track-number prefix
    pub display_title: String,
}

impl TrackEntry {
    /// Build an entry from a path and whatever tags could be read for it.
    #[must_use]
    pub fn new(path: PathBuf, tags: &TrackTags) -> Self {
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let stem = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();

        let (track_number, stripped) = split_track_prefix(&stem);
        let display_title = tags.title().unwrap_or(stripped).to_string();

        Self {
            filename,
            disc_number: tags.disc_or_default(),
            track_number,
            display_title,
            path,
        }
    }

    /// Row label for the track list: "3. Title" or just "Title".
    #[must_use]
    pub fn display_label(&self) -> String {
        match self.track_number {
            Some(n) => format!("{n}. {}", self.display_title),
            None => self.display_title.clone(),
        }
    }
}

/// Split "07 - Song" into `(Some(7), "Song")`; names without a prefix pass through.
#[must_use]
pub fn split_track_prefix(stem: &str) -> (Option<u32>, &str) {
    let captures = TRACK_PREFIX.as_ref().and_then(|re| re.captures(stem));
    match captures {
        Some(caps) => match (caps.get(1), caps.get(2)) {
            (Some(number), Some(rest)) => (number.as_str().parse().ok(), rest.as_str().trim()),
            _ => (None, stem),
        },
        None => (None, stem),
    }
}

/// A visual row of the track list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackRow {
    /// Non-selectable "Disc n" heading
    DiscHeading(u32),
    /// Index into the flat track order
    Track(usize),
}

/// Map a visual row back to a logical track index, skipping headings.
///
/// # Errors
///
/// Returns [`CoreError::NotATrackRow`] for a heading and
/// [`CoreError::TrackIndexOutOfRange`] past the last row.
pub fn row_to_track_index(rows: &[TrackRow], row: usize) -> Result<usize> {
    match rows.get(row) {
        Some(TrackRow::Track(index)) => Ok(*index),
        Some(TrackRow::DiscHeading(_)) => Err(CoreError::NotATrackRow { row }),
        None => Err(CoreError::TrackIndexOutOfRange {
            index: row,
            len: rows.len(),
        }),
    }
}

/// Tracks of one album in play order, plus the rows used to display them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlbumTracks {
    pub dir: PathBuf,
    pub tracks: Vec<TrackEntry>,
    pub rows: Vec<TrackRow>,
}

impl AlbumTracks {
    /// List, sort and tag every recognised audio file of `dir`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::EmptyAlbum`] if the directory holds no supported
    /// audio, or an IO error if it cannot be listed.
    pub fn load(dir: &Path, reader: &dyn TagReader) -> Result<Self> {
        let files = list_audio_files(dir)?;
        if files.is_empty() {
            return Err(CoreError::EmptyAlbum {
                path: dir.to_path_buf(),
            });
        }

        let entries: Vec<TrackEntry> = files
            .into_iter()
            .map(|name| {
                let path = dir.join(name);
                let tags = reader.read_tags_or_default(&path);
                TrackEntry::new(path, &tags)
            })
            .collect();

        let album = Self::from_sorted(dir.to_path_buf(), entries);
        debug!(
            target: LOG_TARGET,
            "Loaded {} tracks from {} ({} rows)",
            album.tracks.len(),
            dir.display(),
            album.rows.len()
        );
        Ok(album)
    }

    /// Group natural-ordered entries by disc.
    #[must_use]
    pub fn from_sorted(dir: PathBuf, mut tracks: Vec<TrackEntry>) -> Self {
        // Stable, so natural order survives within each disc
        tracks.sort_by_key(|t| t.disc_number);

        let discs: BTreeSet<u32> = tracks.iter().map(|t| t.disc_number).collect();
        let grouped = discs.len() > 1;

        let mut rows = Vec::with_capacity(tracks.len() + if grouped { discs.len() } else { 0 });
        let mut current_disc = None;
        for (index, track) in tracks.iter().enumerate() {
            if grouped && current_disc != Some(track.disc_number) {
                rows.push(TrackRow::DiscHeading(track.disc_number));
                current_disc = Some(track.disc_number);
            }
            rows.push(TrackRow::Track(index));
        }

        Self { dir, tracks, rows }
    }

    #[must_use]
    pub fn is_grouped(&self) -> bool {
        self.rows.iter().any(|row| matches!(row, TrackRow::DiscHeading(_)))
    }

    /// Logical index of the track at `path`
    #[must_use]
    pub fn index_of(&self, path: &Path) -> Option<usize> {
        self.tracks.iter().position(|t| t.path == path)
    }
}

/// Entries for an arbitrary list of paths (playlists), in the order given.
#[must_use]
pub fn entries_for_paths(paths: &[PathBuf], reader: &dyn TagReader) -> Vec<TrackEntry> {
    paths
        .iter()
        .map(|path| TrackEntry::new(path.clone(), &reader.read_tags_or_default(path)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result as CoreResult;
    use crate::tags::{EmbeddedPicture, NoTags};
    use std::fs::File;
    use tempfile::TempDir;

    /// Disc number from a "dN" marker in the filename
    struct DiscFromName;

    impl TagReader for DiscFromName {
        fn name(&self) -> &'static str {
            "disc-from-name"
        }

        fn read_tags(&self, path: &Path) -> CoreResult<TrackTags> {
            let name = path.file_name().unwrap().to_string_lossy();
            let disc = name
                .split_once(" d")
                .and_then(|(_, rest)| rest.chars().next())
                .and_then(|c| c.to_digit(10));
            Ok(TrackTags {
                disc_number: disc,
                title: name.contains("tagged").then(|| "From Tag".to_string()),
                ..Default::default()
            })
        }

        fn read_picture(&self, _path: &Path) -> CoreResult<Option<EmbeddedPicture>> {
            Ok(None)
        }
    }

    fn album_dir(files: &[&str]) -> TempDir {
        let dir = TempDir::new().unwrap();
        for name in files {
            File::create(dir.path().join(name)).unwrap();
        }
        dir
    }

    fn filenames(album: &AlbumTracks) -> Vec<&str> {
        album.tracks.iter().map(|t| t.filename.as_str()).collect()
    }

    #[test]
    fn test_single_disc_has_no_headings() {
        let dir = album_dir(&["10 - Ten.mp3", "2 - Two.mp3", "1 - One.flac", "notes.txt"]);
        let album = AlbumTracks::load(dir.path(), &NoTags).unwrap();

        assert_eq!(filenames(&album), ["1 - One.flac", "2 - Two.mp3", "10 - Ten.mp3"]);
        assert!(!album.is_grouped());
        assert_eq!(album.rows, [TrackRow::Track(0), TrackRow::Track(1), TrackRow::Track(2)]);
    }

    #[test]
    fn test_two_discs_get_headings_and_disc_order() {
        let dir = album_dir(&["10 b d2.mp3", "2 b d2.mp3", "10 a d1.mp3", "1 a d1.mp3"]);
        let album = AlbumTracks::load(dir.path(), &DiscFromName).unwrap();

        assert_eq!(
            filenames(&album),
            ["1 a d1.mp3", "10 a d1.mp3", "2 b d2.mp3", "10 b d2.mp3"]
        );
        assert_eq!(
            album.rows,
            [
                TrackRow::DiscHeading(1),
                TrackRow::Track(0),
                TrackRow::Track(1),
                TrackRow::DiscHeading(2),
                TrackRow::Track(2),
                TrackRow::Track(3),
            ]
        );
    }

    #[test]
    fn test_row_to_track_index_skips_headings() {
        let rows = [
            TrackRow::DiscHeading(1),
            TrackRow::Track(0),
            TrackRow::DiscHeading(2),
            TrackRow::Track(1),
            TrackRow::Track(2),
        ];
        assert_eq!(row_to_track_index(&rows, 1).unwrap(), 0);
        assert_eq!(row_to_track_index(&rows, 3).unwrap(), 1);
        assert_eq!(row_to_track_index(&rows, 4).unwrap(), 2);
        assert!(matches!(
            row_to_track_index(&rows, 2),
            Err(CoreError::NotATrackRow { row: 2 })
        ));
        assert!(matches!(
            row_to_track_index(&rows, 5),
            Err(CoreError::TrackIndexOutOfRange { index: 5, len: 5 })
        ));
    }

    #[test]
    fn test_empty_album_is_an_error() {
        let dir = album_dir(&["cover.jpg"]);
        assert!(matches!(
            AlbumTracks::load(dir.path(), &NoTags),
            Err(CoreError::EmptyAlbum { .. })
        ));
    }

    #[test]
    fn test_display_title_prefers_tag() {
        let dir = album_dir(&["03 - tagged.mp3", "04_Plain Name.mp3"]);
        let album = AlbumTracks::load(dir.path(), &DiscFromName).unwrap();

        assert_eq!(album.tracks[0].display_title, "From Tag");
        assert_eq!(album.tracks[0].display_label(), "3. From Tag");
        assert_eq!(album.tracks[1].display_title, "Plain Name");
        assert_eq!(album.tracks[1].display_label(), "4. Plain Name");
    }

    #[test]
    fn test_split_track_prefix() {
        assert_eq!(split_track_prefix("01 - Intro"), (Some(1), "Intro"));
        assert_eq!(split_track_prefix("7.Song"), (Some(7), "Song"));
        assert_eq!(split_track_prefix("12_Name"), (Some(12), "Name"));
        assert_eq!(split_track_prefix("Intro"), (None, "Intro"));
        assert_eq!(split_track_prefix("1999"), (None, "1999"));
    }
}
