//! The playback core: sole owner of the play queue, driven by user commands.
//!
//! Directory listings, tag reads and cover reads happen off the interactive
//! loop. The core only applies their results: [`AlbumTracks`] via
//! [`PlaybackCore::play_loaded_album`], playlist entries via
//! [`PlaybackCore::play_entries`], covers via [`PlaybackCore::set_cover`].

use crate::album::{AlbumTracks, TrackEntry, TrackRow, entries_for_paths};
use crate::cover::CoverArt;
use crate::error::{CoreError, Result};
use crate::lrc::LyricContent;
use crate::palette::Palette;
use crate::player::MediaPlayer;
use crate::playlist::PlaylistStore;
use crate::queue::{RepeatMode, TrackSequenceEngine};
use crate::sync::SyncEngine;
use crate::tags::TagReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

const LOG_TARGET: &str = "vinyl::host";

/// Commands other components may issue to start playback.
pub trait PlaybackHost {
    /// Load an album directory and start at a logical track index.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::EmptyAlbum`] (queue unchanged) or a player error.
    fn play_album(&mut self, dir: &Path, start_index: usize) -> Result<()>;

    /// Load a named playlist and start at its first song.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::PlaylistNotFound`], [`CoreError::EmptyPlaylist`] or a player error.
    fn play_playlist(&mut self, name: &str) -> Result<()>;
}

/// View model of the now-playing panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NowPlaying {
    pub track: TrackEntry,
    pub cover: CoverArt,
    pub palette: Palette,
}

/// Cover and palette of the last track a cover was resolved for
#[derive(Debug, Clone)]
struct CachedCover {
    path: PathBuf,
    cover: CoverArt,
    palette: Palette,
}

pub struct PlaybackCore {
    player: Arc<dyn MediaPlayer>,
    reader: Arc<dyn TagReader>,
    sequence: TrackSequenceEngine,
    playlists: PlaylistStore,
    sync: Arc<SyncEngine>,
    /// Display rows of the loaded album; `None` while a playlist is loaded
    album: Option<AlbumTracks>,
    random_shuffle: bool,
    cover: Option<CachedCover>,
}

impl PlaybackCore {
    pub fn new(
        player: Arc<dyn MediaPlayer>,
        reader: Arc<dyn TagReader>,
        playlists: PlaylistStore,
        sync: Arc<SyncEngine>,
    ) -> Self {
        Self {
            sequence: TrackSequenceEngine::new(player.clone()),
            player,
            reader,
            playlists,
            sync,
            album: None,
            random_shuffle: false,
            cover: None,
        }
    }

    /// Play an album loaded elsewhere, starting at a logical track index.
    /// Turns random library shuffle off.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::TrackIndexOutOfRange`] or a player error; the queue is unchanged.
    pub fn play_loaded_album(&mut self, album: AlbumTracks, start_index: usize) -> Result<()> {
        self.load_album(album, start_index)?;
        self.random_shuffle = false;
        Ok(())
    }

    /// Play an album loaded elsewhere from `song` (or its first track if `song` is not in it).
    ///
    /// # Errors
    ///
    /// Returns a player error.
    pub fn play_loaded_album_from(&mut self, album: AlbumTracks, song: &Path) -> Result<()> {
        let index = album.index_of(song).unwrap_or(0);
        self.play_loaded_album(album, index)
    }

    /// Jump to a song if it is part of the loaded album.
    /// Returns `None` when the song's album still has to be loaded.
    pub fn jump_to_loaded_song(&self, song: &Path) -> Option<Result<()>> {
        self.album.as_ref()?;
        let index = self.sequence.queue().position_of(song)?;
        Some(self.sequence.jump_to(index))
    }

    /// Start random library shuffle with the album of a randomly picked song.
    ///
    /// # Errors
    ///
    /// Returns a player error; random shuffle stays off.
    pub fn start_random_shuffle(&mut self, album: AlbumTracks, song: &Path) -> Result<()> {
        info!(target: LOG_TARGET, "Random shuffle picked {}", song.display());
        let index = album.index_of(song).unwrap_or(0);
        self.load_album(album, index)?;
        self.random_shuffle = true;
        Ok(())
    }

    /// Turn random library shuffle off. Returns whether it was on.
    pub fn stop_random_shuffle(&mut self) -> bool {
        std::mem::take(&mut self.random_shuffle)
    }

    /// Toggle album shuffle; turns random library shuffle off.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::QueueEmpty`] when nothing is loaded.
    pub fn toggle_album_shuffle(&mut self) -> Result<bool> {
        if self.sequence.queue().is_empty() {
            return Err(CoreError::QueueEmpty);
        }
        self.random_shuffle = false;
        self.sequence.shuffle()
    }

    #[must_use]
    pub const fn is_random_shuffle(&self) -> bool {
        self.random_shuffle
    }

    #[must_use]
    pub const fn is_album_shuffle(&self) -> bool {
        self.sequence.queue().is_shuffled()
    }

    pub fn next(&self) -> bool {
        self.sequence.next()
    }

    pub fn previous(&self) -> bool {
        self.sequence.previous()
    }

    /// Play the track at a visual row of the track list.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotATrackRow`] for a disc heading.
    pub fn jump_to_row(&self, row: usize) -> Result<usize> {
        self.sequence.jump_to_row(&self.rows(), row)
    }

    /// Rows for the track list: disc headings for grouped albums, else one row per track
    #[must_use]
    pub fn rows(&self) -> Vec<TrackRow> {
        match &self.album {
            Some(album) if !self.sequence.queue().is_shuffled() => album.rows.clone(),
            _ => (0..self.sequence.queue().len()).map(TrackRow::Track).collect(),
        }
    }

    #[must_use]
    pub fn tracks(&self) -> &[TrackEntry] {
        self.sequence.queue().tracks()
    }

    /// Logical index of the playing track
    #[must_use]
    pub fn current_index(&self) -> Option<usize> {
        self.sequence.current_index()
    }

    #[must_use]
    pub fn current_track(&self) -> Option<&TrackEntry> {
        self.sequence.current_track()
    }

    #[must_use]
    pub const fn repeat_mode(&self) -> RepeatMode {
        self.sequence.repeat_mode()
    }

    pub fn toggle_pause(&self) {
        self.player.toggle_pause();
    }

    pub fn pause(&self) {
        self.player.pause();
    }

    pub fn set_volume(&self, volume: u8) {
        self.player.set_volume(volume.min(100));
    }

    #[must_use]
    pub fn volume(&self) -> u8 {
        self.player.volume()
    }

    pub fn set_repeat_mode(&mut self, mode: RepeatMode) {
        self.sequence.set_repeat_mode(mode);
    }

    pub fn cycle_repeat_mode(&mut self) -> RepeatMode {
        self.sequence.cycle_repeat_mode()
    }

    /// Seek the current track.
    pub fn seek_to(&self, time_ms: u64) {
        debug!(target: LOG_TARGET, "Seek to {time_ms} ms");
        self.player.set_time_ms(time_ms);
    }

    /// Seek to the start of a synced lyric line. Returns `false` if there is no such line.
    pub async fn seek_to_lyric_line(&self, index: usize) -> bool {
        let target = match self.sync.lyrics().await {
            LyricContent::Synced(doc) => doc.lines.get(index).map(|line| line.timestamp_ms),
            _ => None,
        };
        match target {
            Some(time_ms) => {
                self.seek_to(time_ms);
                true
            }
            None => false,
        }
    }

    pub async fn begin_seek_drag(&self) {
        self.sync.begin_seek_drag().await;
    }

    /// Returns the preview label for the dragged position
    pub async fn drag_seek_to(&self, position: u16) -> String {
        self.sync.drag_seek_to(position).await
    }

    /// Release the seek bar: issues exactly one seek, if the length is known.
    pub async fn end_seek_drag(&self) {
        if let Some(time_ms) = self.sync.end_seek_drag().await {
            self.seek_to(time_ms);
        }
    }

    /// Path of the current track when its cover has not been resolved yet
    #[must_use]
    pub fn cover_needed(&self) -> Option<PathBuf> {
        let track = self.sequence.current_track()?;
        match &self.cover {
            Some(cached) if cached.path == track.path => None,
            _ => Some(track.path.clone()),
        }
    }

    /// Remember the cover resolved for a track and derive its palette.
    pub fn set_cover(&mut self, path: PathBuf, cover: CoverArt) {
        let palette = Palette::from_cover(&cover);
        self.cover = Some(CachedCover {
            path,
            cover,
            palette,
        });
    }

    /// Now-playing view model. The placeholder cover stands in until
    /// [`set_cover`](Self::set_cover) has been called for the current track.
    #[must_use]
    pub fn now_playing(&self) -> Option<NowPlaying> {
        let track = self.sequence.current_track()?.clone();
        let (cover, palette) = match &self.cover {
            Some(cached) if cached.path == track.path => (cached.cover.clone(), cached.palette),
            _ => (CoverArt::Placeholder, Palette::default()),
        };
        Some(NowPlaying {
            track,
            cover,
            palette,
        })
    }

    #[must_use]
    pub const fn playlists(&self) -> &PlaylistStore {
        &self.playlists
    }

    pub fn playlists_mut(&mut self) -> &mut PlaylistStore {
        &mut self.playlists
    }

    /// Songs of a playlist, ready to be tagged off the interactive loop.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::PlaylistNotFound`] or [`CoreError::EmptyPlaylist`].
    pub fn playlist_songs(&self, name: &str) -> Result<Vec<PathBuf>> {
        let songs = self.playlists.songs(name)?;
        if songs.is_empty() {
            return Err(CoreError::EmptyPlaylist {
                name: name.to_string(),
            });
        }
        Ok(songs.to_vec())
    }

    /// Play tagged playlist entries from the first song.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::QueueEmpty`] for no entries or a player error.
    pub fn play_entries(&mut self, name: &str, entries: Vec<TrackEntry>) -> Result<()> {
        info!(target: LOG_TARGET, "Playing playlist {name:?} ({} songs)", entries.len());
        self.sequence.load(entries)?;
        self.album = None;
        self.random_shuffle = false;
        Ok(())
    }

    /// Append the current track to a playlist.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::QueueEmpty`] if nothing is playing or
    /// [`CoreError::PlaylistNotFound`] for an unknown playlist.
    pub fn add_current_to_playlist(&mut self, name: &str) -> Result<()> {
        let path = self
            .sequence
            .current_track()
            .map(|t| t.path.clone())
            .ok_or(CoreError::QueueEmpty)?;
        self.playlists.add_song(name, path)
    }

    fn load_album(&mut self, album: AlbumTracks, start_index: usize) -> Result<()> {
        info!(target: LOG_TARGET, "Playing album {} from track {}", album.dir.display(), start_index);
        self.sequence.load_at(album.tracks.clone(), start_index)?;
        self.album = Some(album);
        Ok(())
    }
}

impl PlaybackHost for PlaybackCore {
    fn play_album(&mut self, dir: &Path, start_index: usize) -> Result<()> {
        let album = AlbumTracks::load(dir, self.reader.as_ref())?;
        self.play_loaded_album(album, start_index)
    }

    fn play_playlist(&mut self, name: &str) -> Result<()> {
        let songs = self.playlist_songs(name)?;
        let entries = entries_for_paths(&songs, self.reader.as_ref());
        self.play_entries(name, entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::{LyricsLoader, MediaIdentity};
    use crate::cover::tests::png_bytes;
    use crate::lrc::LyricDocument;
    use crate::palette::Rgb;
    use crate::playback::PlaybackSnapshot;
    use crate::player::testing::RecordingPlayer;
    use crate::tags::{EmbeddedPicture, NoTags};
    use std::fs::{self, File};
    use tempfile::TempDir;

    struct FixedLyrics;

    impl LyricsLoader for FixedLyrics {
        fn load(&self, _media: &MediaIdentity) -> LyricContent {
            LyricContent::Synced(LyricDocument::parse("[00:01.00]one\n[00:04.50]two"))
        }
    }

    struct Fixture {
        _dir: TempDir,
        root: PathBuf,
        player: Arc<RecordingPlayer>,
        core: PlaybackCore,
    }

    fn fixture() -> Fixture {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("Tracks");
        for path in [
            "Artist/Album/01 - One.mp3",
            "Artist/Album/02 - Two.mp3",
            "Artist/Album/10 - Ten.mp3",
            "Artist/Other/01 - Elsewhere.mp3",
            "Artist/Empty/readme.txt",
        ] {
            let path = root.join(path);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            File::create(path).unwrap();
        }

        let player = Arc::new(RecordingPlayer::default());
        let core = PlaybackCore::new(
            player.clone(),
            Arc::new(NoTags),
            PlaylistStore::load(dir.path().join("playlists.json")),
            SyncEngine::new(Arc::new(FixedLyrics)),
        );
        Fixture {
            _dir: dir,
            root,
            player,
            core,
        }
    }

    fn album(f: &Fixture, name: &str) -> AlbumTracks {
        AlbumTracks::load(&f.root.join("Artist").join(name), &NoTags).unwrap()
    }

    #[test]
    fn test_play_album_starts_at_index() {
        let mut f = fixture();
        f.core.play_album(&f.root.join("Artist/Album"), 2).unwrap();
        assert_eq!(f.player.state.lock().index, Some(2));
        assert_eq!(f.core.now_playing().unwrap().track.display_title, "Ten");
        assert_eq!(f.core.now_playing().unwrap().palette, Palette::default());
    }

    #[test]
    fn test_empty_album_leaves_queue_unchanged() {
        let mut f = fixture();
        f.core.play_album(&f.root.join("Artist/Album"), 0).unwrap();
        let err = f.core.play_album(&f.root.join("Artist/Empty"), 0).unwrap_err();
        assert!(matches!(err, CoreError::EmptyAlbum { .. }));
        assert_eq!(f.core.tracks().len(), 3);
    }

    #[test]
    fn test_playlists_through_host() {
        let mut f = fixture();
        assert!(matches!(
            f.core.play_playlist("nope"),
            Err(CoreError::PlaylistNotFound { .. })
        ));

        f.core.playlists_mut().create("Fav").unwrap();
        assert!(matches!(
            f.core.play_playlist("Fav"),
            Err(CoreError::EmptyPlaylist { .. })
        ));

        f.core.play_album(&f.root.join("Artist/Album"), 1).unwrap();
        f.core.add_current_to_playlist("Fav").unwrap();
        f.core.play_playlist("Fav").unwrap();
        assert_eq!(f.core.tracks().len(), 1);
        assert_eq!(f.core.tracks()[0].display_title, "Two");
        assert!(f.core.jump_to_loaded_song(&f.core.tracks()[0].path.clone()).is_none());
    }

    #[test]
    fn test_found_song_jumps_within_loaded_album() {
        let mut f = fixture();
        let song = f.root.join("Artist/Album/02 - Two.mp3");
        assert!(f.core.jump_to_loaded_song(&song).is_none());

        let loaded = album(&f, "Album");
        f.core.play_loaded_album_from(loaded, &song).unwrap();
        assert_eq!(f.player.state.lock().index, Some(1));

        let ten = f.root.join("Artist/Album/10 - Ten.mp3");
        f.core.jump_to_loaded_song(&ten).unwrap().unwrap();
        assert_eq!(f.player.state.lock().index, Some(2));

        let elsewhere = f.root.join("Artist/Other/01 - Elsewhere.mp3");
        assert!(f.core.jump_to_loaded_song(&elsewhere).is_none());
    }

    #[test]
    fn test_random_and_album_shuffle_are_exclusive() {
        let mut f = fixture();
        let song = f.root.join("Artist/Album/10 - Ten.mp3");

        f.core.start_random_shuffle(album(&f, "Album"), &song).unwrap();
        assert!(f.core.is_random_shuffle());
        assert_eq!(f.core.current_index(), Some(2));

        assert!(f.core.toggle_album_shuffle().unwrap());
        assert!(!f.core.is_random_shuffle());
        assert!(f.core.is_album_shuffle());
        assert_eq!(f.core.rows().len(), 3);

        assert!(!f.core.toggle_album_shuffle().unwrap());
        f.core.start_random_shuffle(album(&f, "Album"), &song).unwrap();
        assert!(f.core.stop_random_shuffle());
        assert!(!f.core.stop_random_shuffle());
        assert!(!f.core.is_random_shuffle());
    }

    #[test]
    fn test_loaded_album_with_bad_index_keeps_queue() {
        let mut f = fixture();
        f.core.play_loaded_album(album(&f, "Other"), 0).unwrap();
        assert!(matches!(
            f.core.play_loaded_album(album(&f, "Album"), 7),
            Err(CoreError::TrackIndexOutOfRange { index: 7, len: 3 })
        ));
        assert_eq!(f.core.tracks().len(), 1);
    }

    #[test]
    fn test_cover_is_cached_per_track() {
        let mut f = fixture();
        assert!(f.core.cover_needed().is_none());

        f.core.play_loaded_album(album(&f, "Album"), 0).unwrap();
        let first = f.core.cover_needed().unwrap();
        assert_eq!(f.core.now_playing().unwrap().cover, CoverArt::Placeholder);

        let cover = CoverArt::from_picture(EmbeddedPicture {
            data: png_bytes(2, 2, [250, 250, 250]),
            mime_type: None,
        });
        f.core.set_cover(first, cover.clone());
        assert!(f.core.cover_needed().is_none());
        let now = f.core.now_playing().unwrap();
        assert_eq!(now.cover, cover);
        assert_eq!(now.palette.text, Rgb::BLACK);

        assert!(f.core.next());
        assert!(f.core.cover_needed().is_some());
        assert_eq!(f.core.now_playing().unwrap().palette, Palette::default());
    }

    #[tokio::test]
    async fn test_seek_to_lyric_line() {
        let mut f = fixture();
        f.core.play_album(&f.root.join("Artist/Album"), 0).unwrap();
        f.core
            .sync
            .update_state(PlaybackSnapshot::capture(f.player.as_ref()))
            .await;

        assert!(f.core.seek_to_lyric_line(1).await);
        assert_eq!(f.player.state.lock().time_ms, 4500);
        assert!(!f.core.seek_to_lyric_line(5).await);
    }

    #[test]
    fn test_volume_is_clamped() {
        let f = fixture();
        f.core.set_volume(180);
        assert_eq!(f.core.volume(), 100);
    }
}
