//! Maps the player's reported position onto the progress bar and the lyrics panel.
//!
//! The bridge is fed one reading per poll tick. It reloads lyrics only when
//! the normalized media identity changes, tracks the active lyric line and
//! keeps position updates off the seek bar while the user drags it.

use crate::formats::companion_lyrics_path;
use crate::lrc::LyricContent;
use crate::time::{clamp_millis, format_progress, known_length};
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

const LOG_TARGET: &str = "vinyl::bridge";

/// Seek bar resolution; positions are in permille of the track length
pub const SEEK_RANGE: u16 = 1000;

/// Normalized identity of the media the player is on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MediaIdentity {
    /// Decoded filesystem path
    pub path: PathBuf,
    pub basename: String,
}

impl MediaIdentity {
    /// Parse a media resource locator (`file:///music/a%20b.mp3`) or plain path.
    #[must_use]
    pub fn from_mrl(mrl: &str) -> Option<Self> {
        let raw = mrl.strip_prefix("file://").unwrap_or(mrl);
        if raw.is_empty() {
            return None;
        }
        let decoded = urlencoding::decode(raw).map_or_else(|_| raw.to_string(), Cow::into_owned);
        Some(Self::from_path(Path::new(&decoded)))
    }

    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        let basename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            path: path.to_path_buf(),
            basename,
        }
    }

    /// Companion `.lrc` next to the track
    #[must_use]
    pub fn lyrics_path(&self) -> PathBuf {
        companion_lyrics_path(&self.path)
    }
}

/// Position state updated every tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlaybackCursor {
    pub current_time_ms: u64,
    /// `None` when the player does not know the length
    pub total_time_ms: Option<u64>,
    pub active_lyric_index: Option<usize>,
}

impl PlaybackCursor {
    /// "mm:ss / mm:ss", with a sentinel for unknown length
    #[must_use]
    pub fn progress_label(&self) -> String {
        format_progress(self.current_time_ms, self.total_time_ms)
    }

    /// Seek bar position, `None` when the length is unknown
    #[must_use]
    pub fn seek_position(&self) -> Option<u16> {
        let total = self.total_time_ms.filter(|&t| t > 0)?;
        let permille = self.current_time_ms.min(total) * u64::from(SEEK_RANGE) / total;
        u16::try_from(permille).ok()
    }
}

/// Loads the lyrics for a newly started track.
pub trait LyricsLoader: Send + Sync {
    fn load(&self, media: &MediaIdentity) -> LyricContent;
}

/// Reads the companion `.lrc` file from disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsLyricsLoader {
    offset_ms: u64,
}

impl FsLyricsLoader {
    #[must_use]
    pub const fn new(offset_ms: u64) -> Self {
        Self { offset_ms }
    }
}

impl LyricsLoader for FsLyricsLoader {
    fn load(&self, media: &MediaIdentity) -> LyricContent {
        LyricContent::load(&media.lyrics_path(), self.offset_ms)
    }
}

/// What changed on one tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickUpdate {
    pub cursor: PlaybackCursor,
    pub progress_label: String,
    /// Seek bar value to display; `None` while the user drags or the length is unknown
    pub seek_position: Option<u16>,
    /// The media identity differs from the previous tick
    pub track_changed: bool,
    /// Freshly loaded lyrics, present only on the tick that changed track
    pub lyrics: Option<LyricContent>,
    pub lyric_line_changed: bool,
}

pub struct PlaybackPositionBridge {
    loader: Arc<dyn LyricsLoader>,
    media: Option<MediaIdentity>,
    lyrics: LyricContent,
    cursor: PlaybackCursor,
    /// Seek bar value while a drag is in progress
    drag: Option<u16>,
}

impl PlaybackPositionBridge {
    #[must_use]
    pub fn new(loader: Arc<dyn LyricsLoader>) -> Self {
        Self {
            loader,
            media: None,
            lyrics: LyricContent::Empty,
            cursor: PlaybackCursor::default(),
            drag: None,
        }
    }

    /// Fold one player reading into the cursor.
    pub fn on_tick(&mut self, current_time_ms: i64, total_time_ms: i64, media: Option<&str>) -> TickUpdate {
        let identity = media.and_then(MediaIdentity::from_mrl);

        let track_changed = identity != self.media;
        let mut lyrics = None;
        if track_changed {
            self.cursor.active_lyric_index = None;
            self.lyrics = match &identity {
                Some(id) => {
                    debug!(target: LOG_TARGET, "Media changed to {}", id.basename);
                    let content = self.loader.load(id);
                    lyrics = Some(content.clone());
                    content
                }
                None => LyricContent::Empty,
            };
            self.media = identity;
        }

        self.cursor.current_time_ms = clamp_millis(current_time_ms);
        self.cursor.total_time_ms = known_length(total_time_ms);

        let previous_index = self.cursor.active_lyric_index;
        self.cursor.active_lyric_index = self
            .lyrics
            .as_synced()
            .and_then(|doc| doc.active_index_at(self.cursor.current_time_ms, previous_index));

        TickUpdate {
            cursor: self.cursor,
            progress_label: self.cursor.progress_label(),
            seek_position: if self.drag.is_some() {
                None
            } else {
                self.cursor.seek_position()
            },
            track_changed,
            lyrics,
            lyric_line_changed: self.cursor.active_lyric_index != previous_index,
        }
    }

    /// The user grabbed the seek bar.
    pub fn begin_drag(&mut self) {
        self.drag = Some(self.cursor.seek_position().unwrap_or(0));
    }

    /// The user moved the seek bar; returns the preview label for that position.
    pub fn drag_to(&mut self, position: u16) -> String {
        let position = position.min(SEEK_RANGE);
        self.drag = Some(position);
        let target = self.drag_target_ms(position).unwrap_or(self.cursor.current_time_ms);
        format_progress(target, self.cursor.total_time_ms)
    }

    /// The user released the seek bar; returns the time to seek to, if the length is known.
    pub fn end_drag(&mut self) -> Option<u64> {
        let position = self.drag.take()?;
        let target = self.drag_target_ms(position)?;
        self.cursor.current_time_ms = target;
        Some(target)
    }

    #[must_use]
    pub const fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    fn drag_target_ms(&self, position: u16) -> Option<u64> {
        let total = self.cursor.total_time_ms?;
        Some(total * u64::from(position) / u64::from(SEEK_RANGE))
    }

    #[must_use]
    pub const fn cursor(&self) -> &PlaybackCursor {
        &self.cursor
    }

    #[must_use]
    pub const fn lyrics(&self) -> &LyricContent {
        &self.lyrics
    }

    #[must_use]
    pub const fn media(&self) -> Option<&MediaIdentity> {
        self.media.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lrc::LyricDocument;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingLoader {
        loads: AtomicUsize,
    }

    impl LyricsLoader for CountingLoader {
        fn load(&self, _media: &MediaIdentity) -> LyricContent {
            self.loads.fetch_add(1, Ordering::SeqCst);
            LyricContent::Synced(LyricDocument::parse(
                "[00:01.00]one\n[00:02.00]two\n[00:03.00]three",
            ))
        }
    }

    fn bridge() -> (Arc<CountingLoader>, PlaybackPositionBridge) {
        let loader = Arc::new(CountingLoader::default());
        let bridge = PlaybackPositionBridge::new(loader.clone());
        (loader, bridge)
    }

    #[test]
    fn test_lyrics_reload_once_per_identity_change() {
        let (loader, mut bridge) = bridge();

        let first = bridge.on_tick(0, 10_000, Some("file:///music/a.mp3"));
        assert!(first.track_changed);
        assert!(first.lyrics.is_some());
        for t in [50, 100, 150] {
            let update = bridge.on_tick(t, 10_000, Some("file:///music/a.mp3"));
            assert!(!update.track_changed);
            assert!(update.lyrics.is_none());
        }
        assert_eq!(loader.loads.load(Ordering::SeqCst), 1);

        bridge.on_tick(0, 10_000, Some("file:///music/b.mp3"));
        bridge.on_tick(50, 10_000, Some("file:///music/b.mp3"));
        assert_eq!(loader.loads.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_encoded_and_plain_locators_are_the_same_identity() {
        let (loader, mut bridge) = bridge();
        bridge.on_tick(0, 1000, Some("file:///music/My%20Song.mp3"));
        let update = bridge.on_tick(10, 1000, Some("/music/My Song.mp3"));
        assert!(!update.track_changed);
        assert_eq!(loader.loads.load(Ordering::SeqCst), 1);
        assert_eq!(bridge.media().unwrap().basename, "My Song.mp3");
    }

    #[test]
    fn test_media_identity_lyrics_path() {
        let id = MediaIdentity::from_mrl("file:///music/Artist/Album/01%20-%20Intro.flac").unwrap();
        assert_eq!(id.path, PathBuf::from("/music/Artist/Album/01 - Intro.flac"));
        assert_eq!(id.lyrics_path(), PathBuf::from("/music/Artist/Album/01 - Intro.lrc"));
        assert!(MediaIdentity::from_mrl("file://").is_none());
    }

    #[test]
    fn test_active_line_changes_only_on_boundaries() {
        let (_, mut bridge) = bridge();
        let media = Some("file:///music/a.mp3");

        assert_eq!(bridge.on_tick(500, 5000, media).cursor.active_lyric_index, None);
        let update = bridge.on_tick(1000, 5000, media);
        assert_eq!(update.cursor.active_lyric_index, Some(0));
        assert!(update.lyric_line_changed);
        assert!(!bridge.on_tick(1500, 5000, media).lyric_line_changed);
        // Backward seek
        let update = bridge.on_tick(200, 5000, media);
        assert_eq!(update.cursor.active_lyric_index, None);
        assert!(update.lyric_line_changed);
    }

    #[test]
    fn test_unknown_length_uses_sentinel() {
        let (_, mut bridge) = bridge();
        let update = bridge.on_tick(65_000, 0, Some("file:///music/a.mp3"));
        assert_eq!(update.progress_label, "01:05 / --:--");
        assert_eq!(update.seek_position, None);
        let update = bridge.on_tick(-1, -1, None);
        assert_eq!(update.progress_label, "00:00 / --:--");
    }

    #[test]
    fn test_drag_suppresses_position_and_seeks_once() {
        let (_, mut bridge) = bridge();
        let media = Some("file:///music/a.mp3");
        assert_eq!(bridge.on_tick(1000, 10_000, media).seek_position, Some(100));

        bridge.begin_drag();
        assert_eq!(bridge.drag_to(500), "00:05 / 00:10");
        let update = bridge.on_tick(1050, 10_000, media);
        assert_eq!(update.seek_position, None);
        assert_eq!(update.cursor.current_time_ms, 1050);

        assert_eq!(bridge.end_drag(), Some(5000));
        assert_eq!(bridge.end_drag(), None);
        assert_eq!(bridge.on_tick(5000, 10_000, media).seek_position, Some(500));
    }
}
