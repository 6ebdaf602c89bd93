//! A [`MediaPlayer`] that advances through its media list on the wall clock.
//!
//! No audio is decoded. Item lengths come from the tag reader; elapsed time
//! is measured with [`tokio::time::Instant`] so tests can pause and advance
//! the clock. Reaching the end of an item moves the cursor the way the
//! current [`PlaybackMode`] dictates.

use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use vinyl_core::{CoreError, DurationExt, MediaPlayer, PlaybackMode, TagReader};

const LOG_TARGET: &str = "vinyl::engine::clock";

pub struct ClockPlayer {
    reader: Arc<dyn TagReader>,
    state: Mutex<ClockState>,
}

struct ClockState {
    list: Vec<PathBuf>,
    index: Option<usize>,
    mode: PlaybackMode,
    /// Unknown lengths never end on their own
    length: Option<Duration>,
    /// Position at `anchor`, or the frozen position while paused
    position: Duration,
    /// Set while playing
    anchor: Option<Instant>,
    volume: u8,
    error: Option<String>,
}

impl ClockState {
    fn elapsed(&self) -> Duration {
        self.anchor
            .map_or(self.position, |anchor| self.position + anchor.elapsed())
    }

    fn freeze(&mut self) {
        self.position = self.elapsed();
        self.anchor = None;
    }

    fn stop(&mut self) {
        self.index = None;
        self.length = None;
        self.position = Duration::ZERO;
        self.anchor = None;
    }
}

impl ClockPlayer {
    #[must_use]
    pub fn new(reader: Arc<dyn TagReader>) -> Self {
        Self {
            reader,
            state: Mutex::new(ClockState {
                list: Vec::new(),
                index: None,
                mode: PlaybackMode::Default,
                length: None,
                position: Duration::ZERO,
                anchor: None,
                volume: 100,
                error: None,
            }),
        }
    }

    /// Load the item at `index` and start it from zero.
    fn open(&self, state: &mut ClockState, index: usize) -> vinyl_core::Result<()> {
        let Some(path) = state.list.get(index).cloned() else {
            return Err(CoreError::TrackIndexOutOfRange {
                index,
                len: state.list.len(),
            });
        };

        if !path.is_file() {
            let reason = format!("cannot open {}", path.display());
            warn!(target: LOG_TARGET, "{}", reason);
            state.error = Some(reason.clone());
            return Err(CoreError::Player { reason });
        }

        state.index = Some(index);
        state.length = self.reader.read_tags_or_default(&path).duration;
        state.position = Duration::ZERO;
        state.anchor = Some(Instant::now());
        debug!(
            target: LOG_TARGET,
            "Playing item {} ({}), length {:?}",
            index,
            path.display(),
            state.length
        );
        Ok(())
    }

    /// Open `index`, or stop with the error recorded for the next poll.
    fn open_or_stop(&self, state: &mut ClockState, index: usize) {
        if self.open(state, index).is_err() {
            state.stop();
        }
    }

    /// Roll over every item boundary crossed since the last call.
    fn settle(&self, state: &mut ClockState) {
        while let (Some(index), Some(length), Some(_)) = (state.index, state.length, state.anchor) {
            let elapsed = state.elapsed();
            if length.is_zero() || elapsed < length {
                return;
            }
            let overflow = elapsed - length;

            let next = match state.mode {
                PlaybackMode::Repeat => Some(index),
                PlaybackMode::Loop => Some((index + 1) % state.list.len().max(1)),
                PlaybackMode::Default => Some(index + 1).filter(|&i| i < state.list.len()),
            };

            let Some(next) = next else {
                info!(target: LOG_TARGET, "Reached the end of the media list");
                state.stop();
                return;
            };

            self.open_or_stop(state, next);
            if state.anchor.is_some() {
                state.position = overflow;
            }
        }
    }

    fn settled(&self) -> parking_lot::MutexGuard<'_, ClockState> {
        let mut state = self.state.lock();
        self.settle(&mut state);
        state
    }

    fn step(&self, forward: bool) -> bool {
        let mut state = self.settled();
        let Some(index) = state.index else {
            return false;
        };
        let len = state.list.len();

        let target = match (state.mode, forward) {
            (PlaybackMode::Repeat, _) => Some(index),
            (PlaybackMode::Loop, true) => Some((index + 1) % len),
            (PlaybackMode::Loop, false) => Some(index.checked_sub(1).unwrap_or(len - 1)),
            (PlaybackMode::Default, true) => Some(index + 1).filter(|&i| i < len),
            (PlaybackMode::Default, false) => index.checked_sub(1),
        };

        match target {
            Some(target) => {
                self.open_or_stop(&mut state, target);
                true
            }
            None => false,
        }
    }
}

/// `file://` locator with each path segment percent-encoded
fn file_mrl(path: &Path) -> String {
    let encoded = path
        .to_string_lossy()
        .split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/");
    format!("file://{encoded}")
}

impl MediaPlayer for ClockPlayer {
    fn set_media_list(&self, paths: Vec<PathBuf>) {
        let mut state = self.state.lock();
        debug!(target: LOG_TARGET, "Media list replaced ({} items)", paths.len());
        state.list = paths;
        state.stop();
    }

    fn play_at(&self, index: usize) -> vinyl_core::Result<()> {
        let mut state = self.state.lock();
        self.open(&mut state, index)
    }

    fn next(&self) -> bool {
        self.step(true)
    }

    fn previous(&self) -> bool {
        self.step(false)
    }

    fn current_index(&self) -> Option<usize> {
        self.settled().index
    }

    fn toggle_pause(&self) {
        let mut state = self.settled();
        if state.anchor.is_some() {
            state.freeze();
        } else if state.index.is_some() {
            state.anchor = Some(Instant::now());
        }
    }

    fn pause(&self) {
        let mut state = self.settled();
        if state.anchor.is_some() {
            state.freeze();
        }
    }

    fn is_playing(&self) -> bool {
        self.settled().anchor.is_some()
    }

    fn time_ms(&self) -> i64 {
        let state = self.settled();
        if state.index.is_none() {
            return -1;
        }
        state.elapsed().as_millis_i64()
    }

    fn set_time_ms(&self, time_ms: u64) {
        let mut state = self.settled();
        if state.index.is_none() {
            return;
        }
        let target = Duration::from_millis(time_ms);
        state.position = state.length.map_or(target, |length| target.min(length));
        if state.anchor.is_some() {
            state.anchor = Some(Instant::now());
        }
    }

    fn length_ms(&self) -> i64 {
        self.settled()
            .length
            .map_or(0, |length| length.as_millis_i64())
    }

    fn set_volume(&self, volume: u8) {
        self.state.lock().volume = volume.min(100);
    }

    fn volume(&self) -> u8 {
        self.state.lock().volume
    }

    fn set_playback_mode(&self, mode: PlaybackMode) {
        self.state.lock().mode = mode;
    }

    fn current_media(&self) -> Option<String> {
        let state = self.settled();
        state
            .index
            .and_then(|index| state.list.get(index))
            .map(|path| file_mrl(path))
    }

    fn take_error(&self) -> Option<String> {
        self.state.lock().error.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;
    use vinyl_core::{MediaIdentity, TrackTags};

    /// Every file is ten seconds long
    struct TenSeconds;

    impl TagReader for TenSeconds {
        fn name(&self) -> &'static str {
            "ten-seconds"
        }

        fn read_tags(&self, _path: &Path) -> vinyl_core::Result<TrackTags> {
            Ok(TrackTags {
                duration: Some(Duration::from_secs(10)),
                ..TrackTags::default()
            })
        }

        fn read_picture(
            &self,
            _path: &Path,
        ) -> vinyl_core::Result<Option<vinyl_core::EmbeddedPicture>> {
            Ok(None)
        }
    }

    fn album(names: &[&str]) -> (TempDir, Vec<PathBuf>) {
        let dir = TempDir::new().unwrap();
        let paths = names
            .iter()
            .map(|name| {
                let path = dir.path().join(name);
                fs::write(&path, b"").unwrap();
                path
            })
            .collect();
        (dir, paths)
    }

    fn player_with(paths: Vec<PathBuf>) -> ClockPlayer {
        let player = ClockPlayer::new(Arc::new(TenSeconds));
        player.set_media_list(paths);
        player
    }

    #[tokio::test(start_paused = true)]
    async fn test_nothing_loaded() {
        let player = player_with(Vec::new());
        assert_eq!(player.time_ms(), -1);
        assert_eq!(player.current_index(), None);
        assert!(!player.is_playing());
        assert!(!player.next());
        assert!(player.current_media().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_clock_advances_while_playing() {
        let (_dir, paths) = album(&["a.mp3", "b.mp3"]);
        let player = player_with(paths);
        player.play_at(0).unwrap();

        tokio::time::advance(Duration::from_millis(2_500)).await;
        assert_eq!(player.time_ms(), 2_500);
        assert_eq!(player.length_ms(), 10_000);
        assert!(player.is_playing());
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_freezes_position() {
        let (_dir, paths) = album(&["a.mp3"]);
        let player = player_with(paths);
        player.play_at(0).unwrap();

        tokio::time::advance(Duration::from_secs(1)).await;
        player.toggle_pause();
        tokio::time::advance(Duration::from_secs(5)).await;
        assert_eq!(player.time_ms(), 1_000);
        assert!(!player.is_playing());

        player.toggle_pause();
        tokio::time::advance(Duration::from_secs(1)).await;
        assert_eq!(player.time_ms(), 2_000);
    }

    #[tokio::test(start_paused = true)]
    async fn test_auto_advance_carries_overflow() {
        let (_dir, paths) = album(&["a.mp3", "b.mp3"]);
        let player = player_with(paths);
        player.play_at(0).unwrap();

        tokio::time::advance(Duration::from_millis(10_300)).await;
        assert_eq!(player.current_index(), Some(1));
        assert_eq!(player.time_ms(), 300);
    }

    #[tokio::test(start_paused = true)]
    async fn test_default_mode_stops_after_last_item() {
        let (_dir, paths) = album(&["a.mp3"]);
        let player = player_with(paths);
        player.play_at(0).unwrap();

        tokio::time::advance(Duration::from_secs(11)).await;
        assert_eq!(player.current_index(), None);
        assert!(!player.is_playing());
        assert!(player.current_media().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_loop_mode_wraps() {
        let (_dir, paths) = album(&["a.mp3", "b.mp3"]);
        let player = player_with(paths);
        player.set_playback_mode(PlaybackMode::Loop);
        player.play_at(1).unwrap();

        tokio::time::advance(Duration::from_secs(10)).await;
        assert_eq!(player.current_index(), Some(0));

        assert!(player.previous());
        assert_eq!(player.current_index(), Some(1));
        assert!(player.next());
        assert_eq!(player.current_index(), Some(0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_repeat_mode_replays_item() {
        let (_dir, paths) = album(&["a.mp3", "b.mp3"]);
        let player = player_with(paths);
        player.set_playback_mode(PlaybackMode::Repeat);
        player.play_at(0).unwrap();

        tokio::time::advance(Duration::from_secs(25)).await;
        assert_eq!(player.current_index(), Some(0));
        assert_eq!(player.time_ms(), 5_000);
    }

    #[tokio::test(start_paused = true)]
    async fn test_default_mode_edges() {
        let (_dir, paths) = album(&["a.mp3", "b.mp3"]);
        let player = player_with(paths);
        player.play_at(0).unwrap();

        assert!(!player.previous());
        assert!(player.next());
        assert_eq!(player.current_index(), Some(1));
        assert!(!player.next());
        assert_eq!(player.current_index(), Some(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_seek_is_clamped_to_length() {
        let (_dir, paths) = album(&["a.mp3"]);
        let player = player_with(paths);
        player.play_at(0).unwrap();
        player.pause();

        player.set_time_ms(4_000);
        assert_eq!(player.time_ms(), 4_000);
        player.set_time_ms(99_000);
        assert_eq!(player.time_ms(), 10_000);
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_item_reports_error() {
        let (dir, mut paths) = album(&["a.mp3"]);
        paths.push(dir.path().join("gone.mp3"));
        let player = player_with(paths);

        assert!(matches!(player.play_at(1), Err(CoreError::Player { .. })));
        assert!(player.take_error().is_some());
        assert!(player.take_error().is_none());

        assert!(matches!(
            player.play_at(5),
            Err(CoreError::TrackIndexOutOfRange { index: 5, len: 2 })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_auto_advance_into_missing_item_stops() {
        let (dir, mut paths) = album(&["a.mp3"]);
        paths.push(dir.path().join("gone.mp3"));
        let player = player_with(paths);
        player.play_at(0).unwrap();

        tokio::time::advance(Duration::from_secs(10)).await;
        assert_eq!(player.current_index(), None);
        assert!(player.take_error().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_media_locator_round_trips_through_identity() {
        let (_dir, paths) = album(&["01 - Sé Tu Nombre #1.mp3"]);
        let player = player_with(paths.clone());
        player.play_at(0).unwrap();

        let mrl = player.current_media().unwrap();
        assert!(mrl.starts_with("file://"));
        assert!(!mrl.contains(' '));

        let identity = MediaIdentity::from_mrl(&mrl).unwrap();
        assert_eq!(identity.path, paths[0]);
        assert_eq!(identity.basename, "01 - Sé Tu Nombre #1.mp3");
    }

    #[test]
    fn test_volume_is_clamped() {
        let player = ClockPlayer::new(Arc::new(TenSeconds));
        assert_eq!(player.volume(), 100);
        player.set_volume(250);
        assert_eq!(player.volume(), 100);
        player.set_volume(30);
        assert_eq!(player.volume(), 30);
    }
}
