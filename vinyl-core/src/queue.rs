//! The active play queue and the engine that drives the player through it.

use crate::album::{TrackEntry, TrackRow, row_to_track_index};
use crate::error::{CoreError, Result};
use crate::player::{MediaPlayer, PlaybackMode};
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

const LOG_TARGET: &str = "vinyl::queue";

/// Ordered tracks plus the pre-shuffle order while shuffle is active.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlayQueue {
    tracks: Vec<TrackEntry>,
    original_order: Option<Vec<TrackEntry>>,
}

impl PlayQueue {
    /// Replace the tracks and forget any shuffle snapshot
    pub fn load(&mut self, tracks: Vec<TrackEntry>) {
        self.tracks = tracks;
        self.original_order = None;
    }

    #[must_use]
    pub fn tracks(&self) -> &[TrackEntry] {
        &self.tracks
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&TrackEntry> {
        self.tracks.get(index)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    #[must_use]
    pub const fn is_shuffled(&self) -> bool {
        self.original_order.is_some()
    }

    #[must_use]
    pub fn position_of(&self, path: &Path) -> Option<usize> {
        self.tracks.iter().position(|t| t.path == path)
    }

    /// Snapshot the current order and permute. No-op (returns `false`) if already shuffled.
    pub fn shuffle_with<R: Rng + ?Sized>(&mut self, rng: &mut R) -> bool {
        if self.is_shuffled() {
            return false;
        }
        self.original_order = Some(self.tracks.clone());
        self.tracks.shuffle(rng);
        true
    }

    /// Restore the snapshot. No-op (returns `false`) if not shuffled.
    pub fn unshuffle(&mut self) -> bool {
        match self.original_order.take() {
            Some(original) => {
                self.tracks = original;
                true
            }
            None => false,
        }
    }
}

/// Repeat setting shown on the repeat button; cycles Off -> Queue -> Track.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RepeatMode {
    #[default]
    #[serde(rename = "off")]
    Off,
    #[serde(rename = "queue")]
    RepeatQueue,
    #[serde(rename = "track")]
    RepeatTrack,
}

impl RepeatMode {
    #[must_use]
    pub const fn cycle(self) -> Self {
        match self {
            Self::Off => Self::RepeatQueue,
            Self::RepeatQueue => Self::RepeatTrack,
            Self::RepeatTrack => Self::Off,
        }
    }

    /// Native player mode implementing this setting
    #[must_use]
    pub const fn playback_mode(self) -> PlaybackMode {
        match self {
            Self::Off => PlaybackMode::Default,
            Self::RepeatQueue => PlaybackMode::Loop,
            Self::RepeatTrack => PlaybackMode::Repeat,
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Off => "Repeat off",
            Self::RepeatQueue => "Repeat queue",
            Self::RepeatTrack => "Repeat track",
        }
    }
}

/// Owns the [`PlayQueue`] and keeps the player's media list in step with it.
///
/// The index cursor lives in the player; boundary behaviour of `next` and
/// `previous` is the player's native [`PlaybackMode`].
pub struct TrackSequenceEngine {
    queue: PlayQueue,
    player: Arc<dyn MediaPlayer>,
    repeat: RepeatMode,
}

impl TrackSequenceEngine {
    pub fn new(player: Arc<dyn MediaPlayer>) -> Self {
        Self {
            queue: PlayQueue::default(),
            player,
            repeat: RepeatMode::default(),
        }
    }

    /// Replace the queue and start at the first track.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::QueueEmpty`] for an empty list (the queue is left
    /// unchanged) or the player's error if playback cannot start.
    pub fn load(&mut self, tracks: Vec<TrackEntry>) -> Result<()> {
        self.load_at(tracks, 0)
    }

    /// Replace the queue and start at `start`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::QueueEmpty`] for an empty list,
    /// [`CoreError::TrackIndexOutOfRange`] for a bad start index, or the
    /// player's error if playback cannot start.
    pub fn load_at(&mut self, tracks: Vec<TrackEntry>, start: usize) -> Result<()> {
        if tracks.is_empty() {
            return Err(CoreError::QueueEmpty);
        }
        if start >= tracks.len() {
            return Err(CoreError::TrackIndexOutOfRange {
                index: start,
                len: tracks.len(),
            });
        }
        self.queue.load(tracks);
        info!(target: LOG_TARGET, "Loaded {} tracks", self.queue.len());
        self.restart_at(start)
    }

    /// Toggle shuffle: shuffles if off, restores original order if on.
    /// Returns whether shuffle is now active.
    ///
    /// # Errors
    ///
    /// Returns the player's error if playback cannot restart.
    pub fn shuffle(&mut self) -> Result<bool> {
        if self.queue.is_shuffled() {
            self.unshuffle()?;
            Ok(false)
        } else {
            self.shuffle_with(&mut rand::rng())?;
            Ok(true)
        }
    }

    /// Shuffle with a caller-provided RNG and restart at the new first track.
    ///
    /// # Errors
    ///
    /// Returns the player's error if playback cannot restart.
    pub fn shuffle_with<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<()> {
        if self.queue.shuffle_with(rng) {
            debug!(target: LOG_TARGET, "Shuffled {} tracks", self.queue.len());
            self.restart_at(0)?;
        }
        Ok(())
    }

    /// Restore the pre-shuffle order and restart at the first track.
    ///
    /// # Errors
    ///
    /// Returns the player's error if playback cannot restart.
    pub fn unshuffle(&mut self) -> Result<()> {
        if self.queue.unshuffle() {
            debug!(target: LOG_TARGET, "Restored original order");
            self.restart_at(0)?;
        }
        Ok(())
    }

    pub fn next(&self) -> bool {
        self.player.next()
    }

    pub fn previous(&self) -> bool {
        self.player.previous()
    }

    /// Play the track at a logical index.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::TrackIndexOutOfRange`] or the player's error.
    pub fn jump_to(&self, index: usize) -> Result<()> {
        if index >= self.queue.len() {
            return Err(CoreError::TrackIndexOutOfRange {
                index,
                len: self.queue.len(),
            });
        }
        self.player.play_at(index)
    }

    /// Play the track shown at a visual row of the track list.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotATrackRow`] when the row is a disc heading.
    pub fn jump_to_row(&self, rows: &[TrackRow], row: usize) -> Result<usize> {
        let index = row_to_track_index(rows, row)?;
        self.jump_to(index)?;
        Ok(index)
    }

    pub fn set_repeat_mode(&mut self, mode: RepeatMode) {
        self.repeat = mode;
        self.player.set_playback_mode(mode.playback_mode());
        debug!(target: LOG_TARGET, "{}", mode.label());
    }

    /// Advance the repeat button and return the new mode
    pub fn cycle_repeat_mode(&mut self) -> RepeatMode {
        self.set_repeat_mode(self.repeat.cycle());
        self.repeat
    }

    #[must_use]
    pub const fn repeat_mode(&self) -> RepeatMode {
        self.repeat
    }

    #[must_use]
    pub const fn queue(&self) -> &PlayQueue {
        &self.queue
    }

    #[must_use]
    pub fn current_index(&self) -> Option<usize> {
        self.player.current_index()
    }

    #[must_use]
    pub fn current_track(&self) -> Option<&TrackEntry> {
        self.current_index().and_then(|i| self.queue.get(i))
    }

    fn restart_at(&self, index: usize) -> Result<()> {
        self.player
            .set_media_list(self.queue.tracks().iter().map(|t| t.path.clone()).collect());
        if self.queue.is_empty() {
            return Ok(());
        }
        self.player.play_at(index)
    }
}
