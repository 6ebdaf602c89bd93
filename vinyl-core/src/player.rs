//! Contract for the external media-list player.
//!
//! The core never decodes audio. It hands an ordered list of paths to a
//! [`MediaPlayer`] and drives its index cursor; elapsed time, length and the
//! current media are read back by the position poller.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Native boundary behaviour of the player's media list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackMode {
    /// Stop at either end of the list
    #[default]
    Default,
    /// Wrap around at either end
    Loop,
    /// Replay the current item forever
    Repeat,
}

/// A player that owns an ordered media list with an index cursor.
///
/// All methods take `&self`; implementations synchronise internally so a
/// poller and the playback core can share one instance.
pub trait MediaPlayer: Send + Sync {
    /// Replace the media list. Stops playback and clears the cursor.
    fn set_media_list(&self, paths: Vec<PathBuf>);

    /// Start playing the item at `index`.
    ///
    /// # Errors
    ///
    /// Returns an error if `index` is past the end of the media list or the
    /// item cannot be opened.
    fn play_at(&self, index: usize) -> Result<()>;

    /// Advance the cursor according to the playback mode.
    /// Returns `false` when already at the end and nothing changed.
    fn next(&self) -> bool;

    /// Step the cursor back according to the playback mode.
    /// Returns `false` when already at the start and nothing changed.
    fn previous(&self) -> bool;

    /// Cursor position in the media list, `None` before anything was played
    fn current_index(&self) -> Option<usize>;

    fn toggle_pause(&self);

    fn pause(&self);

    fn is_playing(&self) -> bool;

    /// Elapsed time of the current media in milliseconds, `-1` when nothing is loaded
    fn time_ms(&self) -> i64;

    fn set_time_ms(&self, time_ms: u64);

    /// Length of the current media in milliseconds; `<= 0` when unknown
    fn length_ms(&self) -> i64;

    /// Set output volume, clamped to `0..=100`
    fn set_volume(&self, volume: u8);

    fn volume(&self) -> u8;

    fn set_playback_mode(&self, mode: PlaybackMode);

    /// Media resource locator of the current item (`file://` URL)
    fn current_media(&self) -> Option<String>;

    /// Playback error raised since the last call (e.g. an item failed to open)
    fn take_error(&self) -> Option<String> {
        None
    }
}
