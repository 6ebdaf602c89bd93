use crate::player::MediaPlayer;

/// One reading of the player taken by the position poller
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaybackSnapshot {
    /// Whether music is currently playing
    pub is_playing: bool,
    /// Elapsed time as the player reports it (may be negative)
    pub time_ms: i64,
    /// Total length as the player reports it (`<= 0` when unknown)
    pub length_ms: i64,
    /// Media resource locator of the current item
    pub media: Option<String>,
}

impl PlaybackSnapshot {
    /// Read the current state of a player
    #[must_use]
    pub fn capture(player: &dyn MediaPlayer) -> Self {
        Self {
            is_playing: player.is_playing(),
            time_ms: player.time_ms(),
            length_ms: player.length_ms(),
            media: player.current_media(),
        }
    }

    /// Check if playback state changed (playing <-> paused)
    #[must_use]
    pub const fn playback_state_changed(&self, other: &Self) -> bool {
        self.is_playing != other.is_playing
    }
}
