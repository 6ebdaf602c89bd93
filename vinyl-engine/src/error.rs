use thiserror::Error;
use vinyl_core::CoreError;

/// Errors raised while driving the player and polling its position.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The player reported a failure since the last poll.
    #[error("Playback failed: {reason}")]
    Playback { reason: String },

    /// Error bubbled up from the core crate.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Poller was stopped.
    #[error("Position poller stopped")]
    PollerStopped,
}

/// Convenience type alias for Results with `EngineError`.
pub type Result<T> = std::result::Result<T, EngineError>;
