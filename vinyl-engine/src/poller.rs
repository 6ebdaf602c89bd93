//! Player position polling.

use crate::config::EngineConfig;
use crate::error::EngineError;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use vinyl_core::{DurationExt, MediaPlayer, PlaybackSnapshot, SyncEngine};

const LOG_TARGET: &str = "vinyl::engine::poller";

/// Samples the player on a fixed interval and feeds the sync engine.
pub struct PositionPoller {
    player: Arc<dyn MediaPlayer>,
    sync_engine: Arc<SyncEngine>,
    poll_interval: Duration,
    max_backoff: Duration,
    cancel_token: CancellationToken,
}

impl PositionPoller {
    /// Create a new position poller
    ///
    /// # Arguments
    /// * `player` - Player to sample
    /// * `sync_engine` - Sync engine to update with each snapshot
    /// * `config` - Poll interval and backoff cap
    /// * `cancel_token` - Optional external cancellation token for graceful shutdown
    pub fn new(
        player: Arc<dyn MediaPlayer>,
        sync_engine: Arc<SyncEngine>,
        config: &EngineConfig,
        cancel_token: Option<CancellationToken>,
    ) -> Self {
        Self {
            player,
            sync_engine,
            poll_interval: config.poll_interval(),
            max_backoff: config.max_backoff(),
            cancel_token: cancel_token.unwrap_or_default(),
        }
    }

    #[must_use]
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel_token.clone()
    }

    /// Start polling in a background task
    #[must_use]
    pub fn start(self: Arc<Self>) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            if let Err(e) = self.run().await {
                error!(target: LOG_TARGET, "Position poller stopped with error: {}", e);
            }
        })
    }

    /// Sample the player once and push the snapshot into the sync engine
    async fn poll_once(&self) -> Result<(), EngineError> {
        let snapshot = PlaybackSnapshot::capture(self.player.as_ref());

        debug!(
            target: LOG_TARGET,
            "Polled player: playing={}, time={}ms, length={}ms, media={:?}",
            snapshot.is_playing,
            snapshot.time_ms,
            snapshot.length_ms,
            snapshot.media
        );

        self.sync_engine.update_state(snapshot).await;

        if let Some(reason) = self.player.take_error() {
            self.sync_engine.emit_error(reason.clone());
            return Err(EngineError::Playback { reason });
        }
        Ok(())
    }

    /// Run until cancelled, backing off while the player keeps failing.
    ///
    /// # Errors
    ///
    /// Poll failures are retried, so this currently returns `Ok` once cancelled.
    pub async fn run(&self) -> Result<(), EngineError> {
        info!(target: LOG_TARGET, "Starting position poller ({:?} interval)", self.poll_interval);

        let mut consecutive_errors: u32 = 0;

        loop {
            tokio::select! {
                () = self.cancel_token.cancelled() => {
                    info!(target: LOG_TARGET, "Poller shutting down gracefully");
                    break;
                }
                () = tokio::time::sleep(self.poll_interval) => {
                    match self.poll_once().await {
                        Ok(()) => {
                            consecutive_errors = 0;
                        }
                        Err(e) => {
                            consecutive_errors += 1;
                            warn!(target: LOG_TARGET, "Poll error (attempt {}): {}", consecutive_errors, e);

                            let backoff = backoff_for(consecutive_errors, self.max_backoff);
                            if consecutive_errors >= 5 {
                                error!(
                                    target: LOG_TARGET,
                                    "Too many consecutive errors, waiting {} seconds",
                                    backoff.as_secs()
                                );
                            }

                            tokio::select! {
                                () = self.cancel_token.cancelled() => break,
                                () = tokio::time::sleep(backoff) => {}
                            }
                        }
                    }
                }
            }
        }

        Ok(())
    }
}

/// Exponential backoff: 100ms * 2^errors, capped at `max_backoff`.
/// The exponent stops growing after 10 errors.
fn backoff_for(consecutive_errors: u32, max_backoff: Duration) -> Duration {
    let backoff_ms = 100_u64.saturating_mul(2_u64.saturating_pow(consecutive_errors.min(10)));
    Duration::from_millis(backoff_ms.min(max_backoff.as_millis_u64()))
}
