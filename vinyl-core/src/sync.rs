use crate::bridge::{LyricsLoader, MediaIdentity, PlaybackCursor, PlaybackPositionBridge};
use crate::lrc::LyricContent;
use crate::playback::PlaybackSnapshot;
use std::sync::Arc;
use tokio::sync::{RwLock, broadcast};

/// Events emitted by the sync engine
#[derive(Debug, Clone)]
pub enum SyncEvent {
    /// Playback was paused
    PlaybackPaused { position_ms: u64 },
    /// Playback was resumed
    PlaybackResumed { position_ms: u64 },
    /// Playback stopped (no media loaded)
    PlaybackStopped,
    /// Track changed to a new media item
    TrackChanged { media: MediaIdentity },
    /// Regular position sync update
    PositionSync {
        cursor: PlaybackCursor,
        label: String,
        /// `None` while the seek bar is being dragged
        seek_position: Option<u16>,
    },
    /// Lyrics were loaded for the current track
    LyricsLoaded { lyrics: LyricContent },
    /// The highlighted lyric line moved
    LyricLineChanged { index: Option<usize> },
    /// Error occurred
    Error { message: String },
}

/// Sync engine state
struct SyncEngineInner {
    state: PlaybackSnapshot,
    bridge: PlaybackPositionBridge,
}

/// Engine that turns player readings into UI events
pub struct SyncEngine {
    inner: RwLock<SyncEngineInner>,
    event_tx: broadcast::Sender<SyncEvent>,
}

impl SyncEngine {
    /// Create a new sync engine
    #[must_use]
    pub fn new(loader: Arc<dyn LyricsLoader>) -> Arc<Self> {
        let (event_tx, _) = broadcast::channel(64);

        Arc::new(Self {
            inner: RwLock::new(SyncEngineInner {
                state: PlaybackSnapshot::default(),
                bridge: PlaybackPositionBridge::new(loader),
            }),
            event_tx,
        })
    }

    /// Subscribe to sync events
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SyncEvent> {
        self.event_tx.subscribe()
    }

    /// Feed one player reading and emit the resulting events
    pub async fn update_state(&self, new_state: PlaybackSnapshot) {
        let mut inner = self.inner.write().await;
        let tick = inner.bridge.on_tick(
            new_state.time_ms,
            new_state.length_ms,
            new_state.media.as_deref(),
        );
        let old_state = std::mem::replace(&mut inner.state, new_state);
        let new_state = &inner.state;

        if tick.track_changed {
            match inner.bridge.media() {
                Some(media) => {
                    let _ = self.event_tx.send(SyncEvent::TrackChanged {
                        media: media.clone(),
                    });
                }
                None => {
                    let _ = self.event_tx.send(SyncEvent::PlaybackStopped);
                }
            }
        }

        if let Some(lyrics) = tick.lyrics {
            let _ = self.event_tx.send(SyncEvent::LyricsLoaded { lyrics });
        }

        if old_state.playback_state_changed(new_state) && new_state.media.is_some() {
            let position_ms = tick.cursor.current_time_ms;
            let event = if new_state.is_playing {
                SyncEvent::PlaybackResumed { position_ms }
            } else {
                SyncEvent::PlaybackPaused { position_ms }
            };
            let _ = self.event_tx.send(event);
        }

        if tick.lyric_line_changed {
            let _ = self.event_tx.send(SyncEvent::LyricLineChanged {
                index: tick.cursor.active_lyric_index,
            });
        }

        // Regular position update
        let _ = self.event_tx.send(SyncEvent::PositionSync {
            cursor: tick.cursor,
            label: tick.progress_label,
            seek_position: tick.seek_position,
        });
    }

    /// The user grabbed the seek bar
    pub async fn begin_seek_drag(&self) {
        self.inner.write().await.bridge.begin_drag();
    }

    /// The user moved the seek bar; returns the preview label
    pub async fn drag_seek_to(&self, position: u16) -> String {
        self.inner.write().await.bridge.drag_to(position)
    }

    /// The user released the seek bar; returns the time to seek to
    pub async fn end_seek_drag(&self) -> Option<u64> {
        self.inner.write().await.bridge.end_drag()
    }

    /// Emit an error event
    pub fn emit_error(&self, message: String) {
        let _ = self.event_tx.send(SyncEvent::Error { message });
    }

    /// Get the last player reading
    pub async fn state(&self) -> PlaybackSnapshot {
        self.inner.read().await.state.clone()
    }

    /// Get current lyrics
    pub async fn lyrics(&self) -> LyricContent {
        self.inner.read().await.bridge.lyrics().clone()
    }

    /// Get the current position cursor
    pub async fn cursor(&self) -> PlaybackCursor {
        *self.inner.read().await.bridge.cursor()
    }

    /// Get current media identity
    pub async fn current_media(&self) -> Option<MediaIdentity> {
        self.inner.read().await.bridge.media().cloned()
    }

    /// Check if currently playing
    pub async fn is_playing(&self) -> bool {
        self.inner.read().await.state.is_playing
    }
}
