pub mod album;
pub mod bridge;
pub mod config;
pub mod cover;
pub mod error;
pub mod formats;
pub mod host;
pub mod library;
pub mod lrc;
pub mod natural_sort;
pub mod palette;
pub mod paths;
pub mod playback;
pub mod player;
pub mod playlist;
pub mod queue;
pub mod search;
pub mod sleep_timer;
pub mod sync;
pub mod tags;
pub mod time;

pub use album::{AlbumTracks, TrackEntry, TrackRow, entries_for_paths, row_to_track_index};
pub use bridge::{
    FsLyricsLoader, LyricsLoader, MediaIdentity, PlaybackCursor, PlaybackPositionBridge, TickUpdate,
};
pub use config::{LibraryConfig, LoggingConfig, LyricsConfig, PlaybackConfig, PlaylistsConfig, VinylConfig};
pub use cover::{CoverArt, CoverArtResolver};
pub use error::{CoreError, Result};
pub use formats::{SUPPORTED_AUDIO_EXTENSIONS, companion_lyrics_path, is_audio_file};
pub use host::{NowPlaying, PlaybackCore, PlaybackHost};
pub use library::{AlbumRecord, IndexEvent, LibraryIndexer};
pub use lrc::{LyricContent, LyricDocument, LyricLine, LyricMetadata};
pub use natural_sort::{NaturalKey, sort_natural, sort_natural_by};
pub use palette::{Palette, Rgb};
pub use paths::{CONFIG_DIR_NAME, CONFIG_FILE_NAME, LOG_FILE_NAME, PLAYLISTS_FILE_NAME, config_dir, log_path};
pub use playback::PlaybackSnapshot;
pub use player::{MediaPlayer, PlaybackMode};
pub use playlist::PlaylistStore;
pub use queue::{PlayQueue, RepeatMode, TrackSequenceEngine};
pub use search::{SearchEvent, SongSearch, pick_random_song};
pub use sleep_timer::{MAX_SLEEP_MINUTES, SleepStatus, SleepTimer};
pub use sync::{SyncEngine, SyncEvent};
pub use tags::{EmbeddedPicture, NoTags, TagReader, TrackTags};
pub use time::DurationExt;
