//! Application context: owns the playback core and every background task.
//!
//! Workers (indexer, cover extraction, search, stdin) never touch the core.
//! They send [`AppMessage`]s over one bounded channel and the event loop in
//! [`AppContext::run`] applies them in order. Album loads, the random song walk
//! and cover reads touch the disk, so they run on the blocking pool and come
//! back as messages too.

use crate::command::{Command, HELP};
use crate::view;
use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use vinyl_core::{
    AlbumRecord, AlbumTracks, CoverArt, CoverArtResolver, FsLyricsLoader, IndexEvent,
    LibraryIndexer, LyricContent, MediaPlayer, PlaybackCore, PlaylistStore, SearchEvent,
    SleepStatus, SleepTimer, SongSearch, SyncEngine, SyncEvent, TagReader, TrackEntry,
    VinylConfig, entries_for_paths, pick_random_song,
};
use vinyl_engine::{ClockPlayer, EngineConfig, PositionPoller};
use vinyl_tags::LoftyTagReader;

const LOG_TARGET: &str = "vinyl::app";

const MESSAGE_CHANNEL_CAPACITY: usize = 128;

/// How often the sleep timer is checked
const SLEEP_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// How long shutdown waits for each background task
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// Everything a worker can hand to the event loop.
#[derive(Debug)]
pub enum AppMessage {
    Index(IndexEvent),
    CoversReady(Vec<AlbumRecord>),
    /// Search events tagged with the search that produced them
    Search {
        generation: u64,
        event: SearchEvent,
    },
    AlbumLoaded {
        start: AlbumStart,
        album: vinyl_core::Result<AlbumTracks>,
    },
    RandomPicked(Option<PathBuf>),
    PlaylistLoaded {
        name: String,
        entries: Vec<TrackEntry>,
    },
    CoverResolved {
        path: PathBuf,
        cover: CoverArt,
    },
    Input(Command),
    InputClosed,
}

/// Where playback starts once an album has been loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlbumStart {
    Index(usize),
    /// A search hit, or the start album given on the command line
    Song(PathBuf),
    /// The song picked by random library shuffle
    Random(PathBuf),
}

/// Start-up choices taken from the command line.
#[derive(Debug, Clone, Default)]
pub struct StartOptions {
    /// Overrides `[library] root`
    pub library_root: Option<PathBuf>,
    /// Album directory (relative to the library root) to play once indexing finishes
    pub album: Option<PathBuf>,
    pub sleep_minutes: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

pub struct AppContext {
    core: PlaybackCore,
    player: Arc<dyn MediaPlayer>,
    reader: Arc<dyn TagReader>,
    sync: Arc<SyncEngine>,
    engine: EngineConfig,
    library_root: PathBuf,
    catalog: Vec<AlbumRecord>,
    search_hits: Vec<PathBuf>,
    search_cancel: Option<CancellationToken>,
    search_generation: u64,
    sleep: Option<SleepTimer>,
    start_album: Option<PathBuf>,
    cancel_token: CancellationToken,
    tx: mpsc::Sender<AppMessage>,
    rx: Option<mpsc::Receiver<AppMessage>>,
    tasks: Vec<JoinHandle<()>>,
}

impl AppContext {
    /// Wire up the player, tag reader, sync engine and playback core.
    ///
    /// # Errors
    ///
    /// Returns an error if the `[engine]` config section is invalid.
    pub fn new(
        config: &VinylConfig,
        options: StartOptions,
        cancel_token: CancellationToken,
    ) -> vinyl_core::Result<Self> {
        let engine = EngineConfig::from_config(config)?;
        let library_root = options
            .library_root
            .unwrap_or_else(|| config.library.root.clone());

        let reader: Arc<dyn TagReader> = Arc::new(LoftyTagReader::new());
        let player: Arc<dyn MediaPlayer> = Arc::new(ClockPlayer::new(Arc::clone(&reader)));
        let sync = SyncEngine::new(Arc::new(FsLyricsLoader::new(config.lyrics.offset_ms)));
        let playlists = PlaylistStore::load(config.playlists.path());

        let mut core = PlaybackCore::new(
            Arc::clone(&player),
            Arc::clone(&reader),
            playlists,
            Arc::clone(&sync),
        );
        core.set_volume(config.playback.volume);
        core.set_repeat_mode(config.playback.repeat);

        let (tx, rx) = mpsc::channel(MESSAGE_CHANNEL_CAPACITY);

        Ok(Self {
            core,
            player,
            reader,
            sync,
            engine,
            library_root,
            catalog: Vec::new(),
            search_hits: Vec::new(),
            search_cancel: None,
            search_generation: 0,
            sleep: options.sleep_minutes.map(SleepTimer::start),
            start_album: options.album,
            cancel_token,
            tx,
            rx: Some(rx),
            tasks: Vec::new(),
        })
    }

    /// Spawn the indexer, the position poller, the sync event printer and the stdin reader.
    pub fn start(&mut self) {
        info!(target: LOG_TARGET, "Indexing library at {}", self.library_root.display());

        let indexer = LibraryIndexer::new(&self.library_root, Some(self.cancel_token.child_token()));
        let (handle, events) = indexer.spawn();
        self.track(handle);
        self.track(forward(events, self.tx.clone(), AppMessage::Index));

        let poller = Arc::new(PositionPoller::new(
            Arc::clone(&self.player),
            Arc::clone(&self.sync),
            &self.engine,
            Some(self.cancel_token.clone()),
        ));
        self.track(poller.start());

        self.track(tokio::spawn(print_sync_events(
            self.sync.subscribe(),
            self.cancel_token.clone(),
        )));

        spawn_stdin_reader(self.tx.clone());
        println!("Type `help` for commands.");
    }

    /// Process messages until `quit`, Ctrl+C, or every sender is gone.
    pub async fn run(&mut self) {
        let Some(mut rx) = self.rx.take() else {
            warn!(target: LOG_TARGET, "Event loop already ran");
            return;
        };
        let mut sleep_tick = tokio::time::interval(SLEEP_POLL_INTERVAL);

        loop {
            tokio::select! {
                () = self.cancel_token.cancelled() => {
                    info!(target: LOG_TARGET, "Cancellation requested");
                    break;
                }
                message = rx.recv() => {
                    let Some(message) = message else {
                        break;
                    };
                    if self.handle(message).await == Flow::Quit {
                        break;
                    }
                }
                _ = sleep_tick.tick() => self.poll_sleep_timer(),
            }
        }
    }

    /// Stop every task and pause the player.
    pub async fn shutdown(self) {
        info!(target: LOG_TARGET, "Shutting down");
        self.cancel_token.cancel();
        if let Some(search) = &self.search_cancel {
            search.cancel();
        }
        self.core.pause();

        for handle in self.tasks {
            if tokio::time::timeout(SHUTDOWN_GRACE, handle).await.is_err() {
                warn!(target: LOG_TARGET, "A background task did not stop in time");
            }
        }
    }

    async fn handle(&mut self, message: AppMessage) -> Flow {
        match message {
            AppMessage::Index(event) => self.on_index_event(event),
            AppMessage::CoversReady(albums) => {
                info!(target: LOG_TARGET, "Covers resolved for {} albums", albums.len());
                self.catalog = albums;
            }
            AppMessage::Search { generation, event } => self.on_search_event(generation, event),
            AppMessage::AlbumLoaded { start, album } => self.on_album_loaded(start, album),
            AppMessage::RandomPicked(Some(song)) => {
                let dir = album_dir_of(&song).to_path_buf();
                self.load_album(dir, AlbumStart::Random(song));
            }
            AppMessage::RandomPicked(None) => {
                warn!(target: LOG_TARGET, "No songs found for random shuffle");
                println!("No songs found for random shuffle");
            }
            AppMessage::PlaylistLoaded { name, entries } => {
                if let Err(e) = self.core.play_entries(&name, entries) {
                    println!("{e}");
                }
            }
            AppMessage::CoverResolved { path, cover } => {
                self.core.set_cover(path, cover);
                self.print_now_playing().await;
            }
            AppMessage::Input(command) => return self.execute(command).await,
            AppMessage::InputClosed => {
                info!(target: LOG_TARGET, "Standard input closed; press Ctrl+C to quit");
            }
        }
        Flow::Continue
    }

    fn on_index_event(&mut self, event: IndexEvent) {
        println!("{}", event.summary());
        let IndexEvent::Finished { albums } = event else {
            return;
        };

        self.catalog.clone_from(&albums);
        let covers = CoverArtResolver::new(Arc::clone(&self.reader)).spawn(albums);
        let tx = self.tx.clone();
        self.track(tokio::spawn(async move {
            match covers.await {
                Ok(albums) => {
                    let _ = tx.send(AppMessage::CoversReady(albums)).await;
                }
                Err(e) => error!(target: LOG_TARGET, "Cover extraction failed: {}", e),
            }
        }));

        if let Some(album) = self.start_album.take() {
            let dir = self.library_root.join(album);
            self.load_album(dir, AlbumStart::Index(0));
        }
    }

    fn on_album_loaded(&mut self, start: AlbumStart, album: vinyl_core::Result<AlbumTracks>) {
        let result = album.and_then(|album| match start {
            AlbumStart::Index(index) => self.core.play_loaded_album(album, index),
            AlbumStart::Song(song) => self.core.play_loaded_album_from(album, &song),
            AlbumStart::Random(song) => self
                .core
                .start_random_shuffle(album, &song)
                .map(|()| println!("Random shuffle on")),
        });
        if let Err(e) = result {
            println!("{e}");
        }
    }

    fn on_search_event(&mut self, generation: u64, event: SearchEvent) {
        if generation != self.search_generation {
            debug!(target: LOG_TARGET, "Dropping event of replaced search {}", generation);
            return;
        }
        match event {
            SearchEvent::Progress(percent) => {
                debug!(target: LOG_TARGET, "Search {}%", percent);
            }
            SearchEvent::Match(path) => {
                self.search_hits.push(path);
                if let Some(hit) = self.search_hits.last() {
                    println!("{:>4}. {}", self.search_hits.len(), hit.display());
                }
            }
            SearchEvent::Finished => {
                println!("Search finished: {} songs (`found <n>` to play)", self.search_hits.len());
            }
            SearchEvent::Cancelled => debug!(target: LOG_TARGET, "Search cancelled"),
        }
    }

    #[allow(clippy::too_many_lines)]
    async fn execute(&mut self, command: Command) -> Flow {
        let result = match command {
            Command::Help => {
                println!("{HELP}");
                Ok(())
            }
            Command::Quit => return Flow::Quit,
            Command::Albums(filter) => {
                print!("{}", view::album_list(&self.catalog, filter.as_deref()));
                Ok(())
            }
            Command::Play { album, track } => match self.catalog.get(album) {
                Some(record) => {
                    let dir = record.album_dir.clone();
                    self.load_album(dir, AlbumStart::Index(track));
                    Ok(())
                }
                None => {
                    println!("No album {} (see `albums`)", album + 1);
                    Ok(())
                }
            },
            Command::Tracks => {
                print!(
                    "{}",
                    view::track_list(&self.core.rows(), self.core.tracks(), self.core.current_index())
                );
                Ok(())
            }
            Command::Row(row) => self.core.jump_to_row(row).map(|_| ()),
            Command::Next => {
                if !self.core.next() {
                    println!("Already at the last track");
                }
                Ok(())
            }
            Command::Previous => {
                if !self.core.previous() {
                    println!("Already at the first track");
                }
                Ok(())
            }
            Command::Pause => {
                self.core.toggle_pause();
                Ok(())
            }
            Command::Shuffle => self.core.toggle_album_shuffle().map(|on| {
                println!("Shuffle {}", if on { "on" } else { "off" });
            }),
            Command::Random => {
                if self.core.stop_random_shuffle() {
                    println!("Random shuffle off");
                } else {
                    self.pick_random_song();
                }
                Ok(())
            }
            Command::Repeat => {
                println!("Repeat: {}", self.core.cycle_repeat_mode().label());
                Ok(())
            }
            Command::Volume(volume) => {
                self.core.set_volume(volume);
                Ok(())
            }
            Command::Seek(time_ms) => {
                self.core.seek_to(time_ms);
                Ok(())
            }
            Command::SeekBar(position) => {
                self.core.begin_seek_drag().await;
                println!("{}", self.core.drag_seek_to(position).await);
                self.core.end_seek_drag().await;
                Ok(())
            }
            Command::Line(index) => {
                if !self.core.seek_to_lyric_line(index).await {
                    println!("No synced lyric line {}", index + 1);
                }
                Ok(())
            }
            Command::Lyrics => {
                let content = self.sync.lyrics().await;
                let cursor = self.sync.cursor().await;
                print!("{}", view::lyrics(&content, cursor.active_lyric_index));
                Ok(())
            }
            Command::Now => {
                match self.core.cover_needed() {
                    Some(path) => self.resolve_cover(path),
                    None => self.print_now_playing().await,
                }
                Ok(())
            }
            Command::Search(query) => {
                self.start_search(&query);
                Ok(())
            }
            Command::Found(hit) => match self.search_hits.get(hit).cloned() {
                Some(song) => self.core.jump_to_loaded_song(&song).unwrap_or_else(|| {
                    let dir = album_dir_of(&song).to_path_buf();
                    self.load_album(dir, AlbumStart::Song(song));
                    Ok(())
                }),
                None => {
                    println!("No search hit {}", hit + 1);
                    Ok(())
                }
            },
            Command::Playlists => {
                let names = self.core.playlists().names();
                if names.is_empty() {
                    println!("No playlists yet");
                }
                for name in names {
                    println!("  {name}");
                }
                Ok(())
            }
            Command::PlaylistCreate(name) => self.core.playlists_mut().create(&name),
            Command::PlaylistAdd(name) => self.core.add_current_to_playlist(&name),
            Command::PlaylistPlay(name) => self
                .core
                .playlist_songs(&name)
                .map(|songs| self.load_playlist(name, songs)),
            Command::Sleep(minutes) => {
                self.sleep = minutes.map(SleepTimer::start);
                if self.sleep.is_none() {
                    println!("Sleep timer off");
                }
                self.poll_sleep_timer();
                Ok(())
            }
        };

        if let Err(e) = result {
            println!("{e}");
        }
        Flow::Continue
    }

    async fn print_now_playing(&self) {
        let cursor = self.sync.cursor().await;
        match self.core.now_playing() {
            Some(now) => println!("{}", view::now_playing(&now, &cursor.progress_label())),
            None => println!("Nothing playing"),
        }
        println!(
            "Volume {}  Repeat {}  Shuffle {}{}",
            self.core.volume(),
            self.core.repeat_mode().label(),
            if self.core.is_album_shuffle() { "on" } else { "off" },
            if self.core.is_random_shuffle() { " (random)" } else { "" }
        );
        if let Some(SleepStatus::Counting(label)) = self.sleep.as_ref().map(SleepTimer::poll) {
            println!("{label}");
        }
    }

    /// Replace any running search with a new one.
    fn start_search(&mut self, query: &str) {
        if let Some(previous) = self.search_cancel.take() {
            previous.cancel();
        }
        self.search_hits.clear();

        let token = self.cancel_token.child_token();
        let search = SongSearch::new(&self.library_root, query, Some(token.clone()));
        self.search_generation += 1;
        let generation = self.search_generation;
        let (handle, events) = search.spawn();
        self.track(handle);
        self.track(forward(events, self.tx.clone(), move |event| AppMessage::Search {
            generation,
            event,
        }));
        self.search_cancel = Some(token);
    }

    fn load_album(&mut self, dir: PathBuf, start: AlbumStart) {
        debug!(target: LOG_TARGET, "Loading album {}", dir.display());
        let reader = Arc::clone(&self.reader);
        self.spawn_blocking_message(move || AppMessage::AlbumLoaded {
            start,
            album: AlbumTracks::load(&dir, reader.as_ref()),
        });
    }

    fn pick_random_song(&mut self) {
        let root = self.library_root.clone();
        self.spawn_blocking_message(move || {
            AppMessage::RandomPicked(pick_random_song(&root, &mut rand::rng()))
        });
    }

    fn load_playlist(&mut self, name: String, songs: Vec<PathBuf>) {
        let reader = Arc::clone(&self.reader);
        self.spawn_blocking_message(move || AppMessage::PlaylistLoaded {
            entries: entries_for_paths(&songs, reader.as_ref()),
            name,
        });
    }

    fn resolve_cover(&mut self, path: PathBuf) {
        let resolver = CoverArtResolver::new(Arc::clone(&self.reader));
        self.spawn_blocking_message(move || AppMessage::CoverResolved {
            cover: resolver.cover_for_track(&path),
            path,
        });
    }

    /// Run disk-bound work on the blocking pool and post its result to the event loop.
    fn spawn_blocking_message<F>(&mut self, work: F)
    where
        F: FnOnce() -> AppMessage + Send + 'static,
    {
        let tx = self.tx.clone();
        let work = tokio::task::spawn_blocking(work);
        self.track(tokio::spawn(async move {
            match work.await {
                Ok(message) => {
                    let _ = tx.send(message).await;
                }
                Err(e) => error!(target: LOG_TARGET, "Background load failed: {}", e),
            }
        }));
    }

    /// Keep a task for shutdown, forgetting the ones that already finished.
    fn track(&mut self, handle: JoinHandle<()>) {
        self.tasks.retain(|task| !task.is_finished());
        self.tasks.push(handle);
    }

    fn poll_sleep_timer(&mut self) {
        let Some(timer) = &self.sleep else {
            return;
        };
        match timer.poll() {
            SleepStatus::Counting(label) => debug!(target: LOG_TARGET, "{}", label),
            SleepStatus::Expired => {
                info!(target: LOG_TARGET, "Sleep timer expired, pausing playback");
                self.core.pause();
                self.sleep = None;
            }
        }
    }
}

/// Relay a worker's event stream into the app channel.
fn forward<T: Send + 'static>(
    mut events: mpsc::Receiver<T>,
    tx: mpsc::Sender<AppMessage>,
    wrap: impl Fn(T) -> AppMessage + Send + 'static,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            if tx.send(wrap(event)).await.is_err() {
                break;
            }
        }
    })
}

/// Album directory of a song path
fn album_dir_of(song: &Path) -> &Path {
    song.parent().unwrap_or_else(|| Path::new("."))
}

/// Blocking stdin reader on its own thread; it is not joined at shutdown.
fn spawn_stdin_reader(tx: mpsc::Sender<AppMessage>) {
    let spawned = std::thread::Builder::new()
        .name("vinyl-stdin".into())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                let Ok(line) = line else {
                    break;
                };
                match Command::parse(&line) {
                    Ok(Some(command)) => {
                        if tx.blocking_send(AppMessage::Input(command)).is_err() {
                            return;
                        }
                    }
                    Ok(None) => {}
                    Err(e) => println!("{e}"),
                }
            }
            let _ = tx.blocking_send(AppMessage::InputClosed);
        });

    if let Err(e) = spawned {
        error!(target: LOG_TARGET, "Failed to start input thread: {}", e);
    }
}

/// Print lyric lines as they become active and log the rest of the sync traffic.
async fn print_sync_events(mut rx: broadcast::Receiver<SyncEvent>, cancel_token: CancellationToken) {
    let mut lyrics = LyricContent::Empty;

    loop {
        let event = tokio::select! {
            () = cancel_token.cancelled() => break,
            event = rx.recv() => event,
        };

        match event {
            Ok(SyncEvent::TrackChanged { media }) => {
                info!(target: LOG_TARGET, "Track changed: {}", media.basename);
            }
            Ok(SyncEvent::LyricsLoaded { lyrics: loaded }) => {
                info!(target: LOG_TARGET, "Loaded {}", loaded.kind());
                if let LyricContent::Unsynced(lines) = &loaded {
                    for line in lines {
                        println!("  {line}");
                    }
                }
                lyrics = loaded;
            }
            Ok(SyncEvent::LyricLineChanged { index: Some(index) }) => {
                if let Some(line) = lyrics.as_synced().and_then(|doc| doc.lines.get(index)) {
                    println!("  \u{266a} {}", line.text);
                }
            }
            Ok(SyncEvent::PlaybackPaused { position_ms }) => {
                info!(target: LOG_TARGET, "Playback paused at {} ms", position_ms);
            }
            Ok(SyncEvent::PlaybackResumed { position_ms }) => {
                info!(target: LOG_TARGET, "Playback resumed at {} ms", position_ms);
            }
            Ok(SyncEvent::PlaybackStopped) => {
                info!(target: LOG_TARGET, "Playback stopped");
                lyrics = LyricContent::Empty;
            }
            Ok(SyncEvent::Error { message }) => {
                error!(target: LOG_TARGET, "Sync error: {}", message);
            }
            Ok(SyncEvent::PositionSync { .. } | SyncEvent::LyricLineChanged { index: None }) => {}
            Err(broadcast::error::RecvError::Closed) => {
                info!(target: LOG_TARGET, "Sync event channel closed");
                break;
            }
            Err(broadcast::error::RecvError::Lagged(n)) => {
                debug!(target: LOG_TARGET, "Missed {} sync events", n);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;
    use vinyl_core::PlaybackHost;

    fn library() -> TempDir {
        let dir = TempDir::new().unwrap();
        let album = dir.path().join("Artist").join("Album");
        fs::create_dir_all(&album).unwrap();
        for name in ["01 - One.mp3", "02 - Two.mp3"] {
            fs::write(album.join(name), b"").unwrap();
        }
        dir
    }

    fn config(dir: &TempDir) -> VinylConfig {
        let mut config = VinylConfig::default();
        config.library.root = dir.path().to_path_buf();
        config.playlists.file = Some(dir.path().join("playlists.json"));
        config.playback.volume = 40;
        config
    }

    fn app(dir: &TempDir) -> (AppContext, mpsc::Receiver<AppMessage>) {
        let mut app =
            AppContext::new(&config(dir), StartOptions::default(), CancellationToken::new()).unwrap();
        let rx = app.rx.take().unwrap();
        (app, rx)
    }

    /// Apply messages until `done` holds or nothing arrives for five seconds.
    async fn drain_until(
        app: &mut AppContext,
        rx: &mut mpsc::Receiver<AppMessage>,
        done: impl Fn(&AppContext) -> bool,
    ) {
        while !done(app) {
            let Ok(Some(message)) = tokio::time::timeout(Duration::from_secs(5), rx.recv()).await
            else {
                break;
            };
            app.handle(message).await;
        }
    }

    fn album_record(dir: &TempDir) -> AlbumRecord {
        AlbumRecord {
            artist: "Artist".into(),
            album: "Album".into(),
            album_dir: dir.path().join("Artist").join("Album"),
            representative_track: "01 - One.mp3".into(),
            cover: None,
        }
    }

    #[tokio::test]
    async fn test_index_then_play_start_album() {
        let dir = library();
        let options = StartOptions {
            album: Some(PathBuf::from("Artist/Album")),
            ..StartOptions::default()
        };
        let mut app = AppContext::new(&config(&dir), options, CancellationToken::new()).unwrap();
        let mut rx = app.rx.take().unwrap();

        let (handle, events) = LibraryIndexer::new(dir.path(), None).spawn();
        app.track(handle);
        app.track(forward(events, app.tx.clone(), AppMessage::Index));
        drain_until(&mut app, &mut rx, |app| {
            !app.catalog.is_empty() && app.core.current_index().is_some()
        })
        .await;

        assert_eq!(app.catalog.len(), 1);
        assert_eq!(app.core.tracks().len(), 2);
        assert_eq!(app.core.current_index(), Some(0));
        assert_eq!(app.core.volume(), 40);
        assert!(app.start_album.is_none());

        app.shutdown().await;
    }

    #[tokio::test]
    async fn test_commands_drive_the_core() {
        let dir = library();
        let (mut app, mut rx) = app(&dir);
        app.catalog = vec![album_record(&dir)];

        assert_eq!(app.execute(Command::Play { album: 0, track: 1 }).await, Flow::Continue);
        drain_until(&mut app, &mut rx, |app| app.core.current_index().is_some()).await;
        assert_eq!(app.core.current_index(), Some(1));

        app.execute(Command::Previous).await;
        assert_eq!(app.core.current_index(), Some(0));

        app.execute(Command::PlaylistCreate("Mix".into())).await;
        app.execute(Command::PlaylistAdd("Mix".into())).await;
        assert_eq!(app.core.playlists().songs("Mix").unwrap().len(), 1);

        app.execute(Command::PlaylistPlay("Mix".into())).await;
        drain_until(&mut app, &mut rx, |app| app.core.tracks().len() == 1).await;
        assert_eq!(app.core.tracks()[0].display_title, "One");

        app.execute(Command::Volume(75)).await;
        assert_eq!(app.core.volume(), 75);

        assert_eq!(app.execute(Command::Quit).await, Flow::Quit);
    }

    #[tokio::test]
    async fn test_random_and_found_songs_load_in_the_background() {
        let dir = library();
        let (mut app, mut rx) = app(&dir);

        app.execute(Command::Random).await;
        assert!(app.core.tracks().is_empty());
        drain_until(&mut app, &mut rx, |app| app.core.is_random_shuffle()).await;
        assert_eq!(app.core.tracks().len(), 2);

        app.execute(Command::Random).await;
        assert!(!app.core.is_random_shuffle());

        app.search_hits = vec![dir.path().join("Artist/Album/02 - Two.mp3")];
        app.execute(Command::Found(0)).await;
        assert_eq!(app.core.current_index(), Some(1));
    }

    #[tokio::test]
    async fn test_found_song_outside_the_queue_loads_its_album() {
        let dir = library();
        let (mut app, mut rx) = app(&dir);

        app.search_hits = vec![dir.path().join("Artist/Album/02 - Two.mp3")];
        app.execute(Command::Found(0)).await;
        assert!(app.core.current_index().is_none());
        drain_until(&mut app, &mut rx, |app| app.core.current_index().is_some()).await;
        assert_eq!(app.core.current_index(), Some(1));
    }

    #[tokio::test]
    async fn test_now_resolves_the_cover_once_per_track() {
        let dir = library();
        let (mut app, mut rx) = app(&dir);
        app.core
            .play_album(&dir.path().join("Artist").join("Album"), 0)
            .unwrap();
        assert!(app.core.cover_needed().is_some());

        app.execute(Command::Now).await;
        drain_until(&mut app, &mut rx, |app| app.core.cover_needed().is_none()).await;
        assert!(app.core.now_playing().unwrap().cover.is_placeholder());

        assert!(app.core.next());
        assert!(app.core.cover_needed().is_some());
    }

    #[tokio::test]
    async fn test_events_of_a_replaced_search_are_dropped() {
        let dir = library();
        let (mut app, _rx) = app(&dir);

        app.start_search("one");
        app.start_search("two");
        assert_eq!(app.search_generation, 2);

        let stale = dir.path().join("Artist/Album/01 - One.mp3");
        let fresh = dir.path().join("Artist/Album/02 - Two.mp3");
        app.handle(AppMessage::Search {
            generation: 1,
            event: SearchEvent::Match(stale),
        })
        .await;
        app.handle(AppMessage::Search {
            generation: 2,
            event: SearchEvent::Match(fresh.clone()),
        })
        .await;
        assert_eq!(app.search_hits, vec![fresh]);
    }

    #[tokio::test]
    async fn test_finished_tasks_are_not_kept() {
        let dir = library();
        let (mut app, _rx) = app(&dir);

        let done = tokio::spawn(async {});
        while !done.is_finished() {
            tokio::task::yield_now().await;
        }
        app.track(done);
        app.track(tokio::spawn(std::future::pending()));
        assert_eq!(app.tasks.len(), 1);

        app.track(tokio::spawn(std::future::pending()));
        assert_eq!(app.tasks.len(), 2);
        for task in &app.tasks {
            task.abort();
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_sleep_timer_pauses_playback() {
        let dir = library();
        let (mut app, _rx) = app(&dir);
        app.core
            .play_album(&dir.path().join("Artist").join("Album"), 0)
            .unwrap();
        assert!(app.player.is_playing());

        app.execute(Command::Sleep(Some(1))).await;
        assert!(app.sleep.is_some());

        tokio::time::advance(Duration::from_secs(61)).await;
        app.poll_sleep_timer();
        assert!(app.sleep.is_none());
        assert!(!app.player.is_playing());
    }

    #[tokio::test]
    async fn test_unknown_album_number_is_not_fatal() {
        let dir = library();
        let (mut app, _rx) = app(&dir);
        assert_eq!(app.execute(Command::Play { album: 4, track: 0 }).await, Flow::Continue);
        assert!(app.core.tracks().is_empty());
    }
}
