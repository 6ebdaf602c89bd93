//! Line commands typed on stdin.

use thiserror::Error;
use vinyl_core::MAX_SLEEP_MINUTES;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Quit,
    /// List the catalog, optionally filtered by artist/album substring
    Albums(Option<String>),
    /// Play catalog entry `album` (1-based) from logical track `track` (1-based)
    Play { album: usize, track: usize },
    Tracks,
    /// Play the track shown at a row of `tracks` (1-based, headings count)
    Row(usize),
    Next,
    Previous,
    Pause,
    Shuffle,
    Random,
    Repeat,
    Volume(u8),
    /// Seek to an absolute position in milliseconds
    Seek(u64),
    /// Drag the seek bar to a permille position and release it
    SeekBar(u16),
    /// Seek to a synced lyric line (1-based)
    Line(usize),
    Lyrics,
    Now,
    Search(String),
    /// Play search hit `n` (1-based)
    Found(usize),
    Playlists,
    PlaylistCreate(String),
    PlaylistAdd(String),
    PlaylistPlay(String),
    /// Start a sleep timer; `None` cancels it
    Sleep(Option<u64>),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("Unknown command {0:?}, type `help` for a list")]
    Unknown(String),

    #[error("`{command}` needs {argument}")]
    MissingArgument {
        command: &'static str,
        argument: &'static str,
    },

    #[error("Invalid {what}: {value:?}")]
    Invalid { what: &'static str, value: String },
}

pub const HELP: &str = "\
albums [filter]          list albums
play <album> [track]     play an album (numbers from `albums`)
tracks                   list the loaded tracks
row <n>                  play the track on row n of `tracks`
next | prev | pause      transport
shuffle | random         toggle album shuffle / random library shuffle
repeat                   cycle repeat mode
vol <0-100>              set volume
seek <mm:ss>             seek the current track
seekbar <0-1000>         drag the seek bar and release
line <n>                 seek to lyric line n
lyrics | now             show lyrics / now playing
search <text>            search song filenames
found <n>                play search hit n
playlists                list playlists
playlist new|add|play <name>
sleep <minutes> | sleep off  (up to 1440 minutes)
quit";

impl Command {
    /// Parse one input line. Blank lines yield `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns a [`ParseError`] describing what was wrong with the line.
    pub fn parse(line: &str) -> Result<Option<Self>, ParseError> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }
        let (word, rest) = line
            .split_once(char::is_whitespace)
            .map_or((line, ""), |(word, rest)| (word, rest.trim()));
        let rest = (!rest.is_empty()).then_some(rest);

        let command = match word.to_lowercase().as_str() {
            "help" | "?" => Self::Help,
            "quit" | "exit" | "q" => Self::Quit,
            "albums" => Self::Albums(rest.map(str::to_string)),
            "play" => {
                let rest = require(rest, "play", "an album number")?;
                let mut parts = rest.split_whitespace();
                let album = parts.next().map_or(Ok(1), |n| ordinal(n, "album number"))?;
                let track = parts.next().map_or(Ok(1), |n| ordinal(n, "track number"))?;
                Self::Play { album, track }
            }
            "tracks" => Self::Tracks,
            "row" => Self::Row(ordinal(require(rest, "row", "a row number")?, "row number")?),
            "next" | "n" => Self::Next,
            "prev" | "previous" | "p" => Self::Previous,
            "pause" | "toggle" => Self::Pause,
            "shuffle" => Self::Shuffle,
            "random" => Self::Random,
            "repeat" => Self::Repeat,
            "vol" | "volume" => {
                let value = require(rest, "vol", "a level")?;
                let volume = value
                    .parse::<u8>()
                    .ok()
                    .filter(|v| *v <= 100)
                    .ok_or_else(|| invalid("volume", value))?;
                Self::Volume(volume)
            }
            "seek" => {
                let value = require(rest, "seek", "a position")?;
                Self::Seek(parse_clock(value).ok_or_else(|| invalid("position", value))?)
            }
            "seekbar" => {
                let value = require(rest, "seekbar", "a position")?;
                let position = value
                    .parse::<u16>()
                    .ok()
                    .filter(|p| *p <= 1000)
                    .ok_or_else(|| invalid("seek bar position", value))?;
                Self::SeekBar(position)
            }
            "line" => Self::Line(ordinal(require(rest, "line", "a line number")?, "line number")?),
            "lyrics" => Self::Lyrics,
            "now" | "status" => Self::Now,
            "search" => Self::Search(require(rest, "search", "some text")?.to_string()),
            "found" => Self::Found(ordinal(require(rest, "found", "a hit number")?, "hit number")?),
            "playlists" => Self::Playlists,
            "playlist" => parse_playlist(rest)?,
            "sleep" => match require(rest, "sleep", "minutes or `off`")? {
                "off" => Self::Sleep(None),
                value => Self::Sleep(Some(
                    value
                        .parse::<u64>()
                        .ok()
                        .filter(|m| (1..=MAX_SLEEP_MINUTES).contains(m))
                        .ok_or_else(|| invalid("minutes", value))?,
                )),
            },
            _ => return Err(ParseError::Unknown(word.to_string())),
        };
        Ok(Some(command))
    }
}

fn parse_playlist(rest: Option<&str>) -> Result<Command, ParseError> {
    let rest = require(rest, "playlist", "new, add or play")?;
    let (action, name) = rest
        .split_once(char::is_whitespace)
        .map(|(action, name)| (action, name.trim()))
        .ok_or(ParseError::MissingArgument {
            command: "playlist",
            argument: "a playlist name",
        })?;
    let name = name.to_string();
    match action {
        "new" | "create" => Ok(Command::PlaylistCreate(name)),
        "add" => Ok(Command::PlaylistAdd(name)),
        "play" => Ok(Command::PlaylistPlay(name)),
        other => Err(invalid("playlist action", other)),
    }
}

fn require<'a>(
    rest: Option<&'a str>,
    command: &'static str,
    argument: &'static str,
) -> Result<&'a str, ParseError> {
    rest.ok_or(ParseError::MissingArgument { command, argument })
}

fn invalid(what: &'static str, value: &str) -> ParseError {
    ParseError::Invalid {
        what,
        value: value.to_string(),
    }
}

/// 1-based number typed by the user, returned 0-based
fn ordinal(value: &str, what: &'static str) -> Result<usize, ParseError> {
    value
        .parse::<usize>()
        .ok()
        .and_then(|n| n.checked_sub(1))
        .ok_or_else(|| invalid(what, value))
}

/// `mm:ss`, `h:mm:ss` or plain seconds, in milliseconds
fn parse_clock(value: &str) -> Option<u64> {
    value
        .split(':')
        .try_fold(0_u64, |acc, part| {
            let part = part.parse::<u64>().ok()?;
            acc.checked_mul(60)?.checked_add(part)
        })
        .and_then(|secs| secs.checked_mul(1000))
}
