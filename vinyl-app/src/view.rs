//! Plain-text rendering of the catalog, track list, now-playing panel and lyrics.

use std::fmt::Write;
use vinyl_core::{AlbumRecord, LyricContent, NowPlaying, TrackEntry, TrackRow};

/// Lines shown above and below the active lyric
const LYRIC_CONTEXT: usize = 3;

const PLACEHOLDER_LYRICS: &str = "No lyrics found for this track.";

/// Numbered album list, keeping catalog numbers stable under filtering.
pub fn album_list(albums: &[AlbumRecord], filter: Option<&str>) -> String {
    let mut out = String::new();
    for (i, album) in albums.iter().enumerate() {
        if filter.is_some_and(|f| !album.matches(f)) {
            continue;
        }
        let art = match &album.cover {
            Some(cover) if !cover.is_placeholder() => " [cover]",
            _ => "",
        };
        let _ = writeln!(out, "{:>4}. {} - {}{}", i + 1, album.artist, album.album, art);
    }
    if out.is_empty() {
        out.push_str("No albums.\n");
    }
    out
}

/// Track list rows with disc headings; the current track is marked.
pub fn track_list(rows: &[TrackRow], tracks: &[TrackEntry], current: Option<usize>) -> String {
    let mut out = String::new();
    for (row, entry) in rows.iter().enumerate() {
        match *entry {
            TrackRow::DiscHeading(disc) => {
                let _ = writeln!(out, "{:>4}  -- Disc {disc} --", row + 1);
            }
            TrackRow::Track(index) => {
                let Some(track) = tracks.get(index) else {
                    continue;
                };
                let marker = if current == Some(index) { '>' } else { ' ' };
                let _ = writeln!(out, "{:>4} {marker} {}", row + 1, track.display_label());
            }
        }
    }
    if out.is_empty() {
        out.push_str("Nothing loaded.\n");
    }
    out
}

pub fn now_playing(now: &NowPlaying, progress: &str) -> String {
    format!(
        "Now playing: {} [{}]  (bg {}, text {})",
        now.track.display_label(),
        progress,
        now.palette.background.hex(),
        now.palette.text.hex()
    )
}

/// Lyrics panel: a window around the active line for synced lyrics,
/// the whole text for unsynced lyrics, a placeholder otherwise.
pub fn lyrics(content: &LyricContent, active: Option<usize>) -> String {
    let mut out = String::new();
    match content {
        LyricContent::Synced(doc) => {
            if let Some(title) = &doc.metadata.title {
                let _ = writeln!(out, "  ~ {title} ~");
            }
            let window = doc.visible_lines(active, LYRIC_CONTEXT, LYRIC_CONTEXT);
            let first = active
                .unwrap_or(0)
                .min(doc.lines.len().saturating_sub(1))
                .saturating_sub(LYRIC_CONTEXT);
            for (offset, line) in window.iter().enumerate() {
                let index = first + offset;
                let marker = if active == Some(index) { '>' } else { ' ' };
                let _ = writeln!(out, "{:>4} {marker} {}", index + 1, line.text);
            }
        }
        LyricContent::Unsynced(lines) => {
            for line in lines {
                let _ = writeln!(out, "       {line}");
            }
        }
        LyricContent::Empty => {
            let _ = writeln!(out, "       {PLACEHOLDER_LYRICS}");
        }
    }
    out
}
