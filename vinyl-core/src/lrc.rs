use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

const LOG_TARGET: &str = "vinyl::lyrics";

/// Parsed LRC file: header metadata plus time-ordered lines
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LyricDocument {
    pub metadata: LyricMetadata,
    pub lines: Vec<LyricLine>,
}

/// LRC metadata from ID tags
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LyricMetadata {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub author: Option<String>,
    pub length: Option<Duration>,
    /// `[offset:]` header in milliseconds. Recorded only; never applied.
    pub offset_ms: i64,
}

/// A single line of lyrics with its start time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LyricLine {
    pub timestamp_ms: u64,
    pub text: String,
}

/// What a lyric file turned out to contain
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LyricContent {
    /// Timestamped lines, tracked against playback time
    Synced(LyricDocument),
    /// Plain text with no usable timestamps, shown statically
    Unsynced(Vec<String>),
    /// Nothing to show; the presentation layer picks placeholder text
    #[default]
    Empty,
}

impl LyricDocument {
    /// Parse an LRC string
    #[must_use]
    pub fn parse(input: &str) -> Self {
        Self::parse_with_offset(input, 0)
    }

    /// Parse an LRC string, shifting every timestamp earlier by `offset_ms` (floored at 0)
    #[must_use]
    pub fn parse_with_offset(input: &str, offset_ms: u64) -> Self {
        let mut metadata = LyricMetadata::default();
        let mut lines = Vec::new();

        for line in input.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            if let Some((tag, value)) = parse_id_tag(line) {
                apply_id_tag(&mut metadata, &tag, value);
                continue;
            }

            // Malformed timestamp lines yield nothing and are skipped
            if let Some(parsed_lines) = parse_lyric_line(line) {
                lines.extend(parsed_lines.into_iter().map(|mut l| {
                    l.timestamp_ms = l.timestamp_ms.saturating_sub(offset_ms);
                    l
                }));
            }
        }

        // Stable: lines sharing a timestamp keep file order
        lines.sort_by_key(|l| l.timestamp_ms);

        Self { metadata, lines }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Index of the line with the greatest timestamp `<= time_ms`, or `None`
    /// before the first line.
    ///
    /// `previous` is the index returned by the last call. It is only a hint:
    /// the common case (same line, or the next one) is answered without a
    /// search, anything else (seeks in either direction) falls back to a
    /// binary search. The result never depends on the hint.
    #[must_use]
    pub fn active_index_at(&self, time_ms: u64, previous: Option<usize>) -> Option<usize> {
        if let Some(prev) = previous.filter(|&i| i < self.lines.len()) {
            if self.is_active(prev, time_ms) {
                return Some(prev);
            }
            if self.is_active(prev + 1, time_ms) {
                return Some(prev + 1);
            }
        }

        self.lines
            .partition_point(|l| l.timestamp_ms <= time_ms)
            .checked_sub(1)
    }

    fn is_active(&self, index: usize, time_ms: u64) -> bool {
        self.lines.get(index).is_some_and(|line| {
            line.timestamp_ms <= time_ms
                && self
                    .lines
                    .get(index + 1)
                    .is_none_or(|next| next.timestamp_ms > time_ms)
        })
    }

    /// Find the current line for a given playback position
    #[must_use]
    pub fn line_at(&self, time_ms: u64) -> Option<&LyricLine> {
        self.active_index_at(time_ms, None).map(|i| &self.lines[i])
    }

    /// Lines around `index` for display; the first lines when nothing is active yet
    #[must_use]
    pub fn visible_lines(&self, index: Option<usize>, before: usize, after: usize) -> &[LyricLine] {
        let current = index.unwrap_or(0).min(self.lines.len().saturating_sub(1));
        let start = current.saturating_sub(before);
        let end = (current + after + 1).min(self.lines.len());
        &self.lines[start..end]
    }
}

impl LyricContent {
    /// Classify lyric file content into synced, unsynced or empty
    #[must_use]
    pub fn parse(input: &str, offset_ms: u64) -> Self {
        let document = LyricDocument::parse_with_offset(input, offset_ms);
        if !document.is_empty() {
            return Self::Synced(document);
        }

        let unsynced: Vec<String> = input
            .lines()
            .map(str::trim)
            .filter(|line| is_unsynced_text(line))
            .map(ToString::to_string)
            .collect();

        if unsynced.is_empty() {
            Self::Empty
        } else {
            Self::Unsynced(unsynced)
        }
    }

    /// Read and classify a lyric file. A missing or unreadable file is `Empty`.
    #[must_use]
    pub fn load(path: &Path, offset_ms: u64) -> Self {
        match fs::read(path) {
            Ok(bytes) => {
                let content = Self::parse(&String::from_utf8_lossy(&bytes), offset_ms);
                debug!(
                    target: LOG_TARGET,
                    "Loaded {} from {}",
                    content.kind(),
                    path.display()
                );
                content
            }
            Err(e) => {
                debug!(target: LOG_TARGET, "No lyrics at {}: {}", path.display(), e);
                Self::Empty
            }
        }
    }

    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Synced(_) => "synced lyrics",
            Self::Unsynced(_) => "unsynced lyrics",
            Self::Empty => "no lyrics",
        }
    }

    #[must_use]
    pub const fn as_synced(&self) -> Option<&LyricDocument> {
        match self {
            Self::Synced(doc) => Some(doc),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }
}

fn apply_id_tag(metadata: &mut LyricMetadata, tag: &str, value: String) {
    match tag.to_lowercase().as_str() {
        "ti" => metadata.title = Some(value),
        "ar" => metadata.artist = Some(value),
        "al" => metadata.album = Some(value),
        "au" | "by" => metadata.author = Some(value),
        "length" => metadata.length = parse_timestamp(&value).map(Duration::from_millis),
        "offset" => {
            if let Ok(offset) = value.parse::<i64>() {
                metadata.offset_ms = offset;
            }
        }
        _ => {} // Ignore unknown tags
    }
}

/// A plain text line: not blank, not a whole-line `[key:value]` header and
/// without a timestamp bracket. Section labels like `[Chorus]` are kept.
fn is_unsynced_text(line: &str) -> bool {
    let is_header = line.starts_with('[') && line.ends_with(']') && line.contains(':');
    !line.is_empty() && !is_header && !has_timestamp(line)
}

/// Whether any bracketed segment of the line is a valid timestamp
fn has_timestamp(line: &str) -> bool {
    line.split('[')
        .skip(1)
        .filter_map(|segment| segment.split_once(']'))
        .any(|(inside, _)| parse_timestamp(inside).is_some())
}

/// Parse an ID tag like [ti:Title] or [ar:Artist]
fn parse_id_tag(line: &str) -> Option<(String, String)> {
    let rest = line.strip_prefix('[')?;
    let end = rest.find(']')?;
    let content = &rest[..end];

    let first_colon = content.find(':')?;
    let tag = &content[..first_colon];

    // A tag starting with a digit is a timestamp, not a header
    if tag.is_empty() || tag.starts_with(|c: char| c.is_ascii_digit()) {
        return None;
    }

    let value = content[first_colon + 1..].trim().to_string();
    Some((tag.to_string(), value))
}

/// Parse a lyric line like [00:12.34]Hello world or [00:12.34][00:15.67]Same lyrics
fn parse_lyric_line(line: &str) -> Option<Vec<LyricLine>> {
    let mut remaining = line;
    let mut timestamps = Vec::new();

    // Extract all timestamps at the beginning
    while let Some(rest) = remaining.strip_prefix('[') {
        let Some(end) = rest.find(']') else {
            break;
        };
        let Some(time) = parse_timestamp(&rest[..end]) else {
            break;
        };
        timestamps.push(time);
        remaining = &rest[end + 1..];
    }

    if timestamps.is_empty() {
        return None;
    }

    let text = remaining.trim();

    // One line per timestamp (handles multi-timestamp lines)
    Some(
        timestamps
            .into_iter()
            .map(|timestamp_ms| LyricLine {
                timestamp_ms,
                text: text.to_string(),
            })
            .collect(),
    )
}

/// Parse "mm:ss", "mm:ss.fff" or "mm:ss:cc" into milliseconds
fn parse_timestamp(s: &str) -> Option<u64> {
    let parts: Vec<&str> = s.trim().split(':').collect();

    let (minutes, seconds, fraction_ms) = match parts.as_slice() {
        [minutes, seconds] => {
            let (whole, fraction) = match seconds.split_once('.') {
                Some((whole, fraction)) => (whole, Some(fraction)),
                None => (*seconds, None),
            };
            let fraction_ms = match fraction {
                Some(fraction) => parse_fraction_ms(fraction)?,
                None => 0,
            };
            (parse_digits(minutes)?, parse_digits(whole)?, fraction_ms)
        }
        // mm:ss:xx (hundredths)
        [minutes, seconds, hundredths] => (
            parse_digits(minutes)?,
            parse_digits(seconds)?,
            parse_digits(hundredths)?.checked_mul(10)?,
        ),
        _ => return None,
    };

    minutes
        .checked_mul(60)?
        .checked_add(seconds)?
        .checked_mul(1000)?
        .checked_add(fraction_ms)
}

fn parse_digits(s: &str) -> Option<u64> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

/// Decimal fraction of a second in milliseconds, truncated past three digits
fn parse_fraction_ms(fraction: &str) -> Option<u64> {
    if fraction.is_empty() || !fraction.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let millis: String = fraction.chars().chain("00".chars()).take(3).collect();
    millis.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(doc: &LyricDocument) -> Vec<(u64, &str)> {
        doc.lines
            .iter()
            .map(|l| (l.timestamp_ms, l.text.as_str()))
            .collect()
    }

    #[test]
    fn test_parse_sorts_ascending() {
        let doc = LyricDocument::parse("[00:01.50]Hello\n[00:00.00]World");
        assert_eq!(pairs(&doc), [(0, "World"), (1500, "Hello")]);
    }

    #[test]
    fn test_active_index() {
        let doc = LyricDocument::parse("[00:01.50]Hello\n[00:00.00]World");
        assert_eq!(doc.active_index_at(1000, None), Some(0));
        assert_eq!(doc.active_index_at(2000, None), Some(1));
        assert_eq!(doc.active_index_at(0, None), Some(0));
    }

    #[test]
    fn test_active_index_before_first_line() {
        let doc = LyricDocument::parse("[00:05.00]First\n[00:10.00]Second");
        assert_eq!(doc.active_index_at(4999, None), None);
        assert_eq!(doc.active_index_at(5000, None), Some(0));
        assert_eq!(LyricDocument::default().active_index_at(100, None), None);
    }

    #[test]
    fn test_active_index_handles_seeks_with_stale_hint() {
        let doc = LyricDocument::parse(
            "[00:05.00]Line 1\n[00:10.00]Line 2\n[00:15.00]Line 3\n[00:20.00]Line 4",
        );
        // Forward progression reuses the hint
        let mut index = None;
        for (time, expected) in [(0, None), (5_000, Some(0)), (10_500, Some(1)), (15_000, Some(2))] {
            index = doc.active_index_at(time, index);
            assert_eq!(index, expected);
        }
        // Backward seek
        assert_eq!(doc.active_index_at(6_000, Some(3)), Some(0));
        assert_eq!(doc.active_index_at(1_000, Some(2)), None);
        // Forward jump over several lines
        assert_eq!(doc.active_index_at(25_000, Some(0)), Some(3));
        // Out-of-range hint is ignored
        assert_eq!(doc.active_index_at(12_000, Some(99)), Some(1));
    }

    #[test]
    fn test_active_index_is_idempotent() {
        let doc = LyricDocument::parse("[00:01.00]a\n[00:02.00]b\n[00:03.00]c");
        let first = doc.active_index_at(2_500, None);
        let again = doc.active_index_at(2_500, first);
        assert_eq!(first, again);
        assert_eq!(first, Some(1));
    }

    #[test]
    fn test_offset_floors_at_zero() {
        let doc = LyricDocument::parse_with_offset("[00:00.30]Early\n[00:02.00]Later", 500);
        assert_eq!(pairs(&doc), [(0, "Early"), (1500, "Later")]);
    }

    #[test]
    fn test_header_offset_is_not_applied() {
        let doc = LyricDocument::parse("[offset:+500]\n[00:10.00]Test");
        assert_eq!(doc.metadata.offset_ms, 500);
        assert_eq!(doc.lines[0].timestamp_ms, 10_000);
    }

    #[test]
    fn test_parse_id_tags() {
        let input = "[ti:Song Title]\n[ar:Artist Name]\n[al:Album Name]\n[by:Someone]\n[length:03:25]\n[00:05.00]Lyrics here";
        let doc = LyricDocument::parse(input);
        assert_eq!(doc.metadata.title.as_deref(), Some("Song Title"));
        assert_eq!(doc.metadata.artist.as_deref(), Some("Artist Name"));
        assert_eq!(doc.metadata.album.as_deref(), Some("Album Name"));
        assert_eq!(doc.metadata.author.as_deref(), Some("Someone"));
        assert_eq!(doc.metadata.length, Some(Duration::from_secs(205)));
        assert_eq!(pairs(&doc), [(5000, "Lyrics here")]);
    }

    #[test]
    fn test_parse_multi_timestamp_line() {
        let doc = LyricDocument::parse("[00:05.00][00:15.00]Repeated lyric\n[00:10.00]Between");
        assert_eq!(
            pairs(&doc),
            [(5000, "Repeated lyric"), (10_000, "Between"), (15_000, "Repeated lyric")]
        );
    }

    #[test]
    fn test_ties_keep_file_order() {
        let doc = LyricDocument::parse("[00:03.00]first\n[00:01.00]zero\n[00:03.00]second");
        assert_eq!(pairs(&doc), [(1000, "zero"), (3000, "first"), (3000, "second")]);
        assert_eq!(doc.active_index_at(3000, None), Some(2));
    }

    #[test]
    fn test_timestamp_forms() {
        assert_eq!(parse_timestamp("00:12.34"), Some(12_340));
        assert_eq!(parse_timestamp("00:12:34"), Some(12_340));
        assert_eq!(parse_timestamp("01:02"), Some(62_000));
        assert_eq!(parse_timestamp("00:01.5"), Some(1_500));
        assert_eq!(parse_timestamp("00:01.05"), Some(1_050));
        assert_eq!(parse_timestamp("00:01.23456"), Some(1_234));
        assert_eq!(parse_timestamp("10:00.000"), Some(600_000));
        assert_eq!(parse_timestamp("ab:cd"), None);
        assert_eq!(parse_timestamp("00:-1.00"), None);
        assert_eq!(parse_timestamp("00:01."), None);
    }

    #[test]
    fn test_malformed_lines_are_skipped() {
        let doc = LyricDocument::parse("[00:xx.00]broken\n[00:02.00]fine\n[00:03.00");
        assert_eq!(pairs(&doc), [(2000, "fine")]);
    }

    #[test]
    fn test_parse_cjk_lyrics() {
        let doc = LyricDocument::parse("[00:05.00]你好世界");
        assert_eq!(doc.lines[0].text, "你好世界");
    }

    #[test]
    fn test_parse_is_deterministic() {
        let input = "[ar:x]\n[00:02.00]b\n[00:01.00]a\n[00:01.00][00:04.00]c";
        assert_eq!(LyricDocument::parse(input), LyricDocument::parse(input));
    }

    #[test]
    fn test_content_classification() {
        assert!(matches!(
            LyricContent::parse("[00:01.00]synced", 0),
            LyricContent::Synced(_)
        ));
        assert_eq!(
            LyricContent::parse("[ar:Someone]\n\nFirst verse\n  Second verse  \n", 0),
            LyricContent::Unsynced(vec!["First verse".into(), "Second verse".into()])
        );
        assert_eq!(LyricContent::parse("[ti:Only headers]\n\n", 0), LyricContent::Empty);
        assert_eq!(LyricContent::parse("", 0), LyricContent::Empty);
    }

    #[test]
    fn test_unsynced_keeps_section_labels() {
        assert_eq!(
            LyricContent::parse("[ar:Someone]\n[Chorus]\nLa la la\n[Verse 2] Here we go", 0),
            LyricContent::Unsynced(vec![
                "[Chorus]".into(),
                "La la la".into(),
                "[Verse 2] Here we go".into(),
            ])
        );
    }

    #[test]
    fn test_unsynced_drops_lines_with_inline_timestamps() {
        assert_eq!(
            LyricContent::parse("[by:someone]\nplain\nintro [00:05.00] late\nnote [01:xx] kept\n", 0),
            LyricContent::Unsynced(vec!["plain".into(), "note [01:xx] kept".into()])
        );
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let content = LyricContent::load(Path::new("/definitely/not/here.lrc"), 0);
        assert!(content.is_empty());
    }

    #[test]
    fn test_visible_lines() {
        let doc = LyricDocument::parse(
            "[00:05.00]Line 1\n[00:10.00]Line 2\n[00:15.00]Line 3\n[00:20.00]Line 4\n[00:25.00]Line 5",
        );
        let index = doc.active_index_at(12_000, None);
        let visible: Vec<_> = doc.visible_lines(index, 1, 1).iter().map(|l| l.text.as_str()).collect();
        assert_eq!(visible, ["Line 1", "Line 2", "Line 3"]);

        let start: Vec<_> = doc.visible_lines(None, 1, 1).iter().map(|l| l.text.as_str()).collect();
        assert_eq!(start, ["Line 1", "Line 2"]);
        assert!(LyricDocument::default().visible_lines(None, 2, 2).is_empty());
    }
}
