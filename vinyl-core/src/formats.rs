//! Recognised audio file extensions and companion file naming.

use std::path::{Path, PathBuf};

/// Extension of the companion lyric file that sits next to each track.
pub const LYRICS_EXTENSION: &str = "lrc";

/// Audio container/codec extensions the library recognises, lower-case,
/// without the leading dot.
pub const SUPPORTED_AUDIO_EXTENSIONS: &[&str] = &[
    "3ga", "3gp", "8svx", "aa", "aac", "aax", "ac3", "act", "adts", "aif", "aifc", "aiff", "alac",
    "amr", "ape", "asf", "au", "awb", "caf", "cda", "dff", "dsf", "dss", "dts", "dvf", "flac", "gs",
    "iklax", "ivs", "m4a", "m4b", "m4p", "mka", "mmf", "mogg", "movpkg", "mp2", "mp3", "mpc", "msv",
    "nmf", "oga", "ogg", "opus", "ra", "raw", "rf64", "rm", "sln", "spx", "tak", "tta", "voc", "vox",
    "w64", "wav", "weba", "webm", "wma", "wv",
];

/// Whether a filename or path has a supported audio extension (case-insensitive).
#[must_use]
pub fn is_audio_file<P: AsRef<Path>>(path: P) -> bool {
    path.as_ref()
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            SUPPORTED_AUDIO_EXTENSIONS
                .iter()
                .any(|supported| supported.eq_ignore_ascii_case(ext))
        })
}

/// Path of the `.lrc` file that accompanies a track: same path, swapped extension.
#[must_use]
pub fn companion_lyrics_path<P: AsRef<Path>>(track: P) -> PathBuf {
    track.as_ref().with_extension(LYRICS_EXTENSION)
}
