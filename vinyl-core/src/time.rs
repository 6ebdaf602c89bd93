//! Time and duration conversion utilities.
//!
//! The player collaborator reports times as signed milliseconds where a
//! non-positive length means "unknown". Everything above it works in `u64`
//! milliseconds, so conversions saturate instead of wrapping.

use std::time::Duration;

/// Sentinel shown in place of a clock when the length is unknown.
pub const UNKNOWN_CLOCK: &str = "--:--";

/// Extension trait for safe Duration conversions.
pub trait DurationExt {
    /// Convert duration to milliseconds as u64, saturating at `u64::MAX`.
    fn as_millis_u64(&self) -> u64;

    /// Convert duration to milliseconds as i64, saturating at `i64::MAX`.
    ///
    /// The player collaborator speaks signed milliseconds.
    fn as_millis_i64(&self) -> i64;
}

impl DurationExt for Duration {
    fn as_millis_u64(&self) -> u64 {
        u64::try_from(self.as_millis()).unwrap_or(u64::MAX)
    }

    fn as_millis_i64(&self) -> i64 {
        i64::try_from(self.as_millis()).unwrap_or(i64::MAX)
    }
}

/// Clamp a player-reported time to a non-negative millisecond count.
#[must_use]
pub fn clamp_millis(ms: i64) -> u64 {
    u64::try_from(ms).unwrap_or(0)
}

/// A player-reported length, or `None` when it is not known yet (`<= 0`).
#[must_use]
pub fn known_length(ms: i64) -> Option<u64> {
    u64::try_from(ms).ok().filter(|&ms| ms > 0)
}

/// Format milliseconds as `mm:ss`. Minutes are not wrapped into hours.
#[must_use]
pub fn format_mmss(ms: u64) -> String {
    let seconds = ms / 1000;
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

/// Format the `current / total` clock shown under the seek bar.
#[must_use]
pub fn format_progress(current_ms: u64, total_ms: Option<u64>) -> String {
    match total_ms {
        Some(total) => format!("{} / {}", format_mmss(current_ms), format_mmss(total)),
        None => format!("{} / {UNKNOWN_CLOCK}", format_mmss(current_ms)),
    }
}
