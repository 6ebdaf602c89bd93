use crate::time::{DurationExt, format_mmss};
use std::time::Duration;
use tokio::time::Instant;

/// Longest sleep timer accepted; longer requests are clamped to it
pub const MAX_SLEEP_MINUTES: u64 = 24 * 60;

/// Result of polling a [`SleepTimer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SleepStatus {
    /// Still running; carries the "Sleeping in mm:ss" label
    Counting(String),
    /// The deadline passed; pause playback and drop the timer
    Expired,
}

/// Countdown after which playback is paused.
#[derive(Debug, Clone, Copy)]
pub struct SleepTimer {
    deadline: Instant,
}

impl SleepTimer {
    /// Start counting down `minutes`, clamped to [`MAX_SLEEP_MINUTES`].
    #[must_use]
    pub fn start(minutes: u64) -> Self {
        let duration = Duration::from_secs(minutes.min(MAX_SLEEP_MINUTES) * 60);
        Self {
            deadline: Instant::now() + duration,
        }
    }

    #[must_use]
    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }

    #[must_use]
    pub fn poll(&self) -> SleepStatus {
        let remaining = self.remaining();
        if remaining.is_zero() {
            SleepStatus::Expired
        } else {
            SleepStatus::Counting(format!("Sleeping in {}", format_mmss(remaining.as_millis_u64())))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_counts_down_then_expires() {
        let timer = SleepTimer::start(2);
        assert_eq!(timer.poll(), SleepStatus::Counting("Sleeping in 02:00".into()));

        tokio::time::advance(Duration::from_secs(75)).await;
        assert_eq!(timer.poll(), SleepStatus::Counting("Sleeping in 00:45".into()));

        tokio::time::advance(Duration::from_secs(45)).await;
        assert_eq!(timer.poll(), SleepStatus::Expired);
    }

    #[tokio::test(start_paused = true)]
    async fn test_huge_request_is_clamped() {
        let timer = SleepTimer::start(u64::MAX);
        assert_eq!(timer.remaining(), Duration::from_secs(MAX_SLEEP_MINUTES * 60));
        assert_eq!(timer.poll(), SleepStatus::Counting("Sleeping in 1440:00".into()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_minutes_expires_immediately() {
        assert_eq!(SleepTimer::start(0).poll(), SleepStatus::Expired);
    }
}
