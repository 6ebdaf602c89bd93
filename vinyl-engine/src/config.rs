//! Engine configuration, stored under `[engine]` in the shared config file.

use const_format::concatcp;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use vinyl_core::{CoreError, VinylConfig};

/// Section name used in config file
pub const SECTION_NAME: &str = "engine";

const DEFAULT_POLL_INTERVAL_MS: u64 = 50;
const DEFAULT_MAX_BACKOFF_MS: u64 = 30_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// How often the position poller samples the player
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
    /// Upper bound for the poller's retry delay after errors
    #[serde(default = "default_max_backoff")]
    pub max_backoff_ms: u64,
}

const fn default_poll_interval() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}

const fn default_max_backoff() -> u64 {
    DEFAULT_MAX_BACKOFF_MS
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            max_backoff_ms: DEFAULT_MAX_BACKOFF_MS,
        }
    }
}

impl EngineConfig {
    /// Extract the engine section, falling back to defaults when absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the section is present but malformed or invalid.
    pub fn from_config(config: &VinylConfig) -> Result<Self, CoreError> {
        let engine = config.section::<Self>(SECTION_NAME)?.unwrap_or_default();
        engine.validate()?;
        Ok(engine)
    }

    /// # Errors
    ///
    /// Returns an error if the poll interval is zero or the backoff cap is
    /// shorter than one poll interval.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.poll_interval_ms == 0 {
            return Err(CoreError::ConfigInvalid {
                message: "engine.poll_interval_ms must be greater than 0".into(),
            });
        }
        if self.max_backoff_ms < self.poll_interval_ms {
            return Err(CoreError::ConfigInvalid {
                message: "engine.max_backoff_ms must not be shorter than engine.poll_interval_ms"
                    .into(),
            });
        }
        Ok(())
    }

    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    #[must_use]
    pub const fn max_backoff(&self) -> Duration {
        Duration::from_millis(self.max_backoff_ms)
    }
}

/// Config template for the engine section.
/// This is appended to the base config template when creating a new config file.
pub const CONFIG_TEMPLATE: &str = concatcp!(
    "[engine]\n",
    "# How often playback position is sampled (lyrics and progress resolution)\n",
    "poll_interval_ms = ",
    DEFAULT_POLL_INTERVAL_MS,
    "\n",
    "# Retry delay cap when the player keeps reporting errors\n",
    "max_backoff_ms = ",
    DEFAULT_MAX_BACKOFF_MS,
    "\n\n"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_parses_to_defaults() {
        let engine: EngineConfig = toml_section(CONFIG_TEMPLATE);
        assert_eq!(engine, EngineConfig::default());
    }

    #[test]
    fn test_missing_section_uses_defaults() {
        let config = VinylConfig::parse("[library]\nroot = \"Music\"\n").unwrap();
        assert_eq!(EngineConfig::from_config(&config).unwrap(), EngineConfig::default());
    }

    #[test]
    fn test_partial_section() {
        let config = VinylConfig::parse("[engine]\npoll_interval_ms = 200\n").unwrap();
        let engine = EngineConfig::from_config(&config).unwrap();
        assert_eq!(engine.poll_interval(), Duration::from_millis(200));
        assert_eq!(engine.max_backoff_ms, DEFAULT_MAX_BACKOFF_MS);
    }

    #[test]
    fn test_zero_interval_rejected() {
        let config = VinylConfig::parse("[engine]\npoll_interval_ms = 0\n").unwrap();
        assert!(matches!(
            EngineConfig::from_config(&config),
            Err(CoreError::ConfigInvalid { .. })
        ));
    }

    #[test]
    fn test_wrong_type_rejected() {
        let config = VinylConfig::parse("[engine]\npoll_interval_ms = \"fast\"\n").unwrap();
        assert!(EngineConfig::from_config(&config).is_err());
    }

    fn toml_section(template: &str) -> EngineConfig {
        let config = VinylConfig::parse(template).unwrap();
        config.section(SECTION_NAME).unwrap().unwrap()
    }
}
