//! Player configuration
//!
//! Loaded from an optional TOML file, then overridden by `CADENCE_`
//! environment variables with `__` between sections, e.g.
//! `CADENCE_PLAYBACK__INITIAL_VOLUME=0.5` or
//! `CADENCE_SOURCES__REMOTE__BASE_URL=http://localhost:8080`.

use crate::error::{PlayerError, Result};
use cadence_core::DEFAULT_VOLUME;
use cadence_sources::SourcesConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CadenceConfig {
    #[serde(default)]
    pub playback: PlaybackConfig,

    #[serde(default)]
    pub sources: SourcesConfig,
}

/// `[playback]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackConfig {
    /// Volume a fresh player starts with
    #[serde(default = "default_volume")]
    pub initial_volume: f32,

    /// Progress sampler period
    #[serde(default = "default_progress_interval")]
    pub progress_interval_ms: u64,

    /// How long a front end should keep an error notice on screen
    #[serde(default = "default_error_display")]
    pub error_display_secs: u64,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            initial_volume: default_volume(),
            progress_interval_ms: default_progress_interval(),
            error_display_secs: default_error_display(),
        }
    }
}

impl PlaybackConfig {
    pub fn progress_interval(&self) -> Duration {
        Duration::from_millis(self.progress_interval_ms)
    }

    pub fn error_display(&self) -> Duration {
        Duration::from_secs(self.error_display_secs)
    }
}

fn default_volume() -> f32 {
    DEFAULT_VOLUME
}

fn default_progress_interval() -> u64 {
    1000
}

fn default_error_display() -> u64 {
    5
}

impl CadenceConfig {
    /// Load from `path` (if given and present) and the environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = config::Config::builder();

        if let Some(path) = path {
            if path.exists() {
                settings = settings.add_source(config::File::from(path));
            } else {
                tracing::warn!(path = %path.display(), "Config file not found, using defaults");
            }
        }

        // Override with environment variables (prefixed with CADENCE_)
        settings = settings.add_source(
            config::Environment::with_prefix("CADENCE")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config: Self = settings
            .build()
            .map_err(|e| PlayerError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| PlayerError::Config(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// Reject values the player cannot work with
    pub fn validate(&self) -> Result<()> {
        let volume = self.playback.initial_volume;
        if !(0.0..=1.0).contains(&volume) {
            return Err(PlayerError::Config(format!(
                "playback.initial_volume must be between 0.0 and 1.0, got {volume}"
            )));
        }

        if self.playback.progress_interval_ms == 0 {
            return Err(PlayerError::Config(
                "playback.progress_interval_ms must be greater than 0".to_string(),
            ));
        }

        if self.sources.local.extensions.is_empty() && !self.sources.local.library_dirs.is_empty() {
            return Err(PlayerError::Config(
                "sources.local.extensions cannot be empty when library_dirs are set".to_string(),
            ));
        }

        let remote = &self.sources.remote;
        if remote.enabled {
            if let Some(url) = &remote.base_url {
                if !url.starts_with("http://") && !url.starts_with("https://") {
                    return Err(PlayerError::Config(format!(
                        "sources.remote.base_url must start with http:// or https://, got {url}"
                    )));
                }
            }
        }

        Ok(())
    }
}
