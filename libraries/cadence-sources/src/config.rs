//! Source backend configuration

use cadence_core::Track;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// `[sources]` section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourcesConfig {
    #[serde(default)]
    pub local: LocalSourceConfig,

    #[serde(default)]
    pub remote: RemoteSourceConfig,
}

/// `[sources.local]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalSourceConfig {
    /// Directories scanned for audio files on first use
    #[serde(default)]
    pub library_dirs: Vec<PathBuf>,

    /// File extensions picked up by the scan (lowercase, no dot)
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// Size of the recommendation list
    #[serde(default = "default_recommendation_limit")]
    pub recommendation_limit: usize,

    /// Tracks listed explicitly, ahead of scanned files
    #[serde(default)]
    pub tracks: Vec<Track>,
}

impl Default for LocalSourceConfig {
    fn default() -> Self {
        Self {
            library_dirs: Vec::new(),
            extensions: default_extensions(),
            recommendation_limit: default_recommendation_limit(),
            tracks: Vec::new(),
        }
    }
}

/// `[sources.remote]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteSourceConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Catalog server; the built-in demo catalog is used when unset
    #[serde(default)]
    pub base_url: Option<String>,

    /// Bearer token sent with catalog requests
    #[serde(default)]
    pub access_token: Option<String>,

    /// Stream full tracks instead of previews
    #[serde(default)]
    pub full_streams: bool,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for RemoteSourceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: None,
            access_token: None,
            full_streams: false,
            request_timeout_secs: default_request_timeout(),
        }
    }
}

fn default_extensions() -> Vec<String> {
    ["mp3", "flac", "ogg", "opus", "wav", "m4a", "aac"]
        .iter()
        .map(|ext| (*ext).to_string())
        .collect()
}

fn default_recommendation_limit() -> usize {
    10
}

fn default_true() -> bool {
    true
}

fn default_request_timeout() -> u64 {
    10
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_section_uses_defaults() {
        let config: SourcesConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, SourcesConfig::default());
        assert_eq!(config.local.recommendation_limit, 10);
        assert!(config.remote.enabled);
        assert!(!config.remote.full_streams);
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let config: SourcesConfig =
            serde_json::from_str(r#"{ "remote": { "base_url": "http://localhost:8080" } }"#)
                .unwrap();
        assert_eq!(config.remote.base_url.as_deref(), Some("http://localhost:8080"));
        assert_eq!(config.remote.request_timeout_secs, 10);
        assert!(config.local.extensions.contains(&"flac".to_string()));
    }
}
