//! Track value type
//!
//! Tracks are immutable once built; the `with_*` helpers consume and return a
//! new value. Equality and hashing only look at the id.

use super::SourceKind;
use serde::{Deserialize, Deserializer, Serialize};
use std::hash::{Hash, Hasher};

/// Playable item descriptor
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    /// Opaque identity, unique within the player
    pub id: String,

    /// Track title
    pub title: String,

    /// Artist name
    pub artist: String,

    /// Album title
    pub album: String,

    /// Length in seconds (never negative)
    #[serde(rename = "duration", deserialize_with = "non_negative_seconds")]
    pub duration_secs: f64,

    /// Artwork reference
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        alias = "imageurl",
        alias = "image_url"
    )]
    pub image_url: Option<String>,

    /// Backend that can play this track
    #[serde(default)]
    pub source: SourceKind,

    /// Direct URL of the full asset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Short preview, used when the full asset cannot be served
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview: Option<String>,
}

impl Track {
    /// Create a track with no URLs or artwork
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        artist: impl Into<String>,
        album: impl Into<String>,
        duration_secs: f64,
        source: SourceKind,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            artist: artist.into(),
            album: album.into(),
            duration_secs: sanitize_seconds(duration_secs),
            image_url: None,
            source,
            url: None,
            preview: None,
        }
    }

    /// Set the direct URL
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Set the preview URL
    pub fn with_preview(mut self, preview: impl Into<String>) -> Self {
        self.preview = Some(preview.into());
        self
    }

    /// Set the artwork reference
    pub fn with_image(mut self, image_url: impl Into<String>) -> Self {
        self.image_url = Some(image_url.into());
        self
    }

    /// Re-tag the track with another source kind
    pub fn with_source(mut self, source: SourceKind) -> Self {
        self.source = source;
        self
    }

    /// URL a backend should load
    ///
    /// With `prefer_preview` the preview wins when both exist; otherwise the
    /// direct URL wins and the preview is the fallback.
    pub fn playable_url(&self, prefer_preview: bool) -> Option<&str> {
        let (first, second) = if prefer_preview {
            (&self.preview, &self.url)
        } else {
            (&self.url, &self.preview)
        };

        fn usable(url: &Option<String>) -> Option<&str> {
            url.as_deref().filter(|url| !url.is_empty())
        }
        usable(first).or_else(|| usable(second))
    }

    /// Case-insensitive substring match over title, artist and album
    ///
    /// An empty query matches everything.
    pub fn matches_query(&self, query: &str) -> bool {
        let needle = query.to_lowercase();
        if needle.is_empty() {
            return true;
        }

        [&self.title, &self.artist, &self.album]
            .iter()
            .any(|field| field.to_lowercase().contains(&needle))
    }
}

impl PartialEq for Track {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Track {}

impl Hash for Track {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

fn sanitize_seconds(seconds: f64) -> f64 {
    if seconds.is_finite() && seconds > 0.0 {
        seconds
    } else {
        0.0
    }
}

fn non_negative_seconds<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    f64::deserialize(deserializer).map(sanitize_seconds)
}
