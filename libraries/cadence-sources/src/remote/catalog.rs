//! Remote catalog clients

use async_trait::async_trait;
use cadence_core::{SourceKind, Track};
use thiserror::Error;

/// Catalog transport errors
#[derive(Error, Debug)]
pub enum CatalogError {
    /// Server is offline or unreachable
    #[error("Catalog unreachable: {0}")]
    Unreachable(String),

    /// Server returned an error response
    #[error("Catalog error ({status}): {message}")]
    Status { status: u16, message: String },

    /// Failed to parse a catalog response
    #[error("Failed to parse catalog response: {0}")]
    Parse(String),

    /// HTTP request failed
    #[error("Catalog request failed: {0}")]
    Request(#[from] reqwest::Error),
}

/// Where the remote backend finds tracks
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CatalogClient: Send + Sync {
    /// Check the catalog is reachable before the backend goes live
    async fn connect(&self) -> Result<(), CatalogError>;

    async fn search(&self, query: &str) -> Result<Vec<Track>, CatalogError>;

    async fn recommendations(&self) -> Result<Vec<Track>, CatalogError>;
}

/// Built-in demo catalog, used when no catalog server is configured
pub struct StaticCatalog {
    tracks: Vec<Track>,
    recommended: Vec<Track>,
}

impl StaticCatalog {
    pub fn new(tracks: Vec<Track>, recommended: Vec<Track>) -> Self {
        Self {
            tracks,
            recommended,
        }
    }

    /// Catalog seeded with a handful of demo tracks
    pub fn demo() -> Self {
        let track = |id: &str, title: &str, artist: &str, album: &str, duration: f64| {
            Track::new(id, title, artist, album, duration, SourceKind::Remote)
                .with_image(format!("https://images.example.com/{id}.jpg"))
                .with_preview(format!("https://previews.example.com/{id}.mp3"))
        };

        Self::new(
            vec![
                track("remote-1", "Blinding Lights", "The Weeknd", "After Hours", 200.0),
                track("remote-2", "Shape of You", "Ed Sheeran", "÷ (Divide)", 233.0),
                track("remote-3", "Watermelon Sugar", "Harry Styles", "Fine Line", 174.0),
            ],
            vec![
                track("remote-rec-1", "As It Was", "Harry Styles", "Harry's House", 167.0),
                track("remote-rec-2", "Anti-Hero", "Taylor Swift", "Midnights", 200.0),
            ],
        )
    }
}

impl Default for StaticCatalog {
    fn default() -> Self {
        Self::demo()
    }
}

#[async_trait]
impl CatalogClient for StaticCatalog {
    async fn connect(&self) -> Result<(), CatalogError> {
        Ok(())
    }

    async fn search(&self, query: &str) -> Result<Vec<Track>, CatalogError> {
        Ok(self
            .tracks
            .iter()
            .filter(|track| track.matches_query(query))
            .cloned()
            .collect())
    }

    async fn recommendations(&self) -> Result<Vec<Track>, CatalogError> {
        Ok(self.recommended.clone())
    }
}
