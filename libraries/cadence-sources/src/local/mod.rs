//! Local file backend

mod library;

pub use library::{read_track, scan_directory, LocalLibrary};

use crate::config::LocalSourceConfig;
use crate::error::{Result, SourceError};
use crate::output::{MediaEvent, OutputProvider};
use crate::source::PlaybackSource;
use crate::transport::{Playhead, Transport};
use async_trait::async_trait;
use cadence_core::{SourceKind, Track};
use std::sync::Arc;
use tokio::sync::{broadcast, OnceCell};
use tracing::{debug, info, warn};

/// Plays files from the local library
pub struct LocalSource {
    config: LocalSourceConfig,
    transport: Transport,
    library: OnceCell<Arc<LocalLibrary>>,
}

impl LocalSource {
    pub fn new(config: LocalSourceConfig, provider: Arc<dyn OutputProvider>) -> Self {
        Self {
            config,
            transport: Transport::new(SourceKind::Local, provider),
            library: OnceCell::new(),
        }
    }

    /// Backend over an already built library
    pub fn with_library(library: LocalLibrary, provider: Arc<dyn OutputProvider>) -> Self {
        let source = Self::new(LocalSourceConfig::default(), provider);
        // A fresh cell cannot be full yet
        let _ = source.library.set(Arc::new(library));
        source
    }

    /// The library, scanning configured directories on first use
    pub async fn library(&self) -> Arc<LocalLibrary> {
        self.library
            .get_or_init(|| async {
                let config = self.config.clone();
                let library = tokio::task::spawn_blocking(move || LocalLibrary::from_config(&config))
                    .await
                    .unwrap_or_else(|e| {
                        warn!(error = %e, "Library scan task failed");
                        LocalLibrary::new(self.config.tracks.clone())
                    });
                info!(tracks = library.len(), "Local library ready");
                Arc::new(library)
            })
            .await
            .clone()
    }
}

#[async_trait]
impl PlaybackSource for LocalSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Local
    }

    async fn initialize(&self) -> Result<()> {
        self.transport.initialize()
    }

    async fn play(&self, track: &Track) -> Result<()> {
        let url = track
            .playable_url(false)
            .ok_or_else(|| SourceError::NoPlayableSource {
                track_id: track.id.clone(),
            })?;

        debug!(track_id = %track.id, url, "Playing local track");
        self.transport.play(url, Some(track.duration_secs))
    }

    async fn pause(&self) -> Result<()> {
        self.transport.pause()
    }

    async fn resume(&self) -> Result<()> {
        self.transport.resume()
    }

    async fn stop(&self) -> Result<()> {
        self.transport.stop()
    }

    async fn seek(&self, seconds: f64) -> Result<()> {
        self.transport.seek(seconds)
    }

    async fn set_volume(&self, volume: f32) -> Result<()> {
        self.transport.set_volume(volume)
    }

    async fn search(&self, query: &str) -> Result<Vec<Track>> {
        Ok(self.library().await.search(query))
    }

    async fn recommendations(&self) -> Result<Vec<Track>> {
        Ok(self
            .library()
            .await
            .recommendations(self.config.recommendation_limit))
    }

    async fn cleanup(&self) -> Result<()> {
        self.transport.cleanup();
        Ok(())
    }

    fn events(&self) -> Result<broadcast::Receiver<MediaEvent>> {
        self.transport.events()
    }

    fn playhead(&self) -> Option<Playhead> {
        self.transport.playhead()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::ClockOutputProvider;

    fn source() -> LocalSource {
        let library = LocalLibrary::new(vec![
            Track::new("l1", "Night Drive", "Indie Artist", "Demo", 185.0, SourceKind::Local)
                .with_url("file:///music/night-drive.mp3"),
            Track::new("l2", "No Url", "Indie Artist", "Demo", 90.0, SourceKind::Local),
            Track::new("l3", "Preview Only", "Other", "Demo", 30.0, SourceKind::Local)
                .with_preview("file:///music/preview.mp3"),
        ]);
        LocalSource::with_library(library, Arc::new(ClockOutputProvider))
    }

    #[tokio::test(start_paused = true)]
    async fn play_requires_initialize() {
        let source = source();
        let track = source.library().await.tracks()[0].clone();
        assert_eq!(
            source.play(&track).await,
            Err(SourceError::NotInitialized(SourceKind::Local))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn track_without_urls_is_not_playable() {
        let source = source();
        source.initialize().await.unwrap();
        let track = source.library().await.tracks()[1].clone();
        assert_eq!(
            source.play(&track).await,
            Err(SourceError::NoPlayableSource {
                track_id: "l2".to_string()
            })
        );
    }

    #[tokio::test(start_paused = true)]
    async fn preview_is_used_as_fallback() {
        let source = source();
        source.initialize().await.unwrap();
        let track = source.library().await.tracks()[2].clone();
        source.play(&track).await.unwrap();
        assert_eq!(source.playhead().unwrap().duration, Some(30.0));
    }

    #[tokio::test(start_paused = true)]
    async fn search_and_recommendations_are_local() {
        let source = source();
        let hits = source.search("indie").await.unwrap();
        assert_eq!(hits.len(), 2);
        assert!(hits.iter().all(|t| t.source == SourceKind::Local));
        assert_eq!(source.recommendations().await.unwrap().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn cleanup_then_reinitialize() {
        let source = source();
        source.initialize().await.unwrap();
        source.cleanup().await.unwrap();
        assert!(source.playhead().is_none());
        assert!(source.pause().await.is_err());

        source.initialize().await.unwrap();
        assert!(source.pause().await.is_ok());
    }
}
