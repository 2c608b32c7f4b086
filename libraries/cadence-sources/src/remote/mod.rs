//! Remote streaming backend

mod catalog;
mod http;

pub use catalog::{CatalogClient, CatalogError, StaticCatalog};
pub use http::HttpCatalog;

#[cfg(test)]
pub use catalog::MockCatalogClient;

use crate::config::RemoteSourceConfig;
use crate::error::{Result, SourceError};
use crate::output::{MediaEvent, OutputProvider};
use crate::source::PlaybackSource;
use crate::transport::{Playhead, Transport};
use async_trait::async_trait;
use cadence_core::{SourceKind, Track};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

/// Streams tracks found in a remote catalog
pub struct RemoteSource {
    catalog: Arc<dyn CatalogClient>,
    transport: Transport,
    full_streams: bool,
}

impl RemoteSource {
    pub fn new(catalog: Arc<dyn CatalogClient>, provider: Arc<dyn OutputProvider>) -> Self {
        Self {
            catalog,
            transport: Transport::new(SourceKind::Remote, provider),
            full_streams: false,
        }
    }

    /// Prefer full-length URLs over previews
    pub fn with_full_streams(mut self, full_streams: bool) -> Self {
        self.full_streams = full_streams;
        self
    }

    /// Backend for `config`, falling back to the demo catalog without a server
    pub fn from_config(
        config: &RemoteSourceConfig,
        provider: Arc<dyn OutputProvider>,
    ) -> Result<Self> {
        let catalog: Arc<dyn CatalogClient> = match config.base_url.as_deref() {
            Some(base_url) => Arc::new(
                HttpCatalog::from_config(config, base_url)
                    .map_err(|e| SourceError::init(SourceKind::Remote, e.to_string()))?,
            ),
            None => {
                debug!("No catalog server configured, using demo catalog");
                Arc::new(StaticCatalog::demo())
            }
        };

        Ok(Self::new(catalog, provider).with_full_streams(config.full_streams))
    }

    fn retag(tracks: Vec<Track>) -> Vec<Track> {
        tracks
            .into_iter()
            .map(|track| track.with_source(SourceKind::Remote))
            .collect()
    }
}

#[async_trait]
impl PlaybackSource for RemoteSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Remote
    }

    async fn initialize(&self) -> Result<()> {
        if self.transport.is_initialized() {
            return Ok(());
        }

        self.catalog
            .connect()
            .await
            .map_err(|e| SourceError::init(SourceKind::Remote, e.to_string()))?;
        self.transport.initialize()?;
        info!("Remote source initialized");
        Ok(())
    }

    async fn play(&self, track: &Track) -> Result<()> {
        let url = track
            .playable_url(!self.full_streams)
            .ok_or_else(|| SourceError::NoPlayableSource {
                track_id: track.id.clone(),
            })?;

        debug!(track_id = %track.id, url, "Streaming remote track");
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
        match self.catalog.search(query).await {
            Ok(tracks) => Ok(Self::retag(tracks)),
            Err(e) => {
                warn!(query, error = %e, "Remote search failed");
                Err(SourceError::unavailable(SourceKind::Remote, e.to_string()))
            }
        }
    }

    async fn recommendations(&self) -> Result<Vec<Track>> {
        self.catalog
            .recommendations()
            .await
            .map(Self::retag)
            .map_err(|e| SourceError::unavailable(SourceKind::Remote, e.to_string()))
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
