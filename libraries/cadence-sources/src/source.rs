//! Playback source contract

use crate::error::Result;
use crate::output::MediaEvent;
use crate::transport::Playhead;
use async_trait::async_trait;
use cadence_core::{SourceKind, Track};
use tokio::sync::broadcast;

/// A playback backend
///
/// Each implementation owns one media output handle between `initialize` and
/// `cleanup`. Transport commands issued outside that window fail with
/// [`SourceError::NotInitialized`](crate::SourceError::NotInitialized).
///
/// Implementations must be thread-safe (`Send + Sync`); the orchestrator
/// shares them across tasks behind an `Arc`.
#[async_trait]
pub trait PlaybackSource: Send + Sync {
    /// Kind tag, fixed for the lifetime of the backend
    fn kind(&self) -> SourceKind;

    /// Acquire the output handle (idempotent)
    async fn initialize(&self) -> Result<()>;

    /// Load and start a track
    async fn play(&self, track: &Track) -> Result<()>;

    async fn pause(&self) -> Result<()>;

    async fn resume(&self) -> Result<()>;

    /// Pause and rewind to the start
    async fn stop(&self) -> Result<()>;

    /// Move the playhead; range checks are the caller's job
    async fn seek(&self, seconds: f64) -> Result<()>;

    /// Forward an already clamped volume
    async fn set_volume(&self, volume: f32) -> Result<()>;

    /// Tracks matching `query`, tagged with this backend's kind
    async fn search(&self, query: &str) -> Result<Vec<Track>>;

    async fn recommendations(&self) -> Result<Vec<Track>>;

    /// Release the output handle (idempotent)
    async fn cleanup(&self) -> Result<()>;

    /// Subscribe to media events from the output handle
    fn events(&self) -> Result<broadcast::Receiver<MediaEvent>>;

    /// Current playhead, `None` while uninitialized
    fn playhead(&self) -> Option<Playhead>;
}
