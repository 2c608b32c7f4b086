//! Media output handles
//!
//! A backend owns exactly one output handle while initialized. The handle
//! loads a media URL, runs the playhead, and reports what happened through
//! [`MediaEvent`]s on a broadcast channel handed to it when it was opened.

mod clock;

pub use clock::{ClockOutput, ClockOutputProvider};

use cadence_core::SourceKind;
use thiserror::Error;
use tokio::sync::broadcast;

/// Events emitted by an output handle
#[derive(Debug, Clone, PartialEq)]
pub enum MediaEvent {
    /// Media metadata is known
    LoadedMetadata { duration: f64 },

    /// Playback started or resumed
    Playing,

    /// Playback paused
    Paused,

    /// The playhead reached the end of the media
    Ended,

    /// The handle failed while loading or playing
    Error(String),
}

/// What to load into a handle
#[derive(Debug, Clone, PartialEq)]
pub struct MediaRequest {
    pub url: String,

    /// Length in seconds, when the caller already knows it
    pub duration: Option<f64>,
}

impl MediaRequest {
    pub fn new(url: impl Into<String>, duration: Option<f64>) -> Self {
        Self {
            url: url.into(),
            duration: duration.filter(|d| d.is_finite() && *d > 0.0),
        }
    }
}

/// Output handle errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OutputError {
    /// The handle could not be opened
    #[error("Output unavailable: {0}")]
    Unavailable(String),

    /// `play` was called with nothing loaded
    #[error("No media loaded")]
    NoMedia,

    /// The loaded media cannot be played
    #[error("Playback rejected: {0}")]
    Rejected(String),
}

/// A single media output owned by one backend
pub trait MediaOutput: Send {
    /// Load a new media request, discarding the current one
    fn load(&mut self, request: MediaRequest);

    /// URL of the loaded media
    fn loaded_url(&self) -> Option<&str>;

    /// Start or resume playback
    fn play(&mut self) -> Result<(), OutputError>;

    fn pause(&mut self);

    fn is_playing(&self) -> bool;

    /// Move the playhead (seconds)
    fn set_position(&mut self, seconds: f64);

    /// Playhead position in seconds
    fn position(&self) -> f64;

    /// Length of the loaded media, once known
    fn duration(&self) -> Option<f64>;

    fn set_volume(&mut self, volume: f32);

    /// Stop everything and drop the loaded media
    fn release(&mut self);
}

/// Opens output handles for backends
pub trait OutputProvider: Send + Sync {
    /// Open a handle for `kind` that reports on `events`
    fn open(
        &self,
        kind: SourceKind,
        events: broadcast::Sender<MediaEvent>,
    ) -> Result<Box<dyn MediaOutput>, OutputError>;
}
