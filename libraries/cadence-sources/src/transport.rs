//! Shared transport for source backends
//!
//! Both backends play through one output handle and differ only in how they
//! find tracks. `Transport` holds that handle and implements the transport
//! half of [`PlaybackSource`](crate::PlaybackSource) once.

use crate::error::{Result, SourceError};
use crate::output::{MediaEvent, MediaOutput, MediaRequest, OutputProvider};
use cadence_core::SourceKind;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::broadcast;
use tracing::{debug, info};

/// Capacity of each backend's media event channel
pub const EVENT_CAPACITY: usize = 64;

/// Live playhead readout
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Playhead {
    /// Seconds from the start of the media
    pub position: f64,

    /// Media length, once known
    pub duration: Option<f64>,
}

struct OpenOutput {
    output: Box<dyn MediaOutput>,
    events: broadcast::Sender<MediaEvent>,
}

/// Output handle lifecycle plus transport commands
pub struct Transport {
    kind: SourceKind,
    provider: Arc<dyn OutputProvider>,
    slot: Mutex<Option<OpenOutput>>,
}

impl Transport {
    pub fn new(kind: SourceKind, provider: Arc<dyn OutputProvider>) -> Self {
        Self {
            kind,
            provider,
            slot: Mutex::new(None),
        }
    }

    pub fn kind(&self) -> SourceKind {
        self.kind
    }

    fn slot(&self) -> MutexGuard<'_, Option<OpenOutput>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn with_output<T>(&self, f: impl FnOnce(&mut dyn MediaOutput) -> T) -> Result<T> {
        let mut slot = self.slot();
        let open = slot.as_mut().ok_or(SourceError::NotInitialized(self.kind))?;
        Ok(f(open.output.as_mut()))
    }

    pub fn is_initialized(&self) -> bool {
        self.slot().is_some()
    }

    /// Open the output handle if it is not open yet
    pub fn initialize(&self) -> Result<()> {
        let mut slot = self.slot();
        if slot.is_some() {
            return Ok(());
        }

        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let output = self
            .provider
            .open(self.kind, events.clone())
            .map_err(|e| SourceError::init(self.kind, e.to_string()))?;

        *slot = Some(OpenOutput { output, events });
        info!(kind = %self.kind, "Output handle opened");
        Ok(())
    }

    /// Load `url` unless it is already loaded, then start playback
    pub fn play(&self, url: &str, duration: Option<f64>) -> Result<()> {
        self.with_output(|output| {
            if output.loaded_url() != Some(url) {
                output.load(MediaRequest::new(url, duration));
            } else {
                debug!(kind = %self.kind, url, "Media already loaded");
            }
            output
                .play()
                .map_err(|e| SourceError::PlaybackStart(e.to_string()))
        })?
    }

    pub fn pause(&self) -> Result<()> {
        self.with_output(|output| output.pause())
    }

    pub fn resume(&self) -> Result<()> {
        self.with_output(|output| output.play())?
            .map_err(|e| SourceError::PlaybackStart(e.to_string()))
    }

    /// Pause and rewind to the start
    pub fn stop(&self) -> Result<()> {
        self.with_output(|output| {
            output.pause();
            output.set_position(0.0);
        })
    }

    pub fn seek(&self, seconds: f64) -> Result<()> {
        self.with_output(|output| output.set_position(seconds))
    }

    pub fn set_volume(&self, volume: f32) -> Result<()> {
        self.with_output(|output| output.set_volume(volume))
    }

    /// Subscribe to the handle's media events
    pub fn events(&self) -> Result<broadcast::Receiver<MediaEvent>> {
        let slot = self.slot();
        let open = slot.as_ref().ok_or(SourceError::NotInitialized(self.kind))?;
        Ok(open.events.subscribe())
    }

    /// URL currently loaded into the handle
    pub fn loaded_url(&self) -> Option<String> {
        self.slot()
            .as_ref()
            .and_then(|open| open.output.loaded_url().map(str::to_string))
    }

    pub fn playhead(&self) -> Option<Playhead> {
        self.slot().as_ref().map(|open| Playhead {
            position: open.output.position(),
            duration: open.output.duration(),
        })
    }

    /// Release the handle; receivers see the channel close
    pub fn cleanup(&self) {
        if let Some(mut open) = self.slot().take() {
            open.output.release();
            info!(kind = %self.kind, "Output handle released");
        }
    }
}
