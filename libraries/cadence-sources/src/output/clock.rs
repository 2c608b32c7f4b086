//! Clock-driven output handle
//!
//! The playhead advances with tokio time while playing. When it reaches the
//! loaded duration an `Ended` event is sent. Nothing is decoded; platform
//! crates provide device-backed handles through [`OutputProvider`].

use super::{MediaEvent, MediaOutput, MediaRequest, OutputError, OutputProvider};
use cadence_core::{clamp_volume, SourceKind, DEFAULT_VOLUME};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{Duration, Instant};
use tracing::debug;

/// Output handle whose playhead is a tokio clock
pub struct ClockOutput {
    kind: SourceKind,
    events: broadcast::Sender<MediaEvent>,
    media: Option<MediaRequest>,
    /// Position accumulated before the current run
    offset: f64,
    /// Start of the current run, `None` while paused
    started_at: Option<Instant>,
    end_timer: Option<JoinHandle<()>>,
    volume: f32,
}

impl ClockOutput {
    pub fn new(kind: SourceKind, events: broadcast::Sender<MediaEvent>) -> Self {
        Self {
            kind,
            events,
            media: None,
            offset: 0.0,
            started_at: None,
            end_timer: None,
            volume: DEFAULT_VOLUME,
        }
    }

    /// Current output volume
    pub fn volume(&self) -> f32 {
        self.volume
    }

    fn emit(&self, event: MediaEvent) {
        // No receivers is fine, the backend may not be listened to yet
        let _ = self.events.send(event);
    }

    fn cancel_timer(&mut self) {
        if let Some(timer) = self.end_timer.take() {
            timer.abort();
        }
    }

    fn raw_position(&self) -> f64 {
        let running = self
            .started_at
            .map_or(0.0, |start| start.elapsed().as_secs_f64());
        let position = self.offset + running;

        match self.duration() {
            Some(duration) => position.min(duration),
            None => position,
        }
    }

    /// Freeze the playhead at its current position
    fn halt(&mut self) {
        self.offset = self.raw_position();
        self.started_at = None;
        self.cancel_timer();
    }

    fn arm_end_timer(&mut self, remaining: f64) -> Result<(), OutputError> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| OutputError::Unavailable(e.to_string()))?;

        let events = self.events.clone();
        let kind = self.kind;
        self.cancel_timer();
        self.end_timer = Some(runtime.spawn(async move {
            tokio::time::sleep(Duration::from_secs_f64(remaining.max(0.0))).await;
            debug!(kind = %kind, "Media ended");
            let _ = events.send(MediaEvent::Ended);
        }));

        Ok(())
    }
}

impl MediaOutput for ClockOutput {
    fn load(&mut self, request: MediaRequest) {
        self.halt();
        self.offset = 0.0;

        debug!(kind = %self.kind, url = %request.url, "Loading media");
        let duration = request.duration;
        self.media = Some(request);

        if let Some(duration) = duration {
            self.emit(MediaEvent::LoadedMetadata { duration });
        }
    }

    fn loaded_url(&self) -> Option<&str> {
        self.media.as_ref().map(|m| m.url.as_str())
    }

    fn play(&mut self) -> Result<(), OutputError> {
        let media = self.media.as_ref().ok_or(OutputError::NoMedia)?;
        if media.url.is_empty() {
            return Err(OutputError::Rejected("empty media url".into()));
        }
        let duration = media
            .duration
            .ok_or_else(|| OutputError::Rejected(format!("unknown duration for {}", media.url)))?;

        if self.is_playing() {
            return Ok(());
        }

        self.halt();
        if self.offset >= duration {
            self.offset = 0.0;
        }

        self.arm_end_timer(duration - self.offset)?;
        self.started_at = Some(Instant::now());
        self.emit(MediaEvent::Playing);
        Ok(())
    }

    fn pause(&mut self) {
        if self.is_playing() {
            self.halt();
            self.emit(MediaEvent::Paused);
        }
    }

    fn is_playing(&self) -> bool {
        match (self.started_at, self.duration()) {
            (Some(_), Some(duration)) => self.raw_position() < duration,
            (Some(_), None) => true,
            (None, _) => false,
        }
    }

    fn set_position(&mut self, seconds: f64) {
        let duration = self.duration();
        let target = match duration {
            Some(duration) => seconds.clamp(0.0, duration),
            None => seconds.max(0.0),
        };

        let was_playing = self.is_playing();
        self.halt();
        self.offset = target;

        if was_playing {
            if let Some(duration) = duration {
                if self.arm_end_timer(duration - target).is_ok() {
                    self.started_at = Some(Instant::now());
                }
            }
        }
    }

    fn position(&self) -> f64 {
        self.raw_position()
    }

    fn duration(&self) -> Option<f64> {
        self.media.as_ref().and_then(|m| m.duration)
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = clamp_volume(volume);
    }

    fn release(&mut self) {
        self.halt();
        self.offset = 0.0;
        self.media = None;
    }
}

impl Drop for ClockOutput {
    fn drop(&mut self) {
        self.cancel_timer();
    }
}

/// Provider that opens [`ClockOutput`] handles
#[derive(Debug, Default, Clone, Copy)]
pub struct ClockOutputProvider;

impl OutputProvider for ClockOutputProvider {
    fn open(
        &self,
        kind: SourceKind,
        events: broadcast::Sender<MediaEvent>,
    ) -> Result<Box<dyn MediaOutput>, OutputError> {
        Ok(Box::new(ClockOutput::new(kind, events)))
    }
}
