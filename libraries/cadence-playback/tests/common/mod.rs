//! Shared helpers for player integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use cadence_core::{PlayerState, ProgressInfo, SourceKind, Track};
use cadence_playback::{PlaybackConfig, Player, PlayerObserver};
use cadence_sources::{MediaEvent, PlaybackSource, Playhead, Result, SourceError, SourceFactory};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::broadcast;

// ===== Fake backend =====

/// Backend that records every call and lets tests inject media events
pub struct FakeSource {
    kind: SourceKind,
    initialized: AtomicBool,
    pub inits: AtomicUsize,
    pub cleanups: AtomicUsize,
    pub pauses: AtomicUsize,
    pub resumes: AtomicUsize,
    pub stops: AtomicUsize,
    pub plays: Mutex<Vec<String>>,
    pub seeks: Mutex<Vec<f64>>,
    pub volumes: Mutex<Vec<f32>>,
    pub init_delay: Mutex<Duration>,
    pub fail_search: AtomicBool,
    pub fail_play: AtomicBool,
    pub fail_init: AtomicBool,
    pub playhead: Mutex<Option<Playhead>>,
    catalog: Vec<Track>,
    events: broadcast::Sender<MediaEvent>,
}

impl FakeSource {
    pub fn new(kind: SourceKind, catalog: Vec<Track>) -> Arc<Self> {
        let (events, _) = broadcast::channel(32);
        Arc::new(Self {
            kind,
            initialized: AtomicBool::new(false),
            inits: AtomicUsize::new(0),
            cleanups: AtomicUsize::new(0),
            pauses: AtomicUsize::new(0),
            resumes: AtomicUsize::new(0),
            stops: AtomicUsize::new(0),
            plays: Mutex::new(Vec::new()),
            seeks: Mutex::new(Vec::new()),
            volumes: Mutex::new(Vec::new()),
            init_delay: Mutex::new(Duration::ZERO),
            fail_search: AtomicBool::new(false),
            fail_play: AtomicBool::new(false),
            fail_init: AtomicBool::new(false),
            playhead: Mutex::new(None),
            catalog,
            events,
        })
    }

    /// Send a media event as if the output handle produced it
    pub fn emit(&self, event: MediaEvent) {
        let _ = self.events.send(event);
    }

    pub fn inits(&self) -> usize {
        self.inits.load(Ordering::SeqCst)
    }

    pub fn cleanups(&self) -> usize {
        self.cleanups.load(Ordering::SeqCst)
    }

    pub fn played(&self) -> Vec<String> {
        self.plays.lock().unwrap().clone()
    }

    pub fn set_playhead(&self, position: f64, duration: f64) {
        *self.playhead.lock().unwrap() = Some(Playhead {
            position,
            duration: Some(duration),
        });
    }

    fn check(&self) -> Result<()> {
        if self.initialized.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(SourceError::NotInitialized(self.kind))
        }
    }
}

#[async_trait]
impl PlaybackSource for FakeSource {
    fn kind(&self) -> SourceKind {
        self.kind
    }

    async fn initialize(&self) -> Result<()> {
        let delay = *self.init_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if self.fail_init.load(Ordering::SeqCst) {
            return Err(SourceError::init(self.kind, "output unavailable"));
        }
        if !self.initialized.swap(true, Ordering::SeqCst) {
            self.inits.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }

    async fn play(&self, track: &Track) -> Result<()> {
        self.check()?;
        if self.fail_play.load(Ordering::SeqCst) {
            return Err(SourceError::PlaybackStart("device busy".into()));
        }
        self.plays.lock().unwrap().push(track.id.clone());
        if track.duration_secs > 0.0 {
            self.emit(MediaEvent::LoadedMetadata {
                duration: track.duration_secs,
            });
        }
        self.emit(MediaEvent::Playing);
        Ok(())
    }

    async fn pause(&self) -> Result<()> {
        self.check()?;
        self.pauses.fetch_add(1, Ordering::SeqCst);
        self.emit(MediaEvent::Paused);
        Ok(())
    }

    async fn resume(&self) -> Result<()> {
        self.check()?;
        self.resumes.fetch_add(1, Ordering::SeqCst);
        self.emit(MediaEvent::Playing);
        Ok(())
    }

    async fn stop(&self) -> Result<()> {
        self.check()?;
        self.stops.fetch_add(1, Ordering::SeqCst);
        self.emit(MediaEvent::Paused);
        Ok(())
    }

    async fn seek(&self, seconds: f64) -> Result<()> {
        self.check()?;
        self.seeks.lock().unwrap().push(seconds);
        Ok(())
    }

    async fn set_volume(&self, volume: f32) -> Result<()> {
        self.check()?;
        self.volumes.lock().unwrap().push(volume);
        Ok(())
    }

    async fn search(&self, query: &str) -> Result<Vec<Track>> {
        if self.fail_search.load(Ordering::SeqCst) {
            return Err(SourceError::unavailable(self.kind, "catalog offline"));
        }
        Ok(self
            .catalog
            .iter()
            .filter(|t| t.matches_query(query))
            .cloned()
            .collect())
    }

    async fn recommendations(&self) -> Result<Vec<Track>> {
        if self.fail_search.load(Ordering::SeqCst) {
            return Err(SourceError::unavailable(self.kind, "catalog offline"));
        }
        Ok(self.catalog.clone())
    }

    async fn cleanup(&self) -> Result<()> {
        if self.initialized.swap(false, Ordering::SeqCst) {
            self.cleanups.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }

    fn events(&self) -> Result<broadcast::Receiver<MediaEvent>> {
        Ok(self.events.subscribe())
    }

    fn playhead(&self) -> Option<Playhead> {
        if self.initialized.load(Ordering::SeqCst) {
            *self.playhead.lock().unwrap()
        } else {
            None
        }
    }
}

// ===== Recorder =====

/// Observer that keeps everything it receives
#[derive(Default)]
pub struct Recorder {
    pub states: Mutex<Vec<PlayerState>>,
    pub progress: Mutex<Vec<ProgressInfo>>,
    pub errors: Mutex<Vec<String>>,
}

impl Recorder {
    pub fn state_count(&self) -> usize {
        self.states.lock().unwrap().len()
    }

    pub fn last_state(&self) -> Option<PlayerState> {
        self.states.lock().unwrap().last().cloned()
    }

    pub fn progress_count(&self) -> usize {
        self.progress.lock().unwrap().len()
    }

    pub fn last_progress(&self) -> Option<ProgressInfo> {
        self.progress.lock().unwrap().last().copied()
    }

    pub fn errors(&self) -> Vec<String> {
        self.errors.lock().unwrap().clone()
    }
}

impl PlayerObserver for Recorder {
    fn on_state_change(&self, state: &PlayerState) {
        self.states.lock().unwrap().push(state.clone());
    }

    fn on_progress(&self, progress: &ProgressInfo) {
        self.progress.lock().unwrap().push(*progress);
    }

    fn on_error(&self, message: &str) {
        self.errors.lock().unwrap().push(message.to_string());
    }
}

// ===== Harness =====

pub fn local_track(id: &str) -> Track {
    Track::new(id, format!("Local {id}"), "Indie Artist", "Demo Album", 180.0, SourceKind::Local)
        .with_url(format!("file:///music/{id}.mp3"))
}

pub fn remote_track(id: &str) -> Track {
    Track::new(id, format!("Remote {id}"), "The Weeknd", "After Hours", 200.0, SourceKind::Remote)
        .with_preview(format!("https://previews.example.com/{id}.mp3"))
}

pub struct Harness {
    pub player: Player,
    pub local: Arc<FakeSource>,
    pub remote: Arc<FakeSource>,
    pub recorder: Arc<Recorder>,
}

pub fn harness() -> Harness {
    let local = FakeSource::new(SourceKind::Local, vec![local_track("l1"), local_track("l2")]);
    let remote = FakeSource::new(SourceKind::Remote, vec![remote_track("r1")]);

    let factory = {
        let local = Arc::clone(&local);
        let remote = Arc::clone(&remote);
        SourceFactory::builder()
            .register(SourceKind::Local, move || {
                let source: Arc<dyn PlaybackSource> = local.clone();
                Ok(source)
            })
            .register(SourceKind::Remote, move || {
                let source: Arc<dyn PlaybackSource> = remote.clone();
                Ok(source)
            })
            .build()
    };

    let player = Player::builder(factory)
        .config(PlaybackConfig::default())
        .seed(7)
        .build()
        .unwrap();

    let recorder = Arc::new(Recorder::default());
    player.subscribe(recorder.clone());

    Harness {
        player,
        local,
        remote,
        recorder,
    }
}

/// Let spawned listener tasks drain their events
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(5)).await;
}
