//! Playback orchestrator
//!
//! `Player` coordinates interchangeable backends behind one transport and
//! queue API. Canonical state lives in a single mutex; no lock is held across
//! an `.await` or a subscriber callback.
//!
//! Lock order: `active` before `state`. `rng` is only taken under `state`.

use crate::advance::{next_index, Direction};
use crate::config::{CadenceConfig, PlaybackConfig};
use crate::error::{PlayerError, Result};
use crate::notify::{Notifier, PlayerObserver, SubscriptionId};
use crate::sampler;
use cadence_core::{PlaybackState, PlayerState, ProgressInfo, RepeatMode, SourceKind, Track};
use cadence_sources::{
    ClockOutputProvider, MediaEvent, OutputProvider, PlaybackSource, SourceError, SourceFactory,
};
use futures_util::future::join_all;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// The backend currently driving playback
struct ActiveSource {
    kind: SourceKind,
    source: Arc<dyn PlaybackSource>,
    generation: u64,
    listener: Option<JoinHandle<()>>,
}

impl ActiveSource {
    fn detach(&mut self) {
        if let Some(listener) = self.listener.take() {
            listener.abort();
        }
    }
}

pub(crate) struct Shared {
    config: PlaybackConfig,
    factory: SourceFactory,
    state: Mutex<PlayerState>,
    active: Mutex<Option<ActiveSource>>,
    /// Serializes backend switches and `play`
    switch_lock: tokio::sync::Mutex<()>,
    /// Newest `play_song` ticket
    play_ticket: AtomicU64,
    /// Generation of the newest backend, for stale event rejection
    generation: AtomicU64,
    notifier: Notifier,
    rng: Mutex<StdRng>,
    sampler: Mutex<Option<JoinHandle<()>>>,
}

impl Drop for Shared {
    fn drop(&mut self) {
        if let Some(sampler) = lock(&self.sampler).take() {
            sampler.abort();
        }
        if let Some(active) = lock(&self.active).as_mut() {
            active.detach();
        }
    }
}

enum Query<'a> {
    Search(&'a str),
    Recommendations,
}

/// Builder for [`Player`]
pub struct PlayerBuilder {
    config: PlaybackConfig,
    factory: SourceFactory,
    seed: Option<u64>,
}

impl PlayerBuilder {
    pub fn new(factory: SourceFactory) -> Self {
        Self {
            config: PlaybackConfig::default(),
            factory,
            seed: None,
        }
    }

    pub fn config(mut self, config: PlaybackConfig) -> Self {
        self.config = config;
        self
    }

    /// Seed the shuffle RNG for reproducible order
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Build the player and start its progress sampler
    ///
    /// Must be called from within a tokio runtime.
    pub fn build(self) -> Result<Player> {
        if self.config.progress_interval_ms == 0 {
            return Err(PlayerError::Config(
                "progress_interval_ms must be greater than 0".to_string(),
            ));
        }
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| PlayerError::Runtime(e.to_string()))?;

        let rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let shared = Arc::new(Shared {
            state: Mutex::new(PlayerState::new(self.config.initial_volume)),
            config: self.config,
            factory: self.factory,
            active: Mutex::new(None),
            switch_lock: tokio::sync::Mutex::new(()),
            play_ticket: AtomicU64::new(0),
            generation: AtomicU64::new(0),
            notifier: Notifier::new(),
            rng: Mutex::new(rng),
            sampler: Mutex::new(None),
        });

        let period = shared.config.progress_interval();
        let handle = runtime.spawn(sampler::run(Arc::downgrade(&shared), period));
        *lock(&shared.sampler) = Some(handle);

        info!(
            volume = shared.config.initial_volume,
            sources = ?shared.factory.available_kinds(),
            "Player ready"
        );
        Ok(Player { shared })
    }
}

/// Multi-source playback orchestrator
///
/// Cheap to clone; every clone drives the same player. Dropping the last
/// clone stops the progress sampler and event listener. Use
/// [`Player::shutdown`] to also release backend resources.
///
/// Transport failures are reported on the error channel, never returned.
#[derive(Clone)]
pub struct Player {
    shared: Arc<Shared>,
}

impl Player {
    pub fn builder(factory: SourceFactory) -> PlayerBuilder {
        PlayerBuilder::new(factory)
    }

    /// Player with the configured backends on clock-driven outputs
    pub fn from_config(config: &CadenceConfig) -> Result<Self> {
        Self::with_output(config, Arc::new(ClockOutputProvider))
    }

    /// Player with the configured backends on `provider`'s outputs
    pub fn with_output(config: &CadenceConfig, provider: Arc<dyn OutputProvider>) -> Result<Self> {
        config.validate()?;
        let factory = SourceFactory::from_config(&config.sources, provider);
        Self::builder(factory).config(config.playback.clone()).build()
    }

    pub(crate) fn from_shared(shared: Arc<Shared>) -> Self {
        Self { shared }
    }

    // ===== Snapshots =====

    /// Copy of the current state
    pub fn state(&self) -> PlayerState {
        lock(&self.shared.state).clone()
    }

    pub fn progress(&self) -> ProgressInfo {
        lock(&self.shared.state).progress()
    }

    pub fn is_playing(&self) -> bool {
        lock(&self.shared.state).is_playing()
    }

    pub fn current_track(&self) -> Option<Track> {
        lock(&self.shared.state).current_track().cloned()
    }

    /// Kind of the backend currently driving playback
    pub fn active_kind(&self) -> Option<SourceKind> {
        lock(&self.shared.active).as_ref().map(|active| active.kind)
    }

    pub fn config(&self) -> &PlaybackConfig {
        &self.shared.config
    }

    pub fn factory(&self) -> &SourceFactory {
        &self.shared.factory
    }

    // ===== Subscribers =====

    /// Register an observer and deliver the current state to it
    ///
    /// Subscribing the same `Arc` twice returns the original id and sends
    /// nothing.
    pub fn subscribe(&self, observer: Arc<dyn PlayerObserver>) -> SubscriptionId {
        let (id, fresh) = self.shared.notifier.subscribe(Arc::clone(&observer));
        if fresh {
            let snapshot = self.state();
            observer.on_state_change(&snapshot);
        }
        id
    }

    /// Listen to state changes only
    pub fn on_state_change<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&PlayerState) + Send + Sync + 'static,
    {
        self.shared.notifier.on_state_change(listener)
    }

    /// Listen to progress updates only
    pub fn on_progress<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&ProgressInfo) + Send + Sync + 'static,
    {
        self.shared.notifier.on_progress(listener)
    }

    /// Listen to error notices only
    pub fn on_error<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.shared.notifier.on_error(listener)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.shared.notifier.unsubscribe(id)
    }

    // ===== Internals =====

    /// Mutate state, then notify state subscribers with the result
    fn update<R>(&self, f: impl FnOnce(&mut PlayerState) -> R) -> R {
        let (result, snapshot) = {
            let mut state = lock(&self.shared.state);
            let result = f(&mut state);
            (result, state.clone())
        };
        self.shared.notifier.emit_state(&snapshot);
        result
    }

    fn notify_error(&self, message: &str) {
        warn!(error = message, "Playback error");
        self.shared.notifier.emit_error(message);
    }

    fn active_source(&self) -> Option<Arc<dyn PlaybackSource>> {
        lock(&self.shared.active)
            .as_ref()
            .map(|active| Arc::clone(&active.source))
    }

    fn is_superseded(&self, ticket: u64) -> bool {
        self.shared.play_ticket.load(Ordering::SeqCst) != ticket
    }

    /// Make the backend for `kind` active, switching only when it differs
    ///
    /// The flag is true when an already active backend was kept.
    async fn ensure_backend(
        &self,
        kind: SourceKind,
    ) -> std::result::Result<(Arc<dyn PlaybackSource>, bool), SourceError> {
        let previous = {
            let mut active = lock(&self.shared.active);
            if let Some(current) = active.as_ref().filter(|a| a.kind == kind) {
                return Ok((Arc::clone(&current.source), true));
            }
            let mut previous = active.take();
            if let Some(previous) = previous.as_mut() {
                previous.detach();
            }
            previous
        };

        if let Some(previous) = previous {
            info!(from = %previous.kind, to = %kind, "Switching source backend");
            if let Err(e) = previous.source.cleanup().await {
                warn!(kind = %previous.kind, error = %e, "Backend cleanup failed");
            }
        }

        let source = self.shared.factory.create_source(kind)?;
        source.initialize().await?;

        let volume = lock(&self.shared.state).volume();
        if let Err(e) = source.set_volume(volume).await {
            warn!(kind = %kind, error = %e, "Failed to apply volume to new backend");
        }

        let generation = self.shared.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let listener = match source.events() {
            Ok(events) => Some(tokio::spawn(listen(
                Arc::downgrade(&self.shared),
                generation,
                events,
            ))),
            Err(e) => {
                debug!(kind = %kind, error = %e, "Backend has no event stream");
                None
            }
        };

        *lock(&self.shared.active) = Some(ActiveSource {
            kind,
            source: Arc::clone(&source),
            generation,
            listener,
        });
        Ok((source, false))
    }

    // ===== Transport =====

    /// Load and play `track`, optionally selecting queue position `index`
    ///
    /// The state goes to `Loading` before any I/O. Overlapping calls are
    /// resolved last-write-wins: a call still waiting for an earlier switch
    /// to finish is dropped once a newer call arrives. Failures are reported
    /// on the error channel. When the backend that was already playing is
    /// kept, a failure puts back the previous track and playback state;
    /// otherwise the player ends `Stopped`.
    pub async fn play_song(&self, track: Track, index: Option<usize>) {
        let ticket = self.shared.play_ticket.fetch_add(1, Ordering::SeqCst) + 1;
        let previous = self.update(|state| {
            let previous = state.playback_state();
            state.set_playback(PlaybackState::Loading);
            previous
        });

        let _switch = self.shared.switch_lock.lock().await;
        if self.is_superseded(ticket) {
            debug!(track_id = %track.id, "Play request superseded");
            return;
        }

        debug!(track_id = %track.id, source = %track.source, ?index, "Playing track");
        let mut undo = None;
        let outcome = match self.ensure_backend(track.source).await {
            Ok((source, kept)) => {
                {
                    let mut state = lock(&self.shared.state);
                    if kept {
                        undo = Some(state.loaded());
                    }
                    state.load_track(track.clone(), index);
                }
                source.play(&track).await
            }
            Err(e) => Err(e),
        };

        match outcome {
            Ok(()) => {
                if !self.is_superseded(ticket) {
                    self.update(|state| state.set_playback(PlaybackState::Playing));
                }
            }
            Err(e) => {
                self.notify_error(&format!("Failed to play song: {e}"));
                if !self.is_superseded(ticket) {
                    self.update(|state| {
                        if state.playback_state() != PlaybackState::Loading {
                            return;
                        }
                        match undo {
                            Some(loaded) if previous != PlaybackState::Loading => {
                                state.restore_loaded(loaded);
                                state.set_playback(previous);
                            }
                            _ => state.set_playback(PlaybackState::Stopped),
                        }
                    });
                }
            }
        }
    }

    /// Pause, if playing
    pub async fn pause(&self) {
        if !self.is_playing() {
            return;
        }
        let Some(source) = self.active_source() else {
            return;
        };

        match source.pause().await {
            Ok(()) => self.update(|state| {
                if state.playback_state() == PlaybackState::Playing {
                    state.set_playback(PlaybackState::Paused);
                }
            }),
            Err(e) => self.notify_error(&format!("Failed to pause: {e}")),
        }
    }

    /// Resume, if not playing
    pub async fn resume(&self) {
        if self.is_playing() {
            return;
        }
        let Some(source) = self.active_source() else {
            return;
        };

        match source.resume().await {
            Ok(()) => self.update(|state| state.set_playback(PlaybackState::Playing)),
            Err(e) => self.notify_error(&format!("Failed to resume: {e}")),
        }
    }

    /// Stop and rewind; the state is `Stopped` even if the backend fails
    pub async fn stop(&self) {
        if let Some(source) = self.active_source() {
            if let Err(e) = source.stop().await {
                self.notify_error(&format!("Failed to stop: {e}"));
            }
        }

        self.update(|state| {
            state.set_playback(PlaybackState::Stopped);
            state.set_current_time(0.0);
        });
    }

    /// Move the playhead and publish progress right away
    ///
    /// `seconds` is clamped to the known duration.
    pub async fn seek(&self, seconds: f64) {
        let Some(source) = self.active_source() else {
            debug!("Seek ignored, no active backend");
            return;
        };

        let target = {
            let duration = lock(&self.shared.state).duration();
            let seconds = if seconds.is_finite() { seconds } else { 0.0 };
            if duration > 0.0 {
                seconds.clamp(0.0, duration)
            } else {
                seconds.max(0.0)
            }
        };

        if let Err(e) = source.seek(target).await {
            self.notify_error(&format!("Failed to seek: {e}"));
            return;
        }

        let progress = {
            let mut state = lock(&self.shared.state);
            state.set_current_time(target);
            state.progress()
        };
        self.shared.notifier.emit_progress(&progress);
    }

    /// Clamp and store the volume, forwarding it to the active backend
    pub async fn set_volume(&self, volume: f32) {
        let stored = lock(&self.shared.state).set_volume(volume);

        if let Some(source) = self.active_source() {
            if let Err(e) = source.set_volume(stored).await {
                self.notify_error(&format!("Failed to set volume: {e}"));
            }
        }

        let snapshot = self.state();
        self.shared.notifier.emit_state(&snapshot);
    }

    // ===== Queue =====

    pub fn set_queue(&self, tracks: Vec<Track>) {
        self.update(|state| state.replace_queue(tracks));
    }

    pub fn add_to_queue(&self, track: Track) {
        self.update(|state| state.push_track(track));
    }

    /// Remove the entry at `index`; out-of-range indexes are ignored
    pub fn remove_from_queue(&self, index: usize) -> Option<Track> {
        let (removed, snapshot) = {
            let mut state = lock(&self.shared.state);
            let removed = state.remove_track(index)?;
            (removed, state.clone())
        };
        self.shared.notifier.emit_state(&snapshot);
        Some(removed)
    }

    pub fn toggle_shuffle(&self) -> bool {
        self.update(PlayerState::toggle_shuffle)
    }

    pub fn cycle_repeat(&self) -> RepeatMode {
        self.update(PlayerState::cycle_repeat)
    }

    /// Queue entry the advance algorithm picks in `direction`
    fn pick(&self, direction: Direction) -> Option<(usize, Track)> {
        let state = lock(&self.shared.state);
        let mut rng = lock(&self.shared.rng);
        let index = next_index(
            state.queue().len(),
            state.current_index(),
            state.shuffle(),
            state.repeat(),
            direction,
            &mut *rng,
        )?;
        state.track_at(index).cloned().map(|track| (index, track))
    }

    async fn advance(&self, direction: Direction) -> bool {
        match self.pick(direction) {
            Some((index, track)) => {
                self.play_song(track, Some(index)).await;
                true
            }
            None => false,
        }
    }

    pub async fn play_next(&self) {
        if !self.advance(Direction::Forward).await {
            debug!("No next track");
        }
    }

    pub async fn play_previous(&self) {
        if !self.advance(Direction::Backward).await {
            debug!("No previous track");
        }
    }

    /// Advance after `ended` finished, stopping at the end of the queue
    ///
    /// Does nothing if the player was stopped, paused or given another track
    /// since the end was reported.
    pub(crate) async fn handle_track_end(&self, ticket: u64, ended: &str) {
        let still_current = !self.is_superseded(ticket) && {
            let state = lock(&self.shared.state);
            state.playback_state() == PlaybackState::Playing
                && state.current_track().is_some_and(|track| track.id == ended)
        };
        if !still_current {
            debug!(track_id = ended, "Track end overtaken, not advancing");
            return;
        }

        if !self.advance(Direction::Forward).await {
            info!("Queue finished");
            self.update(|state| state.set_playback(PlaybackState::Stopped));
        }
    }

    // ===== Catalog =====

    async fn query_kind(
        &self,
        kind: SourceKind,
        query: &Query<'_>,
    ) -> std::result::Result<Vec<Track>, SourceError> {
        let source = self.shared.factory.create_source(kind)?;
        source.initialize().await?;
        match query {
            Query::Search(text) => source.search(text).await,
            Query::Recommendations => source.recommendations().await,
        }
    }

    async fn fan_out(&self, query: Query<'_>) -> Result<Vec<Track>> {
        let kinds = self.shared.factory.available_kinds();
        if kinds.is_empty() {
            return Ok(Vec::new());
        }

        let results = join_all(kinds.iter().map(|kind| self.query_kind(*kind, &query))).await;

        let mut tracks = Vec::new();
        let mut failed = 0;
        for (kind, result) in kinds.iter().zip(results) {
            match result {
                Ok(found) => tracks.extend(found),
                Err(e) => {
                    warn!(kind = %kind, error = %e, "Source query failed, skipping");
                    failed += 1;
                }
            }
        }

        if failed == kinds.len() {
            return Err(PlayerError::AllSourcesFailed { attempted: kinds });
        }
        Ok(tracks)
    }

    /// Search every backend, concatenating results in kind order
    pub async fn search(&self, query: &str) -> Result<Vec<Track>> {
        self.fan_out(Query::Search(query)).await
    }

    /// Search one backend, propagating its failure
    pub async fn search_source(&self, kind: SourceKind, query: &str) -> Result<Vec<Track>> {
        Ok(self.query_kind(kind, &Query::Search(query)).await?)
    }

    /// Recommendations from every backend, in kind order
    pub async fn recommendations(&self) -> Result<Vec<Track>> {
        self.fan_out(Query::Recommendations).await
    }

    // ===== Teardown =====

    /// Stop the sampler, release every backend and drop all subscribers
    pub async fn shutdown(&self) -> Result<()> {
        if let Some(sampler) = lock(&self.shared.sampler).take() {
            sampler.abort();
        }

        let _switch = self.shared.switch_lock.lock().await;
        let active = lock(&self.shared.active).take();
        let mut first_error = None;
        if let Some(mut active) = active {
            active.detach();
            if let Err(e) = active.source.cleanup().await {
                first_error = Some(e);
            }
        }

        if let Err(e) = self.shared.factory.cleanup().await {
            first_error.get_or_insert(e);
        }
        self.shared.notifier.clear();
        info!("Player shut down");

        match first_error {
            Some(e) => Err(e.into()),
            None => Ok(()),
        }
    }
}

/// Translate one backend's media events into state transitions
///
/// Events are applied only while `generation` is still the active backend,
/// checked under the active lock, so nothing from a torn down backend lands.
async fn listen(
    shared: Weak<Shared>,
    generation: u64,
    mut events: broadcast::Receiver<MediaEvent>,
) {
    loop {
        let event = match events.recv().await {
            Ok(event) => event,
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!(skipped, "Media event listener lagged");
                continue;
            }
            Err(broadcast::error::RecvError::Closed) => break,
        };

        let Some(shared) = shared.upgrade() else {
            break;
        };
        let player = Player::from_shared(shared);
        if !player.apply_event(generation, event) {
            break;
        }
    }
}

enum Followup {
    Nothing,
    State(PlayerState),
    Error(String, PlayerState),
    TrackEnded { ticket: u64, track_id: String },
}

impl Player {
    /// Returns false once `generation` is no longer active
    fn apply_event(&self, generation: u64, event: MediaEvent) -> bool {
        let followup = {
            let active = lock(&self.shared.active);
            if active.as_ref().map(|a| a.generation) != Some(generation) {
                return false;
            }

            let mut state = lock(&self.shared.state);
            match event {
                MediaEvent::LoadedMetadata { duration } => {
                    state.set_duration(duration);
                    Followup::State(state.clone())
                }
                MediaEvent::Playing => match state.playback_state() {
                    PlaybackState::Loading | PlaybackState::Paused => {
                        state.set_playback(PlaybackState::Playing);
                        Followup::State(state.clone())
                    }
                    _ => Followup::Nothing,
                },
                MediaEvent::Paused => {
                    if state.playback_state() == PlaybackState::Playing {
                        state.set_playback(PlaybackState::Paused);
                        Followup::State(state.clone())
                    } else {
                        Followup::Nothing
                    }
                }
                MediaEvent::Ended => match state
                    .current_track()
                    .map(|track| track.id.clone())
                    .filter(|_| state.playback_state() == PlaybackState::Playing)
                {
                    Some(track_id) => {
                        let duration = state.duration();
                        if duration > 0.0 {
                            state.set_current_time(duration);
                        }
                        Followup::TrackEnded {
                            ticket: self.shared.play_ticket.load(Ordering::SeqCst),
                            track_id,
                        }
                    }
                    _ => Followup::Nothing,
                },
                MediaEvent::Error(message) => {
                    state.set_playback(PlaybackState::Stopped);
                    Followup::Error(message, state.clone())
                }
            }
        };

        match followup {
            Followup::Nothing => {}
            Followup::State(snapshot) => self.shared.notifier.emit_state(&snapshot),
            Followup::Error(message, snapshot) => {
                self.notify_error(&format!("Playback error: {message}"));
                self.shared.notifier.emit_state(&snapshot);
            }
            Followup::TrackEnded { ticket, track_id } => {
                let player = self.clone();
                tokio::spawn(async move { player.handle_track_end(ticket, &track_id).await });
            }
        }
        true
    }

    /// Copy the active backend's playhead into state while playing
    pub(crate) fn sample_progress(&self) {
        let progress = {
            let active = lock(&self.shared.active);
            let Some(playhead) = active.as_ref().and_then(|a| a.source.playhead()) else {
                return;
            };

            let mut state = lock(&self.shared.state);
            if !state.is_playing() {
                return;
            }
            state.set_current_time(playhead.position);
            if let Some(duration) = playhead.duration {
                state.set_duration(duration);
            }
            state.progress()
        };

        self.shared.notifier.emit_progress(&progress);
    }
}
