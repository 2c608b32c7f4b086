//! Canonical player state
//!
//! `PlayerState` is owned by the orchestrator. Fields are private so the
//! invariants below can only be changed through the mutators:
//! - volume stays within `0.0..=1.0`
//! - `current_index` is `None` or a valid queue index
//! - `is_playing` is true exactly when the playback state is `Playing`

use super::Track;
use serde::{Deserialize, Serialize};

/// Volume a fresh player starts with
pub const DEFAULT_VOLUME: f32 = 0.8;

/// Playback state tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackState {
    /// Nothing is playing
    #[default]
    Stopped,

    /// A play request is switching backends or loading media
    Loading,

    /// Audio is running
    Playing,

    /// Paused mid-track
    Paused,
}

/// Repeat mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepeatMode {
    /// Stop when the queue ends
    #[default]
    None,

    /// Loop the current track
    One,

    /// Loop the whole queue
    All,
}

impl RepeatMode {
    /// Next mode in the `None -> One -> All -> None` rotation
    pub fn cycled(self) -> Self {
        match self {
            RepeatMode::None => RepeatMode::One,
            RepeatMode::One => RepeatMode::All,
            RepeatMode::All => RepeatMode::None,
        }
    }
}

/// Clamp a volume into `0.0..=1.0`, mapping NaN to silence
pub fn clamp_volume(volume: f32) -> f32 {
    if volume.is_nan() {
        0.0
    } else {
        volume.clamp(0.0, 1.0)
    }
}

/// Position snapshot derived from the player state
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressInfo {
    /// Elapsed seconds
    pub current_time: f64,

    /// Total seconds (0 until metadata is known)
    pub duration: f64,

    /// `100 * current_time / duration`, or 0 without a duration
    pub percentage: f64,
}

impl ProgressInfo {
    /// Build a snapshot from raw seconds
    pub fn new(current_time: f64, duration: f64) -> Self {
        let percentage = if duration > 0.0 {
            100.0 * current_time / duration
        } else {
            0.0
        };

        Self {
            current_time,
            duration,
            percentage,
        }
    }
}

/// Snapshot of the loaded track, used to undo a failed load
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedTrack {
    track: Option<Track>,
    index: Option<usize>,
    current_time: f64,
    duration: f64,
}

/// The single authoritative player record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerState {
    current_track: Option<Track>,
    is_playing: bool,
    current_time: f64,
    duration: f64,
    volume: f32,
    playback_state: PlaybackState,
    queue: Vec<Track>,
    current_index: Option<usize>,
    shuffle: bool,
    repeat: RepeatMode,
}

impl Default for PlayerState {
    fn default() -> Self {
        Self::new(DEFAULT_VOLUME)
    }
}

impl PlayerState {
    /// Fresh state with the given starting volume
    pub fn new(volume: f32) -> Self {
        Self {
            current_track: None,
            is_playing: false,
            current_time: 0.0,
            duration: 0.0,
            volume: clamp_volume(volume),
            playback_state: PlaybackState::Stopped,
            queue: Vec::new(),
            current_index: None,
            shuffle: false,
            repeat: RepeatMode::None,
        }
    }

    // ===== Accessors =====

    pub fn current_track(&self) -> Option<&Track> {
        self.current_track.as_ref()
    }

    pub fn is_playing(&self) -> bool {
        self.is_playing
    }

    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn playback_state(&self) -> PlaybackState {
        self.playback_state
    }

    pub fn queue(&self) -> &[Track] {
        &self.queue
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current_index
    }

    pub fn shuffle(&self) -> bool {
        self.shuffle
    }

    pub fn repeat(&self) -> RepeatMode {
        self.repeat
    }

    /// Queue entry at `index`
    pub fn track_at(&self, index: usize) -> Option<&Track> {
        self.queue.get(index)
    }

    /// Progress derived from the current time and duration
    pub fn progress(&self) -> ProgressInfo {
        ProgressInfo::new(self.current_time, self.duration)
    }

    // ===== Transport =====

    /// Set the playback state, keeping `is_playing` in lock-step
    pub fn set_playback(&mut self, state: PlaybackState) {
        self.playback_state = state;
        self.is_playing = state == PlaybackState::Playing;
    }

    /// Clamp and store a volume, returning the stored value
    pub fn set_volume(&mut self, volume: f32) -> f32 {
        self.volume = clamp_volume(volume);
        self.volume
    }

    /// Record the duration reported by a backend
    pub fn set_duration(&mut self, duration: f64) {
        self.duration = non_negative(duration);
    }

    /// Record the elapsed time
    pub fn set_current_time(&mut self, time: f64) {
        self.current_time = non_negative(time);
    }

    /// Make `track` the current track
    ///
    /// A different track resets time and duration until its metadata loads.
    /// `Some(index)` replaces the queue position (an index outside the queue
    /// clears it); `None` keeps the previous position.
    /// Replaying a track that already reached its end rewinds it.
    pub fn load_track(&mut self, track: Track, index: Option<usize>) {
        if self.current_track.as_ref() != Some(&track) {
            self.current_time = 0.0;
            self.duration = 0.0;
        } else if self.duration > 0.0 && self.current_time >= self.duration {
            self.current_time = 0.0;
        }
        self.current_track = Some(track);

        if let Some(index) = index {
            self.current_index = (index < self.queue.len()).then_some(index);
        }
    }

    /// Current track, queue position and playhead
    pub fn loaded(&self) -> LoadedTrack {
        LoadedTrack {
            track: self.current_track.clone(),
            index: self.current_index,
            current_time: self.current_time,
            duration: self.duration,
        }
    }

    /// Put back what [`loaded`](Self::loaded) returned
    ///
    /// The index is dropped if the queue no longer reaches it.
    pub fn restore_loaded(&mut self, loaded: LoadedTrack) {
        self.current_track = loaded.track;
        self.current_index = loaded.index.filter(|index| *index < self.queue.len());
        self.current_time = non_negative(loaded.current_time);
        self.duration = non_negative(loaded.duration);
    }

    // ===== Queue =====

    /// Replace the queue
    ///
    /// The current index follows the current track into the new queue, or is
    /// cleared when that track is absent.
    pub fn replace_queue(&mut self, tracks: Vec<Track>) {
        self.queue = tracks;
        self.current_index = self
            .current_track
            .as_ref()
            .and_then(|current| self.queue.iter().position(|t| t == current));
    }

    /// Append a track to the end of the queue
    pub fn push_track(&mut self, track: Track) {
        self.queue.push(track);
    }

    /// Remove the entry at `index`, keeping the current index on the same
    /// logical position
    ///
    /// Returns `None` without touching the queue when `index` is out of range.
    pub fn remove_track(&mut self, index: usize) -> Option<Track> {
        if index >= self.queue.len() {
            return None;
        }

        let removed = self.queue.remove(index);
        self.current_index = match self.current_index {
            Some(current) if index < current => Some(current - 1),
            Some(current) if index == current => {
                if self.queue.is_empty() {
                    None
                } else {
                    Some(current.min(self.queue.len() - 1))
                }
            }
            other => other,
        };

        Some(removed)
    }

    // ===== Modes =====

    /// Flip shuffle, returning the new value
    pub fn toggle_shuffle(&mut self) -> bool {
        self.shuffle = !self.shuffle;
        self.shuffle
    }

    /// Rotate the repeat mode, returning the new value
    pub fn cycle_repeat(&mut self) -> RepeatMode {
        self.repeat = self.repeat.cycled();
        self.repeat
    }
}

fn non_negative(seconds: f64) -> f64 {
    if seconds.is_finite() && seconds > 0.0 {
        seconds
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SourceKind;

    fn track(id: &str) -> Track {
        Track::new(id, id, "Artist", "Album", 180.0, SourceKind::Local)
    }

    fn queue_of(ids: &[&str]) -> PlayerState {
        let mut state = PlayerState::default();
        state.replace_queue(ids.iter().map(|id| track(id)).collect());
        state
    }

    #[test]
    fn defaults_match_fresh_player() {
        let state = PlayerState::default();
        assert!(state.current_track().is_none());
        assert!(!state.is_playing());
        assert_eq!(state.playback_state(), PlaybackState::Stopped);
        assert_eq!(state.volume(), DEFAULT_VOLUME);
        assert!(state.queue().is_empty());
        assert_eq!(state.current_index(), None);
        assert!(!state.shuffle());
        assert_eq!(state.repeat(), RepeatMode::None);
    }

    #[test]
    fn is_playing_tracks_playback_state() {
        let mut state = PlayerState::default();
        for (playback, playing) in [
            (PlaybackState::Loading, false),
            (PlaybackState::Playing, true),
            (PlaybackState::Paused, false),
            (PlaybackState::Playing, true),
            (PlaybackState::Stopped, false),
        ] {
            state.set_playback(playback);
            assert_eq!(state.is_playing(), playing, "{playback:?}");
        }
    }

    #[test]
    fn volume_is_clamped() {
        let mut state = PlayerState::default();
        assert_eq!(state.set_volume(1.5), 1.0);
        assert_eq!(state.set_volume(-0.2), 0.0);
        assert_eq!(state.set_volume(0.35), 0.35);
        assert_eq!(state.set_volume(f32::NAN), 0.0);
        assert_eq!(PlayerState::new(3.0).volume(), 1.0);
    }

    #[test]
    fn remove_before_current_decrements_index() {
        let mut state = queue_of(&["a", "b", "c", "d"]);
        state.load_track(track("c"), Some(2));

        let removed = state.remove_track(0);
        assert_eq!(removed.map(|t| t.id), Some("a".to_string()));
        assert_eq!(state.current_index(), Some(1));
        assert_eq!(state.track_at(1).map(|t| t.id.as_str()), Some("c"));
    }

    #[test]
    fn remove_after_current_keeps_index() {
        let mut state = queue_of(&["a", "b", "c"]);
        state.load_track(track("a"), Some(0));

        state.remove_track(2);
        assert_eq!(state.current_index(), Some(0));
    }

    #[test]
    fn remove_current_points_at_following_track() {
        let mut state = queue_of(&["a", "b", "c"]);
        state.load_track(track("b"), Some(1));

        state.remove_track(1);
        assert_eq!(state.current_index(), Some(1));
        assert_eq!(state.track_at(1).map(|t| t.id.as_str()), Some("c"));
    }

    #[test]
    fn remove_current_last_entry_clamps() {
        let mut state = queue_of(&["a", "b", "c"]);
        state.load_track(track("c"), Some(2));

        state.remove_track(2);
        assert_eq!(state.current_index(), Some(1));

        let mut single = queue_of(&["a"]);
        single.load_track(track("a"), Some(0));
        single.remove_track(0);
        assert_eq!(single.current_index(), None);
    }

    #[test]
    fn remove_out_of_range_is_ignored() {
        let mut state = queue_of(&["a", "b"]);
        state.load_track(track("b"), Some(1));
        assert!(state.remove_track(5).is_none());
        assert_eq!(state.queue().len(), 2);
        assert_eq!(state.current_index(), Some(1));
    }

    #[test]
    fn replace_queue_follows_current_track() {
        let mut state = queue_of(&["a", "b", "c"]);
        state.load_track(track("b"), Some(1));

        state.replace_queue(vec![track("x"), track("y"), track("b")]);
        assert_eq!(state.current_index(), Some(2));

        state.replace_queue(vec![track("x")]);
        assert_eq!(state.current_index(), None);
    }

    #[test]
    fn load_track_keeps_index_when_omitted() {
        let mut state = queue_of(&["a", "b"]);
        state.load_track(track("b"), Some(1));
        state.load_track(track("zzz"), None);
        assert_eq!(state.current_index(), Some(1));
        assert_eq!(state.current_track().map(|t| t.id.as_str()), Some("zzz"));
    }

    #[test]
    fn load_track_rejects_index_outside_queue() {
        let mut state = queue_of(&["a"]);
        state.load_track(track("a"), Some(4));
        assert_eq!(state.current_index(), None);
    }

    #[test]
    fn load_different_track_resets_position() {
        let mut state = queue_of(&["a", "b"]);
        state.load_track(track("a"), Some(0));
        state.set_duration(180.0);
        state.set_current_time(42.0);

        state.load_track(track("a"), None);
        assert_eq!(state.current_time(), 42.0);

        state.load_track(track("b"), Some(1));
        assert_eq!(state.current_time(), 0.0);
        assert_eq!(state.duration(), 0.0);
    }

    #[test]
    fn replaying_finished_track_rewinds() {
        let mut state = queue_of(&["a"]);
        state.load_track(track("a"), Some(0));
        state.set_duration(180.0);
        state.set_current_time(180.0);

        state.load_track(track("a"), Some(0));
        assert_eq!(state.current_time(), 0.0);
        assert_eq!(state.duration(), 180.0);
    }

    #[test]
    fn restore_loaded_undoes_load() {
        let mut state = queue_of(&["a", "b"]);
        state.load_track(track("a"), Some(0));
        state.set_duration(100.0);
        state.set_current_time(3.0);
        let before = state.loaded();

        state.load_track(track("b"), Some(1));
        state.restore_loaded(before);

        assert_eq!(state.current_track().map(|t| t.id.as_str()), Some("a"));
        assert_eq!(state.current_index(), Some(0));
        assert_eq!(state.current_time(), 3.0);
        assert_eq!(state.duration(), 100.0);
    }

    #[test]
    fn restore_loaded_drops_index_past_queue() {
        let mut state = queue_of(&["a", "b"]);
        state.load_track(track("b"), Some(1));
        let before = state.loaded();

        state.replace_queue(vec![track("b")]);
        state.restore_loaded(before);
        assert_eq!(state.current_index(), None);
    }

    #[test]
    fn repeat_cycles_through_all_modes() {
        let mut state = PlayerState::default();
        assert_eq!(state.cycle_repeat(), RepeatMode::One);
        assert_eq!(state.cycle_repeat(), RepeatMode::All);
        assert_eq!(state.cycle_repeat(), RepeatMode::None);
    }

    #[test]
    fn progress_percentage() {
        assert_eq!(ProgressInfo::new(50.0, 200.0).percentage, 25.0);
        assert_eq!(ProgressInfo::new(50.0, 0.0).percentage, 0.0);
    }
}
