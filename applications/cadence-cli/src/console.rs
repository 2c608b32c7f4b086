//! Terminal rendering of player notifications

use cadence_core::{PlaybackState, PlayerState, ProgressInfo, Track};
use cadence_playback::PlayerObserver;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tokio::sync::watch;

/// `m:ss` for a number of seconds
pub fn clock(seconds: f64) -> String {
    let total = seconds.max(0.0).round() as u64;
    format!("{}:{:02}", total / 60, total % 60)
}

pub fn describe(track: &Track) -> String {
    format!(
        "{} - {} ({}) [{}] {}",
        track.artist,
        track.title,
        track.album,
        track.source,
        clock(track.duration_secs)
    )
}

/// Error notice that stays visible for a fixed time
struct Notice {
    message: String,
    shown_at: Instant,
}

/// Prints state changes and progress, and publishes the playback state
pub struct ConsoleObserver {
    playback: watch::Sender<PlaybackState>,
    last_track: Mutex<Option<String>>,
    notice: Mutex<Option<Notice>>,
    error_display: Duration,
}

impl ConsoleObserver {
    pub fn new(error_display: Duration) -> (Self, watch::Receiver<PlaybackState>) {
        let (playback, receiver) = watch::channel(PlaybackState::Stopped);
        let observer = Self {
            playback,
            last_track: Mutex::new(None),
            notice: Mutex::new(None),
            error_display,
        };
        (observer, receiver)
    }

    /// Current notice, if it has not expired yet
    fn active_notice(&self, now: Instant) -> Option<String> {
        let mut notice = self.notice.lock().ok()?;
        match notice.as_ref() {
            Some(n) if now.duration_since(n.shown_at) < self.error_display => {
                Some(n.message.clone())
            }
            Some(_) => {
                *notice = None;
                None
            }
            None => None,
        }
    }
}

impl PlayerObserver for ConsoleObserver {
    fn on_state_change(&self, state: &PlayerState) {
        self.playback.send_replace(state.playback_state());

        let Some(track) = state.current_track() else {
            return;
        };
        if let Ok(mut last) = self.last_track.lock() {
            if last.as_deref() != Some(track.id.as_str()) {
                println!("Now playing: {}", describe(track));
                *last = Some(track.id.clone());
            }
        }
    }

    fn on_progress(&self, progress: &ProgressInfo) {
        let line = format!(
            "  {} / {}  {:>3.0}%",
            clock(progress.current_time),
            clock(progress.duration),
            progress.percentage
        );
        match self.active_notice(Instant::now()) {
            Some(message) => println!("{line}  ! {message}"),
            None => println!("{line}"),
        }
    }

    fn on_error(&self, message: &str) {
        eprintln!("error: {message}");
        if let Ok(mut notice) = self.notice.lock() {
            *notice = Some(Notice {
                message: message.to_string(),
                shown_at: Instant::now(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_formats_minutes_and_seconds() {
        assert_eq!(clock(0.0), "0:00");
        assert_eq!(clock(61.4), "1:01");
        assert_eq!(clock(200.0), "3:20");
        assert_eq!(clock(-3.0), "0:00");
    }

    #[test]
    fn notice_expires_after_display_window() {
        let (observer, _rx) = ConsoleObserver::new(Duration::from_secs(5));
        observer.on_error("Playback error: boom");

        let now = Instant::now();
        assert_eq!(
            observer.active_notice(now).as_deref(),
            Some("Playback error: boom")
        );
        assert_eq!(observer.active_notice(now + Duration::from_secs(6)), None);
        assert_eq!(observer.active_notice(now), None);
    }

    #[test]
    fn state_changes_are_published() {
        let (observer, rx) = ConsoleObserver::new(Duration::from_secs(5));
        let mut state = PlayerState::default();
        state.set_playback(PlaybackState::Playing);

        observer.on_state_change(&state);
        assert_eq!(*rx.borrow(), PlaybackState::Playing);
    }
}
