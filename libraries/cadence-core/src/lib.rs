//! Cadence Core
//!
//! Platform-agnostic value types shared by every Cadence crate.
//!
//! This crate provides:
//! - **Track**: immutable descriptor of a playable item, tagged with its source kind
//! - **SourceKind**: the closed set of playback backends (local files, remote catalog)
//! - **PlayerState**: the canonical player record and the invariants that guard it
//! - **ProgressInfo**: derived position snapshot
//!
//! # Example
//!
//! ```rust
//! use cadence_core::{PlayerState, SourceKind, Track};
//!
//! let track = Track::new("local-1", "Night Drive", "Indie Artist", "Demo Album", 185.0, SourceKind::Local)
//!     .with_url("file:///music/night-drive.mp3");
//!
//! let mut state = PlayerState::default();
//! state.replace_queue(vec![track.clone()]);
//! state.load_track(track, Some(0));
//!
//! assert_eq!(state.current_index(), Some(0));
//! assert_eq!(state.volume(), 0.8);
//! ```

#![forbid(unsafe_code)]

pub mod error;
pub mod types;

pub use error::{CoreError, Result};
pub use types::{
    clamp_volume, LoadedTrack, PlaybackState, PlayerState, ProgressInfo, RepeatMode, SourceKind, Track,
    DEFAULT_VOLUME,
};
