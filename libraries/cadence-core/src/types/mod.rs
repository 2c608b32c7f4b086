//! Core domain types

mod player_state;
mod source_kind;
mod track;

pub use player_state::{
    clamp_volume, LoadedTrack, PlaybackState, PlayerState, ProgressInfo, RepeatMode, DEFAULT_VOLUME,
};
pub use source_kind::SourceKind;
pub use track::Track;
