//! Error types for playback sources

use cadence_core::SourceKind;
use thiserror::Error;

/// Errors raised by source backends and the source factory
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    /// A transport command arrived before `initialize`
    #[error("{0} source is not initialized")]
    NotInitialized(SourceKind),

    /// The backend could not acquire its output handle or connect
    #[error("Failed to initialize {kind} source: {reason}")]
    BackendInit { kind: SourceKind, reason: String },

    /// The track carries neither a direct URL nor a preview
    #[error("No playable source for track {track_id}")]
    NoPlayableSource { track_id: String },

    /// The output handle refused to start playback
    #[error("Failed to start playback: {0}")]
    PlaybackStart(String),

    /// Catalog transport failure during search or recommendations
    #[error("{kind} source unavailable: {reason}")]
    BackendUnavailable { kind: SourceKind, reason: String },

    /// No constructor is registered for the requested kind
    #[error("Unsupported source kind: {0}")]
    UnsupportedSourceKind(String),
}

impl SourceError {
    pub fn init(kind: SourceKind, reason: impl Into<String>) -> Self {
        Self::BackendInit {
            kind,
            reason: reason.into(),
        }
    }

    pub fn unavailable(kind: SourceKind, reason: impl Into<String>) -> Self {
        Self::BackendUnavailable {
            kind,
            reason: reason.into(),
        }
    }
}

/// Result type alias using `SourceError`
pub type Result<T> = std::result::Result<T, SourceError>;
