//! Error types for the playback orchestrator

use cadence_core::SourceKind;
use cadence_sources::SourceError;
use thiserror::Error;

/// Errors returned by [`Player`](crate::Player) operations
///
/// Transport failures are never returned; they go to the error channel.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlayerError {
    /// A backend or the source factory failed
    #[error(transparent)]
    Source(#[from] SourceError),

    /// Every backend failed a fan-out query
    #[error("All sources failed: {attempted:?}")]
    AllSourcesFailed { attempted: Vec<SourceKind> },

    /// The player was built outside a tokio runtime
    #[error("No async runtime: {0}")]
    Runtime(String),

    /// Configuration could not be loaded or is invalid
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias using `PlayerError`
pub type Result<T> = std::result::Result<T, PlayerError>;
