/// Core error types for Cadence
use thiserror::Error;

/// Result type alias using `CoreError`
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors raised while building core values
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// A source kind string did not name a known backend
    #[error("Unknown source kind: {0}")]
    UnknownSourceKind(String),
}
