//! Studio errors
use loudcheck_core::CoreError;
use loudcheck_playback::PlaybackError;
use thiserror::Error;

/// Result type for studio operations
pub type Result<T> = std::result::Result<T, StudioError>;

/// Studio errors
#[derive(Debug, Error)]
pub enum StudioError {
    /// The file could not be decoded; any previously loaded track is kept
    #[error("Failed to decode audio: {0}")]
    DecodeFailure(String),

    /// Transport error
    #[error(transparent)]
    Playback(#[from] PlaybackError),

    /// No platform profile with this id
    #[error("Unknown platform profile: {0}")]
    UnknownProfile(String),

    /// Invalid or unreadable configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Audio device unavailable
    #[error("Audio device error: {0}")]
    Device(String),
}

impl From<CoreError> for StudioError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::DecodeFailure(msg) => StudioError::DecodeFailure(msg),
            other => StudioError::DecodeFailure(other.to_string()),
        }
    }
}

impl From<config::ConfigError> for StudioError {
    fn from(err: config::ConfigError) -> Self {
        StudioError::Config(err.to_string())
    }
}

impl From<cpal::DefaultStreamConfigError> for StudioError {
    fn from(err: cpal::DefaultStreamConfigError) -> Self {
        StudioError::Device(err.to_string())
    }
}
