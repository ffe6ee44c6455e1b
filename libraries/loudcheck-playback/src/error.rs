//! Error types for the playback transport

use thiserror::Error;

/// Playback errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PlaybackError {
    /// No track is currently loaded
    #[error("No track loaded")]
    NoTrackLoaded,

    /// The rendering engine refused to resume or start its clock
    ///
    /// State is left unchanged so the caller may retry.
    #[error("Rendering unavailable: {0}")]
    RenderingUnavailable(String),

    /// Building a rendering graph for a track failed
    #[error("Failed to build rendering graph: {0}")]
    GraphBuild(String),

    /// Invalid operation
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
}

/// Result type for playback operations
pub type Result<T> = std::result::Result<T, PlaybackError>;
