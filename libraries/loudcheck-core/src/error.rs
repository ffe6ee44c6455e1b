/// Core error types for Loudcheck
use thiserror::Error;

/// Result type alias using `CoreError`
pub type Result<T> = std::result::Result<T, CoreError>;

/// Core error type for Loudcheck
#[derive(Error, Debug)]
pub enum CoreError {
    /// Track data failed validation
    #[error("Invalid track: {0}")]
    InvalidTrack(String),

    /// The PCM source could not turn a file into a track
    #[error("Decode failure: {0}")]
    DecodeFailure(String),

    /// I/O errors
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CoreError {
    /// Create an invalid track error
    pub fn invalid_track(msg: impl Into<String>) -> Self {
        Self::InvalidTrack(msg.into())
    }

    /// Create a decode failure
    pub fn decode_failure(msg: impl Into<String>) -> Self {
        Self::DecodeFailure(msg.into())
    }

    /// Whether this error came from decoding (as opposed to a bad track value)
    pub fn is_decode_failure(&self) -> bool {
        matches!(self, Self::DecodeFailure(_) | Self::Io(_))
    }
}
