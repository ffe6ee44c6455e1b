/// Audio-specific errors
use thiserror::Error;

/// Result type alias using `AudioError`
pub type Result<T> = std::result::Result<T, AudioError>;

/// Audio error types
#[derive(Error, Debug)]
pub enum AudioError {
    /// File not found
    #[error("File not found: {0}")]
    FileNotFound(String),

    /// Unsupported format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Decoding error
    #[error("Decode error: {0}")]
    DecodeError(String),

    /// I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Symphonia error
    #[error("Symphonia error: {0}")]
    Symphonia(String),
}

impl From<symphonia::core::errors::Error> for AudioError {
    fn from(err: symphonia::core::errors::Error) -> Self {
        use symphonia::core::errors::Error;

        match err {
            Error::Unsupported(what) => Self::UnsupportedFormat(what.to_string()),
            Error::IoError(e) => Self::Io(e),
            other => Self::Symphonia(other.to_string()),
        }
    }
}

impl From<AudioError> for loudcheck_core::CoreError {
    fn from(err: AudioError) -> Self {
        loudcheck_core::CoreError::decode_failure(err.to_string())
    }
}
