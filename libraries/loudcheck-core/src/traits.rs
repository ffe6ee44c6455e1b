/// Core traits for Loudcheck
use crate::error::Result;
use crate::track::AudioTrack;
use std::path::Path;

/// PCM source
///
/// Implementers decode an arbitrary container/codec into an [`AudioTrack`].
/// Format sniffing, codec support and sample-format conversion all live
/// behind this trait; the analysis and playback crates only ever see tracks.
pub trait PcmSource: Send {
    /// Decode an entire file into memory
    ///
    /// # Errors
    /// Returns [`CoreError::DecodeFailure`](crate::CoreError::DecodeFailure)
    /// if the file cannot be read or parsed. Callers treat this as
    /// recoverable: whatever track they held before stays usable.
    fn decode(&mut self, path: &Path) -> Result<AudioTrack>;

    /// Check whether this source is likely to handle the given file
    fn supports_format(&self, path: &Path) -> bool;
}
