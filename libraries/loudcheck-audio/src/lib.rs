//! Loudcheck Audio
//!
//! Audio decoding for Loudcheck.
//!
//! This crate provides [`SymphoniaSource`], the [`PcmSource`](loudcheck_core::PcmSource)
//! used by desktop shells. It decodes MP3, FLAC, OGG/Vorbis, WAV and AAC/M4A
//! into a planar [`AudioTrack`](loudcheck_core::AudioTrack), keeping every
//! channel at its native sample rate.
//!
//! # Example: Decoding Audio
//!
//! ```rust,no_run
//! use loudcheck_audio::SymphoniaSource;
//! use loudcheck_core::PcmSource;
//! use std::path::Path;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut source = SymphoniaSource::new();
//! let track = source.decode(Path::new("/music/song.flac"))?;
//!
//! println!(
//!     "Decoded {} frames x {} channels at {} Hz",
//!     track.frame_count(),
//!     track.channel_count(),
//!     track.sample_rate()
//! );
//! # Ok(())
//! # }
//! ```

mod decoder;
mod error;

pub use decoder::SymphoniaSource;
pub use error::{AudioError, Result};
