//! Loudcheck Core
//!
//! Platform-agnostic track types, the PCM source seam and error handling
//! shared by every Loudcheck crate.
//!
//! # Architecture
//!
//! The core crate defines:
//! - **Domain Types**: [`AudioTrack`], an immutable multichannel PCM value
//! - **Core Traits**: [`PcmSource`], implemented by whatever decodes files
//! - **Error Handling**: Unified [`CoreError`] and [`Result`] types
//!
//! # Example
//!
//! ```rust
//! use loudcheck_core::AudioTrack;
//!
//! // One second of a mono 0.5 DC signal
//! let track = AudioTrack::new(44_100, vec![vec![0.5; 44_100]]).unwrap();
//!
//! assert_eq!(track.channel_count(), 1);
//! assert!((track.duration_secs() - 1.0).abs() < 1e-9);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod track;
pub mod traits;

pub use error::{CoreError, Result};
pub use track::{AudioTrack, TrackInfo};
pub use traits::PcmSource;
