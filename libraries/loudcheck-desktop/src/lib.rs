//! Loudcheck Desktop
//!
//! Desktop audition studio: plays a track through the default output device
//! at the gain each streaming platform would apply.
//!
//! This crate provides:
//! - [`CpalEngine`], a [`RenderEngine`](loudcheck_playback::RenderEngine)
//!   backed by a cpal output stream on a dedicated device thread
//! - [`Studio`], the control surface a presentation shell drives
//! - [`StudioConfig`], layered TOML and environment configuration
//! - [`logging::init`], the tracing bootstrap for shells
//!
//! # Example
//!
//! ```rust,no_run
//! use loudcheck_desktop::{logging, StudioConfig};
//! use std::path::Path;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! logging::init(logging::DEFAULT_DIRECTIVE);
//!
//! let config = StudioConfig::load(Some(Path::new("loudcheck.toml")))?;
//! let mut studio = loudcheck_desktop::desktop(&config)?;
//!
//! studio.load("/music/master.wav")?;
//! for entry in studio.report().into_iter().flat_map(|r| r.entries()) {
//!     println!("{}: {:+.2} dB", entry.profile_name, entry.result.gain_db);
//! }
//!
//! studio.select_platform("spotify")?;
//! studio.play()?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]

pub mod config;
mod engine;
mod error;
pub mod logging;
mod resample;
mod studio;

pub use config::StudioConfig;
pub use engine::{CpalEngine, CpalGraph};
pub use error::{Result, StudioError};
pub use resample::resample_track;
pub use studio::{desktop, LoadedTrack, Studio};
