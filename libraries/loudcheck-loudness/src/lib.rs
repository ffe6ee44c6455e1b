//! Loudness analysis and platform normalization for Loudcheck
//!
//! This crate provides:
//! - A windowed loudness proxy (mean-square energy in dB) and sample-peak scan
//! - Time series of per-window loudness and peak for charting and seeking
//! - A catalog of streaming-platform loudness targets
//! - Normalization of an analyzed track against each platform target
//!
//! The loudness figure is a deliberate simplification: no K-weighting, no
//! gating, no oversampled true peak. It is not an EBU R128 meter.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌──────────────────┐     ┌──────────────────┐
//! │ AudioTrack  │ ──► │ Windowed         │ ──► │ AnalysisSummary  │
//! └─────────────┘     │ LoudnessAnalyzer │     │ + loudness/peak  │
//!                     └──────────────────┘     │   series         │
//!                                              └──────────────────┘
//!                                                       │
//!                     ┌──────────────────┐              ▼
//!                     │ PlatformCatalog  │ ──► PlatformNormalizer ──► gain (dB)
//!                     └──────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust
//! use loudcheck_core::AudioTrack;
//! use loudcheck_loudness::{PlatformCatalog, PlatformNormalizer, WindowedLoudnessAnalyzer};
//!
//! let track = AudioTrack::new(44_100, vec![vec![0.5; 44_100]]).unwrap();
//! let analysis = WindowedLoudnessAnalyzer::new().analyze(&track);
//!
//! println!("Loudness: {:.2} dB", analysis.summary.loudness_db);
//!
//! let catalog = PlatformCatalog::builtin();
//! let spotify = catalog.get("spotify").unwrap();
//! let result = PlatformNormalizer::default().normalize(&analysis.summary, spotify);
//! println!("Spotify would apply {:+.2} dB", result.gain_db);
//! ```

#![forbid(unsafe_code)]

mod analyzer;
mod normalizer;
mod platforms;
mod series;

pub use analyzer::{AnalysisSummary, LoudnessFormula, TrackAnalysis, WindowedLoudnessAnalyzer};
pub use normalizer::{
    NormalizationPolicy, NormalizationReport, NormalizationResult, PlatformNormalization,
    PlatformNormalizer,
};
pub use platforms::{PlatformCatalog, PlatformProfile};
pub use series::{Series, SeriesPoint};

/// Floor added before every logarithm so silence stays finite
///
/// This is not a calibration constant and is intentionally not configurable.
pub(crate) const LOG_FLOOR: f64 = 1e-12;

/// Offset applied by [`LoudnessFormula::OffsetCalibrated`] (dB)
pub const CALIBRATION_OFFSET_DB: f64 = -0.691;

/// Default analysis window length in milliseconds
pub const DEFAULT_WINDOW_MS: u32 = 100;

/// Convert a gain in dB to a linear multiplier: `10^(dB/20)`
pub fn db_to_linear(db: f64) -> f64 {
    10.0_f64.powf(db / 20.0)
}

/// Convert a linear amplitude to dB, floored so zero maps to a finite value
pub fn linear_to_db(linear: f64) -> f64 {
    20.0 * (linear + LOG_FLOOR).log10()
}
