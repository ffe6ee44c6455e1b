//! Windowed loudness proxy analysis
//!
//! Single pass over a track producing:
//! - An integrated summary: loudness proxy of the whole first channel,
//!   sample peak across all channels, and their difference (dynamic range)
//! - Per-window loudness and peak series (non-overlapping windows, default
//!   100 ms, with a trailing partial window if samples remain)
//!
//! The loudness proxy is `offset + 10·log10(meanSquare + 1e-12)`. It has no
//! K-weighting and no gating; the arithmetic here is the contract and must
//! not drift toward BS.1770.

use crate::series::Series;
use crate::{CALIBRATION_OFFSET_DB, DEFAULT_WINDOW_MS, LOG_FLOOR};
use loudcheck_core::AudioTrack;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Loudness proxy formula variant
///
/// Two iterations of the tool disagree on whether the -0.691 dB offset from
/// BS.1770 is applied. Both are kept as explicit choices; neither is real LUFS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoudnessFormula {
    /// `-0.691 + 10·log10(x + ε)`
    #[default]
    OffsetCalibrated,
    /// `10·log10(x + ε)`
    Uncalibrated,
}

impl LoudnessFormula {
    /// Constant offset in dB added by this formula
    pub fn offset_db(self) -> f64 {
        match self {
            Self::OffsetCalibrated => CALIBRATION_OFFSET_DB,
            Self::Uncalibrated => 0.0,
        }
    }

    /// Loudness proxy of a mean-square value
    pub fn loudness_of(self, mean_square: f64) -> f64 {
        self.offset_db() + 10.0 * (mean_square + LOG_FLOOR).log10()
    }

    /// Parse from string (for settings persistence)
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "offset_calibrated" | "calibrated" | "offset" => Some(Self::OffsetCalibrated),
            "uncalibrated" | "plain" | "raw" => Some(Self::Uncalibrated),
            _ => None,
        }
    }

    /// Convert to string for settings persistence
    pub fn as_str(self) -> &'static str {
        match self {
            Self::OffsetCalibrated => "offset_calibrated",
            Self::Uncalibrated => "uncalibrated",
        }
    }
}

/// Integrated loudness characteristics of a track
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisSummary {
    /// Loudness proxy over the entire first channel (dB)
    pub loudness_db: f64,

    /// Sample peak over all channels (dBFS)
    pub peak_db: f64,

    /// `peak_db - loudness_db`
    pub dynamic_range_db: f64,
}

impl fmt::Display for AnalysisSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Loudness: {:.2} dB, Peak: {:.2} dBFS, Dynamic range: {:.2} dB",
            self.loudness_db, self.peak_db, self.dynamic_range_db
        )
    }
}

/// Full result of analyzing one track
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackAnalysis {
    /// Integrated summary
    pub summary: AnalysisSummary,
    /// Per-window loudness proxy (dB)
    pub loudness_series: Series,
    /// Per-window sample peak (linear amplitude)
    pub peak_series: Series,
    /// Window length used, in samples
    pub window_samples: usize,
}

/// Windowed loudness analyzer
///
/// Deterministic: the same samples always produce bit-identical results.
///
/// # Example
///
/// ```rust
/// use loudcheck_core::AudioTrack;
/// use loudcheck_loudness::{LoudnessFormula, WindowedLoudnessAnalyzer};
///
/// let track = AudioTrack::new(48_000, vec![vec![0.0; 4_800]]).unwrap();
/// let analysis = WindowedLoudnessAnalyzer::new()
///     .with_formula(LoudnessFormula::Uncalibrated)
///     .analyze(&track);
///
/// assert_eq!(analysis.loudness_series.len(), 1);
/// assert!(analysis.summary.loudness_db.is_finite());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowedLoudnessAnalyzer {
    formula: LoudnessFormula,
    window_ms: u32,
}

impl Default for WindowedLoudnessAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl WindowedLoudnessAnalyzer {
    /// Create an analyzer with the calibrated formula and 100 ms windows
    pub fn new() -> Self {
        Self {
            formula: LoudnessFormula::default(),
            window_ms: DEFAULT_WINDOW_MS,
        }
    }

    /// Select the loudness formula
    #[must_use]
    pub fn with_formula(mut self, formula: LoudnessFormula) -> Self {
        self.formula = formula;
        self
    }

    /// Set the window length in milliseconds (clamped to at least 1 ms)
    #[must_use]
    pub fn with_window_ms(mut self, window_ms: u32) -> Self {
        self.window_ms = window_ms.max(1);
        self
    }

    /// Formula in use
    pub fn formula(&self) -> LoudnessFormula {
        self.formula
    }

    /// Window length in milliseconds
    pub fn window_ms(&self) -> u32 {
        self.window_ms
    }

    /// Window length in samples for a sample rate: `max(1, round(rate × window))`
    pub fn window_samples(&self, sample_rate: u32) -> usize {
        let window_secs = f64::from(self.window_ms) / 1000.0;
        ((f64::from(sample_rate) * window_secs).round() as usize).max(1)
    }

    /// Analyze a track
    ///
    /// Loudness and both series come from the first channel; the peak spans
    /// every channel.
    pub fn analyze(&self, track: &AudioTrack) -> TrackAnalysis {
        let sample_rate = f64::from(track.sample_rate());
        let window = self.window_samples(track.sample_rate());
        let samples = track.first_channel();
        let total = samples.len();

        let window_count = total.div_ceil(window);
        let mut loudness_series = Series::with_capacity(window_count);
        let mut peak_series = Series::with_capacity(window_count);

        let mut sum_of_squares = 0.0_f64;
        let mut peak_abs = 0.0_f64;

        for (index, &sample) in samples.iter().enumerate() {
            let value = f64::from(sample);
            sum_of_squares += value * value;
            peak_abs = peak_abs.max(value.abs());

            if index % window == 0 {
                let end = (index + window).min(total);
                let (window_peak, mean_square) = window_statistics(&samples[index..end]);
                let time_secs = index as f64 / sample_rate;

                peak_series.push(time_secs, window_peak);
                loudness_series.push(time_secs, self.formula.loudness_of(mean_square));
            }
        }

        // Remaining channels only contribute to the overall peak
        for channel in track.channels().skip(1) {
            for &sample in channel {
                peak_abs = peak_abs.max(f64::from(sample).abs());
            }
        }

        let loudness_db = self.formula.loudness_of(sum_of_squares / total as f64);
        let peak_db = 20.0 * (peak_abs + LOG_FLOOR).log10();
        let summary = AnalysisSummary {
            loudness_db,
            peak_db,
            dynamic_range_db: peak_db - loudness_db,
        };

        debug!(
            "Analyzed {} frames in {} windows of {} samples: {}",
            total,
            loudness_series.len(),
            window,
            summary
        );

        TrackAnalysis {
            summary,
            loudness_series,
            peak_series,
            window_samples: window,
        }
    }
}

/// Peak (max |x|) and mean square of one window
fn window_statistics(window: &[f32]) -> (f64, f64) {
    let mut peak = 0.0_f64;
    let mut sum = 0.0_f64;
    for &sample in window {
        let value = f64::from(sample);
        peak = peak.max(value.abs());
        sum += value * value;
    }
    (peak, sum / window.len() as f64)
}
