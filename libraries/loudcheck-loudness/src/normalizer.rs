//! Platform normalization
//!
//! Maps an [`AnalysisSummary`] and a [`PlatformProfile`] to the gain the
//! platform would apply and the resulting loudness and peak. Pure and
//! infallible; a silent track simply produces a very large gain.

use crate::analyzer::AnalysisSummary;
use crate::platforms::{PlatformCatalog, PlatformProfile};
use serde::{Deserialize, Serialize};

/// How the gain is chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormalizationPolicy {
    /// `gain = target - loudness`; never limits
    LoudnessOnly,
    /// Loudness gain, then reduced so the projected peak sits on the
    /// profile's ceiling when it would overshoot
    #[default]
    PeakSafety,
}

impl NormalizationPolicy {
    /// Parse from string (for settings persistence)
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "loudness_only" | "loudness" | "never_limit" => Some(Self::LoudnessOnly),
            "peak_safety" | "peak" | "limit" => Some(Self::PeakSafety),
            _ => None,
        }
    }

    /// Convert to string for settings persistence
    pub fn as_str(self) -> &'static str {
        match self {
            Self::LoudnessOnly => "loudness_only",
            Self::PeakSafety => "peak_safety",
        }
    }
}

/// Outcome of normalizing one track for one platform
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizationResult {
    /// Gain the platform would apply (dB)
    pub gain_db: f64,
    /// Loudness after gain (dB)
    pub projected_loudness_db: f64,
    /// Peak after gain (dBFS)
    pub projected_peak_db: f64,
    /// Whether the gain was reduced to respect the peak ceiling
    pub limited: bool,
}

impl NormalizationResult {
    /// Linear multiplier for the gain stage: `10^(gain/20)`
    pub fn linear_gain(&self) -> f64 {
        crate::db_to_linear(self.gain_db)
    }
}

/// Platform normalizer
///
/// # Example
///
/// ```rust
/// use loudcheck_loudness::{
///     AnalysisSummary, NormalizationPolicy, PlatformNormalizer, PlatformProfile,
/// };
///
/// let summary = AnalysisSummary { loudness_db: -20.0, peak_db: -3.0, dynamic_range_db: 17.0 };
/// let profile = PlatformProfile::new("spotify", "Spotify", -14.0, Some(-1.0));
///
/// let result = PlatformNormalizer::new(NormalizationPolicy::PeakSafety).normalize(&summary, &profile);
/// assert!(result.limited);
/// assert!((result.projected_peak_db - -1.0).abs() < 1e-9);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlatformNormalizer {
    policy: NormalizationPolicy,
}

impl PlatformNormalizer {
    /// Create a normalizer with the given policy
    pub fn new(policy: NormalizationPolicy) -> Self {
        Self { policy }
    }

    /// Policy in use
    pub fn policy(&self) -> NormalizationPolicy {
        self.policy
    }

    /// Normalize a summary against one profile
    ///
    /// Profiles without a peak ceiling always use the loudness-only rule.
    pub fn normalize(
        &self,
        summary: &AnalysisSummary,
        profile: &PlatformProfile,
    ) -> NormalizationResult {
        let mut gain_db = profile.target_loudness_db - summary.loudness_db;
        let mut limited = false;

        if self.policy == NormalizationPolicy::PeakSafety {
            if let Some(ceiling) = profile.peak_ceiling_db {
                let projected_peak = summary.peak_db + gain_db;
                if projected_peak > ceiling {
                    gain_db -= projected_peak - ceiling;
                    limited = true;
                }
            }
        }

        NormalizationResult {
            gain_db,
            projected_loudness_db: summary.loudness_db + gain_db,
            projected_peak_db: summary.peak_db + gain_db,
            limited,
        }
    }

    /// Normalize a summary against every profile of a catalog independently
    pub fn normalize_all(
        &self,
        summary: &AnalysisSummary,
        catalog: &PlatformCatalog,
    ) -> NormalizationReport {
        let entries = catalog
            .iter()
            .map(|profile| PlatformNormalization {
                profile_id: profile.id.clone(),
                profile_name: profile.name.clone(),
                result: self.normalize(summary, profile),
            })
            .collect();

        NormalizationReport { entries }
    }
}

/// Normalization result tagged with its profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformNormalization {
    /// Profile id
    pub profile_id: String,
    /// Profile display name
    pub profile_name: String,
    /// Result for this profile
    pub result: NormalizationResult,
}

/// Results for a whole catalog, in catalog order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NormalizationReport {
    entries: Vec<PlatformNormalization>,
}

impl NormalizationReport {
    /// Result for a profile id
    pub fn get(&self, profile_id: &str) -> Option<&NormalizationResult> {
        self.entries
            .iter()
            .find(|e| e.profile_id == profile_id)
            .map(|e| &e.result)
    }

    /// All entries in catalog order
    pub fn entries(&self) -> &[PlatformNormalization] {
        &self.entries
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the report is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
