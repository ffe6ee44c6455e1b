/// Studio configuration
use crate::error::{Result, StudioError};
use loudcheck_loudness::{
    LoudnessFormula, NormalizationPolicy, PlatformNormalizer, WindowedLoudnessAnalyzer,
    DEFAULT_WINDOW_MS,
};
use loudcheck_playback::TransportConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Environment variable prefix (`LOUDCHECK__PLAYBACK__EVENT_CAPACITY=128`)
pub const ENV_PREFIX: &str = "LOUDCHECK";

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct StudioConfig {
    #[serde(default)]
    pub analysis: AnalysisSettings,

    #[serde(default)]
    pub normalization: NormalizationSettings,

    #[serde(default)]
    pub playback: PlaybackSettings,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct AnalysisSettings {
    #[serde(default)]
    pub formula: LoudnessFormula,

    #[serde(default = "default_window_ms")]
    pub window_ms: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct NormalizationSettings {
    #[serde(default)]
    pub policy: NormalizationPolicy,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PlaybackSettings {
    #[serde(default = "default_gain_smoothing_ms")]
    pub gain_smoothing_ms: f64,

    #[serde(default = "default_position_interval_ms")]
    pub position_interval_ms: u64,

    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            formula: LoudnessFormula::default(),
            window_ms: default_window_ms(),
        }
    }
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            gain_smoothing_ms: default_gain_smoothing_ms(),
            position_interval_ms: default_position_interval_ms(),
            event_capacity: default_event_capacity(),
        }
    }
}

impl StudioConfig {
    /// Load configuration from an optional TOML file and the environment
    ///
    /// Environment variables (`LOUDCHECK__SECTION__KEY`) override the file.
    /// A missing file is not an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = config::Config::builder();

        if let Some(path) = path {
            if path.exists() {
                settings = settings.add_source(config::File::from(path));
            }
        }

        settings = settings.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        );

        let config: Self = settings.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a TOML string, without environment overrides
    pub fn from_toml(toml: &str) -> Result<Self> {
        let config: Self = config::Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.analysis.window_ms == 0 {
            return Err(StudioError::Config(
                "analysis.window_ms must be at least 1".to_string(),
            ));
        }

        let smoothing = self.playback.gain_smoothing_ms;
        if !smoothing.is_finite() || smoothing <= 0.0 {
            return Err(StudioError::Config(format!(
                "playback.gain_smoothing_ms must be positive, got {smoothing}"
            )));
        }

        if self.playback.event_capacity == 0 {
            return Err(StudioError::Config(
                "playback.event_capacity must be at least 1".to_string(),
            ));
        }

        Ok(())
    }

    /// Analyzer configured from the `[analysis]` section
    pub fn analyzer(&self) -> WindowedLoudnessAnalyzer {
        WindowedLoudnessAnalyzer::new()
            .with_formula(self.analysis.formula)
            .with_window_ms(self.analysis.window_ms)
    }

    /// Normalizer configured from the `[normalization]` section
    pub fn normalizer(&self) -> PlatformNormalizer {
        PlatformNormalizer::new(self.normalization.policy)
    }

    /// Transport settings from the `[playback]` section
    pub fn transport(&self) -> TransportConfig {
        TransportConfig {
            gain_smoothing: Duration::from_secs_f64(self.playback.gain_smoothing_ms / 1000.0),
            position_interval: Duration::from_millis(self.playback.position_interval_ms),
            event_capacity: self.playback.event_capacity,
        }
    }
}

// Default values
fn default_window_ms() -> u32 {
    DEFAULT_WINDOW_MS
}

fn default_gain_smoothing_ms() -> f64 {
    10.0
}

fn default_position_interval_ms() -> u64 {
    50
}

fn default_event_capacity() -> usize {
    64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_source_yields_defaults() {
        let config = StudioConfig::from_toml("").unwrap();
        assert_eq!(config, StudioConfig::default());
        assert_eq!(config.analysis.window_ms, 100);
        assert_eq!(config.normalization.policy, NormalizationPolicy::PeakSafety);
        assert_eq!(config.analysis.formula, LoudnessFormula::OffsetCalibrated);
    }

    #[test]
    fn sections_override_defaults() {
        let config = StudioConfig::from_toml(
            r#"
            [analysis]
            formula = "uncalibrated"
            window_ms = 400

            [normalization]
            policy = "loudness_only"

            [playback]
            gain_smoothing_ms = 25.0
            event_capacity = 8
            "#,
        )
        .unwrap();

        assert_eq!(config.analysis.formula, LoudnessFormula::Uncalibrated);
        assert_eq!(config.analyzer().window_ms(), 400);
        assert_eq!(
            config.normalizer().policy(),
            NormalizationPolicy::LoudnessOnly
        );

        let transport = config.transport();
        assert_eq!(transport.gain_smoothing, Duration::from_millis(25));
        assert_eq!(transport.position_interval, Duration::from_millis(50));
        assert_eq!(transport.event_capacity, 8);
    }

    #[test]
    fn rejects_zero_window() {
        let err = StudioConfig::from_toml("[analysis]\nwindow_ms = 0\n").unwrap_err();
        assert!(matches!(err, StudioError::Config(_)));
    }

    #[test]
    fn rejects_non_positive_smoothing() {
        let mut config = StudioConfig::default();
        config.playback.gain_smoothing_ms = 0.0;
        assert!(config.validate().is_err());
        config.playback.gain_smoothing_ms = -5.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_zero_capacity() {
        let mut config = StudioConfig::default();
        config.playback.event_capacity = 0;
        assert!(matches!(config.validate(), Err(StudioError::Config(_))));
    }

    #[test]
    fn rejects_unknown_formula() {
        let err = StudioConfig::from_toml("[analysis]\nformula = \"lufs\"\n").unwrap_err();
        assert!(matches!(err, StudioError::Config(_)));
    }

    #[test]
    fn missing_file_is_not_an_error() {
        let config = StudioConfig::load(Some(Path::new("/nonexistent/loudcheck.toml"))).unwrap();
        assert!(config.validate().is_ok());
    }
}
