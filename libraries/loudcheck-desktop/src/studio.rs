//! Control surface consumed by a presentation shell
//!
//! A [`Studio`] ties the pieces together: decode a file, analyze it,
//! normalize it against every catalog profile, and audition it through the
//! transport with the selected profile's gain.

use crate::config::StudioConfig;
use crate::engine::CpalEngine;
use crate::error::{Result, StudioError};
use crossbeam_channel::Receiver;
use loudcheck_audio::SymphoniaSource;
use loudcheck_core::{AudioTrack, PcmSource, TrackInfo};
use loudcheck_loudness::{
    NormalizationReport, PlatformCatalog, PlatformNormalizer, TrackAnalysis,
    WindowedLoudnessAnalyzer,
};
use loudcheck_playback::{
    ActiveProfile, PlaybackTransport, RenderEngine, TransportEvent, TransportState,
};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Analysis snapshot of the most recently loaded file
#[derive(Debug, Clone)]
pub struct LoadedTrack {
    path: PathBuf,
    info: TrackInfo,
    analysis: TrackAnalysis,
    report: NormalizationReport,
}

impl LoadedTrack {
    /// File the track was decoded from
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Format of the decoded track
    pub fn info(&self) -> &TrackInfo {
        &self.info
    }

    /// Summary and series
    pub fn analysis(&self) -> &TrackAnalysis {
        &self.analysis
    }

    /// One normalization result per catalog profile
    pub fn report(&self) -> &NormalizationReport {
        &self.report
    }
}

/// Analysis, normalization and audition for one track at a time
pub struct Studio<E: RenderEngine, S: PcmSource = SymphoniaSource> {
    source: S,
    analyzer: WindowedLoudnessAnalyzer,
    normalizer: PlatformNormalizer,
    catalog: PlatformCatalog,
    transport: PlaybackTransport<E>,
    session: Option<LoadedTrack>,
    selection: ActiveProfile,
}

/// Studio rendering through the default output device
///
/// # Errors
/// Returns an error if the configuration is invalid or no output device exists
pub fn desktop(config: &StudioConfig) -> Result<Studio<CpalEngine, SymphoniaSource>> {
    Studio::new(CpalEngine::new()?, SymphoniaSource::new(), config)
}

impl<E: RenderEngine, S: PcmSource> Studio<E, S> {
    /// Create a studio with the built-in platform catalog
    pub fn new(engine: E, source: S, config: &StudioConfig) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            source,
            analyzer: config.analyzer(),
            normalizer: config.normalizer(),
            catalog: PlatformCatalog::builtin(),
            transport: PlaybackTransport::new(engine, config.transport()),
            session: None,
            selection: ActiveProfile::Original,
        })
    }

    /// Replace the platform catalog
    ///
    /// The report of a loaded track is recomputed. A selected profile that is
    /// missing from the new catalog falls back to the original mix.
    pub fn with_catalog(mut self, catalog: PlatformCatalog) -> Result<Self> {
        self.catalog = catalog;

        if let Some(session) = self.session.as_mut() {
            session.report = self
                .normalizer
                .normalize_all(&session.analysis.summary, &self.catalog);
        }

        let missing = self
            .selection
            .platform_id()
            .is_some_and(|id| self.catalog.get(id).is_none());
        if missing {
            self.select_profile(ActiveProfile::Original)?;
        } else {
            self.apply_selection()?;
        }
        Ok(self)
    }

    /// Decode, analyze and load a file for audition
    ///
    /// Files the source does not support are rejected before decoding. If
    /// decoding fails the previous track, its analysis and its transport
    /// session are untouched. Once decoding succeeds the analysis is replaced
    /// even if the rendering graph cannot be built; the transport is then
    /// left idle and the error returned.
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<TrackInfo> {
        let path = path.as_ref();
        if !self.source.supports_format(path) {
            warn!("Keeping previous track, unsupported file {}", path.display());
            return Err(StudioError::DecodeFailure(format!(
                "Unsupported audio format: {}",
                path.display()
            )));
        }

        let track = self.source.decode(path).map_err(|e| {
            warn!("Keeping previous track, decode failed: {}", e);
            StudioError::from(e)
        })?;

        self.load_track(path, track)
    }

    /// Load an already decoded track, recorded under `path`
    pub fn load_track(&mut self, path: impl Into<PathBuf>, track: AudioTrack) -> Result<TrackInfo> {
        let path = path.into();
        let info = track.info();
        let analysis = self.analyzer.analyze(&track);
        let report = self.normalizer.normalize_all(&analysis.summary, &self.catalog);
        info!(
            "Analyzed {}: loudness {:.2} dB, peak {:.2} dB",
            path.display(),
            analysis.summary.loudness_db,
            analysis.summary.peak_db
        );

        self.session = Some(LoadedTrack {
            path,
            info,
            analysis,
            report,
        });

        self.transport.load(track)?;
        self.apply_selection()?;
        Ok(info)
    }

    /// Audition the track as `profile` would play it
    ///
    /// `Original` plays at 0 dB. A platform profile plays at the gain from the
    /// loaded track's normalization report. With no track loaded the choice is
    /// only recorded and applied on the next load.
    pub fn select_profile(&mut self, profile: ActiveProfile) -> Result<()> {
        if let ActiveProfile::Platform(id) = &profile {
            if self.catalog.get(id).is_none() {
                return Err(StudioError::UnknownProfile(id.clone()));
            }
        }

        self.selection = profile;
        info!("Selected profile {:?}", self.selection);
        self.apply_selection()
    }

    /// Select a catalog profile by id
    pub fn select_platform(&mut self, id: &str) -> Result<()> {
        self.select_profile(ActiveProfile::Platform(id.to_string()))
    }

    /// Go back to the unnormalized mix
    pub fn select_original(&mut self) -> Result<()> {
        self.select_profile(ActiveProfile::Original)
    }

    /// Push the current selection's gain to the live session, if any
    fn apply_selection(&mut self) -> Result<()> {
        if self.transport.state() == TransportState::Idle {
            return Ok(());
        }

        let gain_db = match &self.selection {
            ActiveProfile::Original => 0.0,
            ActiveProfile::Platform(id) => self
                .session
                .as_ref()
                .and_then(|s| s.report.get(id))
                .map(|r| r.gain_db)
                .ok_or_else(|| StudioError::UnknownProfile(id.clone()))?,
        };

        self.transport
            .select_profile(self.selection.clone(), gain_db)?;
        Ok(())
    }

    /// Start or resume playback
    pub fn play(&mut self) -> Result<()> {
        Ok(self.transport.play()?)
    }

    /// Pause playback
    pub fn pause(&mut self) {
        self.transport.pause();
    }

    /// Move to `position_secs`, clamped to the track
    pub fn seek(&mut self, position_secs: f64) -> Result<()> {
        Ok(self.transport.seek(position_secs)?)
    }

    /// Seek to the loudness-series window under a chart click at `fraction`
    /// of the chart width
    pub fn seek_to_fraction(&mut self, fraction: f64) -> Result<()> {
        let duration = self.transport.duration_secs();
        let target = self
            .session
            .as_ref()
            .and_then(|s| s.analysis.loudness_series.seek_target(fraction, duration))
            .unwrap_or(0.0);
        self.seek(target)
    }

    /// Stop playback and release the rendering graph
    ///
    /// The analysis snapshot stays available for display.
    pub fn stop(&mut self) {
        self.transport.stop();
    }

    /// Deliver due position and end-of-track events
    pub fn tick(&mut self) {
        self.transport.tick();
    }

    /// Subscribe to transport events
    pub fn subscribe(&mut self) -> Receiver<TransportEvent> {
        self.transport.subscribe()
    }

    pub fn state(&self) -> TransportState {
        self.transport.state()
    }

    pub fn position_secs(&self) -> f64 {
        self.transport.position_secs()
    }

    pub fn duration_secs(&self) -> f64 {
        self.transport.duration_secs()
    }

    /// Gain currently applied by the transport (dB)
    pub fn gain_db(&self) -> f64 {
        self.transport.gain_db()
    }

    /// Profile whose gain is live in the transport
    pub fn active_profile(&self) -> &ActiveProfile {
        self.transport.active_profile()
    }

    /// Profile chosen by the user, live or pending the next load
    pub fn selection(&self) -> &ActiveProfile {
        &self.selection
    }

    pub fn loaded(&self) -> Option<&LoadedTrack> {
        self.session.as_ref()
    }

    pub fn analysis(&self) -> Option<&TrackAnalysis> {
        self.session.as_ref().map(|s| &s.analysis)
    }

    pub fn report(&self) -> Option<&NormalizationReport> {
        self.session.as_ref().map(|s| &s.report)
    }

    pub fn catalog(&self) -> &PlatformCatalog {
        &self.catalog
    }

    pub fn transport(&self) -> &PlaybackTransport<E> {
        &self.transport
    }
}
