//! Playback transport - control-timeline orchestration
//!
//! Owns at most one rendering graph. Control calls return immediately; the
//! rendering timeline is observed through [`PlaybackTransport::tick`], which
//! the shell calls on its own schedule.

use crate::{
    engine::{RenderEngine, RenderGraph, RenderSettings},
    error::{PlaybackError, Result},
    events::{EventHub, TransportEvent},
    renderer::lock_renderer,
    types::{ActiveProfile, TransportConfig, TransportState},
};
use crossbeam_channel::Receiver;
use loudcheck_core::AudioTrack;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Audition transport
///
/// Features:
/// - `Idle -> Loaded -> Playing <-> Paused` state machine
/// - At most one live rendering graph, torn down before the next is built
/// - Smoothed gain stage driven by [`PlaybackTransport::set_gain`]
/// - Event subscriptions with rate-limited position updates
pub struct PlaybackTransport<E: RenderEngine> {
    // Engine and its live graph
    engine: E,
    graph: Option<E::Graph>,

    // Session
    state: TransportState,
    track: Option<AudioTrack>,
    gain_db: f64,
    active_profile: ActiveProfile,

    // Settings
    config: TransportConfig,

    // Observers
    events: EventHub,
    last_position_emit: Option<Instant>,
}

impl<E: RenderEngine> PlaybackTransport<E> {
    /// Create an idle transport
    pub fn new(engine: E, config: TransportConfig) -> Self {
        let events = EventHub::new(config.event_capacity);
        Self {
            engine,
            graph: None,
            state: TransportState::Idle,
            track: None,
            gain_db: 0.0,
            active_profile: ActiveProfile::Original,
            config,
            events,
            last_position_emit: None,
        }
    }

    // ===== Transport Control =====

    /// Load a track
    ///
    /// Tears down any existing graph first, then builds a new one at unity
    /// gain. Position resets to 0 and the state becomes `Loaded`. If the
    /// graph cannot be built the transport is left `Idle`.
    pub fn load(&mut self, track: AudioTrack) -> Result<()> {
        self.teardown();
        self.track = None;
        self.gain_db = 0.0;
        self.active_profile = ActiveProfile::Original;
        self.last_position_emit = None;

        let settings = RenderSettings {
            gain_smoothing: self.config.gain_smoothing,
        };
        let graph = match self.engine.build(&track, settings) {
            Ok(graph) => graph,
            Err(e) => {
                warn!("Failed to build rendering graph: {}", e);
                self.set_state(TransportState::Idle);
                self.events.emit(TransportEvent::Error {
                    message: e.to_string(),
                });
                return Err(e);
            }
        };

        info!(
            "Loaded track: {} ch, {} Hz, {:.2} s",
            track.channel_count(),
            track.sample_rate(),
            track.duration_secs()
        );

        let duration_secs = track.duration_secs();
        self.graph = Some(graph);
        self.track = Some(track);
        self.set_state(TransportState::Loaded);
        self.events.emit(TransportEvent::PositionUpdate {
            position_secs: 0.0,
            duration_secs,
        });
        Ok(())
    }

    /// Start or resume rendering from the current position
    ///
    /// Only a track that played through to its end starts over from 0; a
    /// track seeked to its end resumes there and ends on the next tick.
    /// A suspended clock is resumed first. If resuming or starting fails the
    /// state is unchanged and the error is returned.
    pub fn play(&mut self) -> Result<()> {
        match self.state {
            TransportState::Idle => return Err(PlaybackError::NoTrackLoaded),
            TransportState::Playing => return Ok(()),
            TransportState::Loaded | TransportState::Paused => {}
        }

        let graph = self.graph.as_mut().ok_or(PlaybackError::NoTrackLoaded)?;

        let mut started = Ok(());
        if graph.is_suspended() {
            debug!("Rendering clock suspended, resuming");
            started = graph.resume();
        }
        if started.is_ok() {
            started = graph.start();
        }

        if let Err(e) = started {
            warn!("Rendering engine refused to start: {}", e);
            self.events.emit(TransportEvent::Error {
                message: e.to_string(),
            });
            return Err(e);
        }

        {
            let mut renderer = lock_renderer(graph.renderer());
            // Replay after end of track starts over
            if renderer.is_finished() {
                renderer.seek_secs(0.0);
            }
            renderer.set_playing(true);
        }

        self.last_position_emit = None;
        self.set_state(TransportState::Playing);
        Ok(())
    }

    /// Halt rendering, keeping the position
    ///
    /// No-op unless playing.
    pub fn pause(&mut self) {
        if self.state != TransportState::Playing {
            return;
        }
        if let Some(graph) = self.graph.as_mut() {
            lock_renderer(graph.renderer()).set_playing(false);
            graph.halt();
        }
        self.set_state(TransportState::Paused);
        self.emit_position();
    }

    /// Move the position, clamped to `[0, duration]`
    ///
    /// While playing, rendering continues from the new position without a
    /// state change.
    pub fn seek(&mut self, position_secs: f64) -> Result<()> {
        let graph = self.graph.as_ref().ok_or(PlaybackError::NoTrackLoaded)?;

        let duration = self.duration_secs();
        let target = if position_secs.is_nan() {
            0.0
        } else {
            position_secs.clamp(0.0, duration)
        };
        {
            let mut renderer = lock_renderer(graph.renderer());
            let playing = renderer.is_playing();
            renderer.seek_secs(target);
            // A seek past the end while the callback had already stopped
            if self.state == TransportState::Playing && !playing {
                renderer.set_playing(true);
            }
        }

        debug!("Seek to {:.3} s", target);
        self.emit_position();
        Ok(())
    }

    /// Apply a gain in dB to the live session
    ///
    /// Converted to a linear multiplier `10^(dB/20)` and approached through
    /// the smoothing stage. Never changes the play/pause state.
    pub fn set_gain(&mut self, gain_db: f64) -> Result<()> {
        let profile = self.active_profile.clone();
        self.apply_gain(gain_db, profile)
    }

    /// Apply a profile's gain and record it as the active profile
    pub fn select_profile(&mut self, profile: ActiveProfile, gain_db: f64) -> Result<()> {
        self.apply_gain(gain_db, profile)
    }

    fn apply_gain(&mut self, gain_db: f64, profile: ActiveProfile) -> Result<()> {
        let graph = self.graph.as_ref().ok_or(PlaybackError::NoTrackLoaded)?;
        let linear = 10.0_f64.powf(gain_db / 20.0) as f32;
        if !gain_db.is_finite() || !linear.is_finite() {
            return Err(PlaybackError::InvalidOperation(format!(
                "gain {gain_db} dB is outside the representable range"
            )));
        }

        lock_renderer(graph.renderer()).set_target_gain(linear);

        debug!("Gain {:+.2} dB ({:?})", gain_db, profile);
        self.gain_db = gain_db;
        self.active_profile = profile.clone();
        self.events
            .emit(TransportEvent::GainChanged { gain_db, profile });
        Ok(())
    }

    /// Halt and release the graph, discard the track and return to `Idle`
    ///
    /// Idempotent.
    pub fn stop(&mut self) {
        self.teardown();
        self.track = None;
        self.gain_db = 0.0;
        self.active_profile = ActiveProfile::Original;
        self.last_position_emit = None;
        self.set_state(TransportState::Idle);
    }

    /// Observe the rendering timeline
    ///
    /// Detects end of track (transition to `Paused` at the track end, then
    /// [`TransportEvent::TrackEnded`]) and emits position updates no more
    /// often than the configured interval.
    pub fn tick(&mut self) {
        self.tick_at(Instant::now());
    }

    /// [`PlaybackTransport::tick`] with an explicit clock reading
    pub fn tick_at(&mut self, now: Instant) {
        if self.state != TransportState::Playing {
            return;
        }

        let finished = match self.graph.as_mut() {
            Some(graph) => {
                let finished = lock_renderer(graph.renderer()).is_finished();
                if finished {
                    graph.halt();
                }
                finished
            }
            None => return,
        };

        if finished {
            info!("Track ended");
            self.set_state(TransportState::Paused);
            self.emit_position();
            self.events.emit(TransportEvent::TrackEnded);
            self.last_position_emit = Some(now);
            return;
        }

        let due = self.last_position_emit.map_or(true, |last| {
            now.saturating_duration_since(last) >= self.config.position_interval
        });
        if due {
            self.emit_position();
            self.last_position_emit = Some(now);
        }
    }

    /// Subscribe to transport events
    pub fn subscribe(&mut self) -> Receiver<TransportEvent> {
        self.events.subscribe()
    }

    // ===== State Queries =====

    /// Current state
    pub fn state(&self) -> TransportState {
        self.state
    }

    /// Current position in seconds (0 when idle)
    pub fn position_secs(&self) -> f64 {
        self.graph.as_ref().map_or(0.0, |graph| {
            lock_renderer(graph.renderer())
                .position_secs()
                .min(self.duration_secs())
        })
    }

    /// Loaded track duration in seconds (0 when idle)
    pub fn duration_secs(&self) -> f64 {
        self.track.as_ref().map_or(0.0, AudioTrack::duration_secs)
    }

    /// Gain currently targeted, in dB
    pub fn gain_db(&self) -> f64 {
        self.gain_db
    }

    /// Profile whose gain is live
    pub fn active_profile(&self) -> &ActiveProfile {
        &self.active_profile
    }

    /// Loaded track
    pub fn track(&self) -> Option<&AudioTrack> {
        self.track.as_ref()
    }

    /// Whether a rendering graph is alive
    pub fn has_graph(&self) -> bool {
        self.graph.is_some()
    }

    /// Transport configuration
    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    /// Rendering engine
    pub fn engine(&self) -> &E {
        &self.engine
    }

    // ===== Internals =====

    fn teardown(&mut self) {
        if let Some(mut graph) = self.graph.take() {
            lock_renderer(graph.renderer()).set_playing(false);
            graph.halt();
            graph.close();
            info!("Rendering graph released");
        }
    }

    fn set_state(&mut self, state: TransportState) {
        if self.state == state && state != TransportState::Loaded {
            return;
        }
        debug!("Transport {} -> {}", self.state, state);
        self.state = state;
        self.events.emit(TransportEvent::StateChanged { state });
    }

    fn emit_position(&mut self) {
        let event = TransportEvent::PositionUpdate {
            position_secs: self.position_secs(),
            duration_secs: self.duration_secs(),
        };
        self.events.emit(event);
    }
}

impl<E: RenderEngine> Drop for PlaybackTransport<E> {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ManualEngine;
    use std::time::Duration;

    fn track(secs: f64) -> AudioTrack {
        let frames = (1000.0 * secs) as usize;
        AudioTrack::new(1000, vec![vec![0.5; frames]]).unwrap()
    }

    fn transport() -> (ManualEngine, PlaybackTransport<ManualEngine>) {
        let engine = ManualEngine::new(1);
        let config = TransportConfig {
            gain_smoothing: Duration::ZERO,
            ..TransportConfig::default()
        };
        (engine.clone(), PlaybackTransport::new(engine, config))
    }

    #[test]
    fn starts_idle() {
        let (_, t) = transport();
        assert_eq!(t.state(), TransportState::Idle);
        assert_eq!(t.position_secs(), 0.0);
        assert!(!t.has_graph());
    }

    #[test]
    fn idle_controls() {
        let (_, mut t) = transport();
        assert_eq!(t.play(), Err(PlaybackError::NoTrackLoaded));
        assert_eq!(t.seek(1.0), Err(PlaybackError::NoTrackLoaded));
        assert_eq!(t.set_gain(-3.0), Err(PlaybackError::NoTrackLoaded));
        t.pause();
        t.stop();
        assert_eq!(t.state(), TransportState::Idle);
    }

    #[test]
    fn load_play_pause_resume() {
        let (engine, mut t) = transport();
        t.load(track(1.0)).unwrap();
        assert_eq!(t.state(), TransportState::Loaded);

        t.play().unwrap();
        assert_eq!(t.state(), TransportState::Playing);

        let mut buf = [0.0; 100];
        engine.pull(&mut buf);
        assert!((t.position_secs() - 0.1).abs() < 1e-9);

        t.pause();
        assert_eq!(t.state(), TransportState::Paused);
        engine.pull(&mut buf);
        assert!((t.position_secs() - 0.1).abs() < 1e-9);

        t.play().unwrap();
        engine.pull(&mut buf);
        assert!((t.position_secs() - 0.2).abs() < 1e-9);
    }

    #[test]
    fn pause_when_not_playing_is_noop() {
        let (_, mut t) = transport();
        t.load(track(1.0)).unwrap();
        t.pause();
        assert_eq!(t.state(), TransportState::Loaded);
    }

    #[test]
    fn rejects_non_finite_gain() {
        let (_, mut t) = transport();
        t.load(track(1.0)).unwrap();
        assert!(matches!(
            t.set_gain(f64::INFINITY),
            Err(PlaybackError::InvalidOperation(_))
        ));
        assert_eq!(t.gain_db(), 0.0);
    }

    #[test]
    fn gain_beyond_f32_range_is_rejected() {
        let (engine, mut t) = transport();
        t.load(AudioTrack::new(1000, vec![vec![0.0, 0.5, 0.0, 0.5]]).unwrap())
            .unwrap();
        t.play().unwrap();

        // 20 * log10(f32::MAX) is about 770.6 dB
        assert!(matches!(
            t.set_gain(771.0),
            Err(PlaybackError::InvalidOperation(_))
        ));
        assert_eq!(t.gain_db(), 0.0);
        assert_eq!(t.state(), TransportState::Playing);

        let mut buf = [0.0; 4];
        engine.pull(&mut buf);
        assert_eq!(buf, [0.0, 0.5, 0.0, 0.5]);

        t.set_gain(770.0).unwrap();
        let mut buf = [0.0; 4];
        t.seek(0.0).unwrap();
        engine.pull(&mut buf);
        assert!(buf.iter().all(|s| s.is_finite()));
    }

    #[test]
    fn nan_seek_goes_to_start() {
        let (_, mut t) = transport();
        t.load(track(1.0)).unwrap();
        t.seek(0.5).unwrap();
        t.seek(f64::NAN).unwrap();
        assert_eq!(t.position_secs(), 0.0);
    }

    #[test]
    fn position_updates_are_rate_limited() {
        let (engine, mut t) = transport();
        t.load(track(2.0)).unwrap();
        t.play().unwrap();
        let rx = t.subscribe();

        let start = Instant::now();
        let mut buf = [0.0; 10];
        for step in 0..10_u64 {
            engine.pull(&mut buf);
            // 10 ms apart, interval 50 ms
            t.tick_at(start + Duration::from_millis(step * 10));
        }

        let updates = rx
            .try_iter()
            .filter(|e| matches!(e, TransportEvent::PositionUpdate { .. }))
            .count();
        assert_eq!(updates, 2);
    }
}
