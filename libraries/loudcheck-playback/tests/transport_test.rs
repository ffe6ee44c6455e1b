//! End-to-end transport behaviour against the headless engine

use loudcheck_core::AudioTrack;
use loudcheck_playback::{
    ActiveProfile, ManualEngine, PlaybackError, PlaybackTransport, TransportConfig,
    TransportEvent, TransportState,
};
use std::time::{Duration, Instant};

// ===== Helpers =====

const RATE: u32 = 1000;

fn constant_track(value: f32, secs: f64) -> AudioTrack {
    let frames = (f64::from(RATE) * secs) as usize;
    AudioTrack::new(RATE, vec![vec![value; frames]]).unwrap()
}

fn stereo_track(left: f32, right: f32, frames: usize) -> AudioTrack {
    AudioTrack::new(RATE, vec![vec![left; frames], vec![right; frames]]).unwrap()
}

fn setup(config: TransportConfig) -> (ManualEngine, PlaybackTransport<ManualEngine>) {
    let engine = ManualEngine::new(2);
    (engine.clone(), PlaybackTransport::new(engine, config))
}

fn instant_gain() -> TransportConfig {
    TransportConfig {
        gain_smoothing: Duration::ZERO,
        ..TransportConfig::default()
    }
}

fn drain(rx: &crossbeam_channel::Receiver<TransportEvent>) -> Vec<TransportEvent> {
    rx.try_iter().collect()
}

// ===== Lifecycle =====

#[test]
fn load_while_playing_replaces_the_graph() {
    let (engine, mut t) = setup(instant_gain());
    t.load(constant_track(0.5, 1.0)).unwrap();
    t.play().unwrap();
    t.set_gain(-6.0).unwrap();

    let mut buf = [0.0; 200];
    engine.pull(&mut buf);
    assert!(t.position_secs() > 0.0);

    t.load(constant_track(0.25, 2.0)).unwrap();

    assert_eq!(t.state(), TransportState::Loaded);
    assert_eq!(t.position_secs(), 0.0);
    assert_eq!(t.gain_db(), 0.0);
    assert_eq!(t.active_profile(), &ActiveProfile::Original);
    assert_eq!(engine.live_graphs(), 1);
    assert_eq!(engine.max_live_graphs(), 1);
    assert_eq!(engine.graphs_built(), 2);
    assert!(!engine.is_running());
    assert!((t.duration_secs() - 2.0).abs() < 1e-12);
}

#[test]
fn stop_releases_everything_and_is_idempotent() {
    let (engine, mut t) = setup(instant_gain());
    t.load(constant_track(0.5, 1.0)).unwrap();
    t.play().unwrap();

    t.stop();
    t.stop();

    assert_eq!(t.state(), TransportState::Idle);
    assert_eq!(t.position_secs(), 0.0);
    assert_eq!(t.duration_secs(), 0.0);
    assert!(t.track().is_none());
    assert_eq!(engine.live_graphs(), 0);
}

#[test]
fn stop_right_after_play_leaves_no_graph() {
    let (engine, mut t) = setup(instant_gain());
    t.load(constant_track(0.5, 1.0)).unwrap();
    t.play().unwrap();
    t.stop();
    t.load(constant_track(0.5, 1.0)).unwrap();

    assert_eq!(engine.live_graphs(), 1);
    assert_eq!(engine.max_live_graphs(), 1);
}

#[test]
fn dropping_the_transport_releases_the_graph() {
    let engine = ManualEngine::new(2);
    {
        let mut t = PlaybackTransport::new(engine.clone(), instant_gain());
        t.load(constant_track(0.5, 1.0)).unwrap();
        assert_eq!(engine.live_graphs(), 1);
    }
    assert_eq!(engine.live_graphs(), 0);
}

#[test]
fn failed_build_leaves_transport_idle() {
    let (engine, mut t) = setup(instant_gain());
    t.load(constant_track(0.5, 1.0)).unwrap();

    engine.set_fail_builds(true);
    let err = t.load(constant_track(0.5, 1.0)).unwrap_err();

    assert!(matches!(err, PlaybackError::GraphBuild(_)));
    assert_eq!(t.state(), TransportState::Idle);
    assert_eq!(engine.live_graphs(), 0);
}

// ===== Rendering clock =====

#[test]
fn suspended_clock_is_resumed_before_start() {
    let (engine, mut t) = setup(instant_gain());
    engine.set_suspended(true);
    t.load(constant_track(0.5, 1.0)).unwrap();

    t.play().unwrap();

    assert!(!engine.is_suspended());
    assert!(engine.is_running());
    assert_eq!(t.state(), TransportState::Playing);
}

#[test]
fn refused_resume_keeps_prior_state() {
    let (engine, mut t) = setup(instant_gain());
    engine.set_suspended(true);
    engine.set_refuse_resume(true);
    t.load(constant_track(0.5, 1.0)).unwrap();
    let rx = t.subscribe();

    let err = t.play().unwrap_err();

    assert!(matches!(err, PlaybackError::RenderingUnavailable(_)));
    assert_eq!(t.state(), TransportState::Loaded);
    assert!(!engine.is_running());
    assert!(drain(&rx)
        .iter()
        .any(|e| matches!(e, TransportEvent::Error { .. })));

    // Retry once the platform allows rendering
    engine.set_refuse_resume(false);
    t.play().unwrap();
    assert_eq!(t.state(), TransportState::Playing);
}

// ===== Seek =====

#[test]
fn seek_clamps_silently() {
    let (_, mut t) = setup(instant_gain());
    t.load(constant_track(0.5, 3.0)).unwrap();

    t.seek(10.0).unwrap();
    assert_eq!(t.position_secs(), 3.0);

    t.seek(-2.0).unwrap();
    assert_eq!(t.position_secs(), 0.0);

    t.seek(1.5).unwrap();
    assert!((t.position_secs() - 1.5).abs() < 1e-9);
    assert_eq!(t.state(), TransportState::Loaded);
}

#[test]
fn seek_while_playing_continues_from_new_position() {
    let (engine, mut t) = setup(instant_gain());
    t.load(constant_track(0.5, 3.0)).unwrap();
    t.play().unwrap();

    t.seek(2.0).unwrap();
    let mut buf = [0.0; 200];
    engine.pull(&mut buf);

    assert_eq!(t.state(), TransportState::Playing);
    assert!((t.position_secs() - 2.1).abs() < 1e-9);
}

#[test]
fn seek_emits_position_update() {
    let (_, mut t) = setup(instant_gain());
    t.load(constant_track(0.5, 3.0)).unwrap();
    let rx = t.subscribe();

    t.seek(1.0).unwrap();

    assert_eq!(
        drain(&rx),
        vec![TransportEvent::PositionUpdate {
            position_secs: 1.0,
            duration_secs: 3.0
        }]
    );
}

// ===== Gain =====

#[test]
fn gain_is_applied_to_rendered_samples() {
    let (engine, mut t) = setup(instant_gain());
    t.load(constant_track(0.5, 1.0)).unwrap();
    t.play().unwrap();
    t.select_profile(ActiveProfile::Platform("spotify".into()), -6.0)
        .unwrap();

    let mut buf = [0.0; 20];
    engine.pull(&mut buf);

    let expected = 0.5 * 10.0_f32.powf(-6.0 / 20.0);
    assert!(buf.iter().all(|&s| (s - expected).abs() < 1e-6));
    assert_eq!(
        t.active_profile(),
        &ActiveProfile::Platform("spotify".into())
    );
}

#[test]
fn gain_change_is_smoothed() {
    let (engine, mut t) = setup(TransportConfig::default());
    t.load(constant_track(1.0, 1.0)).unwrap();
    t.play().unwrap();

    let mut settle = [0.0; 20];
    engine.pull(&mut settle);
    t.set_gain(-20.0).unwrap();

    // 5 ms of stereo frames at 1 kHz
    let mut buf = [0.0; 10];
    engine.pull(&mut buf);

    // No instantaneous step to 0.1
    assert!(buf[0] > 0.5, "{}", buf[0]);
    let left: Vec<f32> = buf.iter().step_by(2).copied().collect();
    assert!(left.windows(2).all(|w| w[1] <= w[0]));
}

#[test]
fn gain_never_changes_play_state() {
    let (_, mut t) = setup(instant_gain());
    t.load(constant_track(0.5, 1.0)).unwrap();
    t.set_gain(3.0).unwrap();
    assert_eq!(t.state(), TransportState::Loaded);

    t.play().unwrap();
    t.set_gain(-3.0).unwrap();
    assert_eq!(t.state(), TransportState::Playing);

    t.pause();
    t.set_gain(0.0).unwrap();
    assert_eq!(t.state(), TransportState::Paused);
}

#[test]
fn stereo_track_on_stereo_device() {
    let engine = ManualEngine::new(2);
    let mut t = PlaybackTransport::new(engine.clone(), instant_gain());
    t.load(stereo_track(0.25, -0.75, 10)).unwrap();
    t.play().unwrap();

    let mut buf = [0.0; 4];
    engine.pull(&mut buf);
    assert_eq!(buf, [0.25, -0.75, 0.25, -0.75]);
}

// ===== End of track and events =====

#[test]
fn end_of_track_pauses_at_duration_then_replays_from_start() {
    let (engine, mut t) = setup(instant_gain());
    t.load(constant_track(0.5, 0.1)).unwrap();
    t.play().unwrap();
    let rx = t.subscribe();

    let mut buf = [0.0; 400];
    engine.pull(&mut buf);
    t.tick();

    assert_eq!(t.state(), TransportState::Paused);
    assert!((t.position_secs() - 0.1).abs() < 1e-9);
    let events = drain(&rx);
    assert!(events.contains(&TransportEvent::TrackEnded));
    assert!(events.contains(&TransportEvent::StateChanged {
        state: TransportState::Paused
    }));

    t.play().unwrap();
    assert_eq!(t.position_secs(), 0.0);
    engine.pull(&mut buf[..20]);
    assert!((t.position_secs() - 0.01).abs() < 1e-9);
}

#[test]
fn play_after_seeking_to_the_end_resumes_there() {
    let (engine, mut t) = setup(instant_gain());
    t.load(constant_track(0.5, 1.0)).unwrap();
    t.seek(1.0).unwrap();
    let rx = t.subscribe();

    t.play().unwrap();
    assert_eq!(t.position_secs(), 1.0);

    let mut buf = [0.0; 20];
    engine.pull(&mut buf);
    assert!(buf.iter().all(|&s| s == 0.0));

    t.tick();
    assert_eq!(t.state(), TransportState::Paused);
    assert!(drain(&rx).contains(&TransportEvent::TrackEnded));
}

#[test]
fn event_sequence_for_a_session() {
    let (_, mut t) = setup(instant_gain());
    let rx = t.subscribe();

    t.load(constant_track(0.5, 1.0)).unwrap();
    t.play().unwrap();
    t.select_profile(ActiveProfile::Platform("tidal".into()), -2.0)
        .unwrap();
    t.pause();
    t.stop();

    let states: Vec<TransportState> = drain(&rx)
        .into_iter()
        .filter_map(|e| match e {
            TransportEvent::StateChanged { state } => Some(state),
            _ => None,
        })
        .collect();
    assert_eq!(
        states,
        vec![
            TransportState::Loaded,
            TransportState::Playing,
            TransportState::Paused,
            TransportState::Idle,
        ]
    );
}

#[test]
fn tick_is_quiet_when_not_playing() {
    let (_, mut t) = setup(instant_gain());
    t.load(constant_track(0.5, 1.0)).unwrap();
    let rx = t.subscribe();

    t.tick_at(Instant::now());
    assert!(drain(&rx).is_empty());
}
