//! Sample renderer shared between the transport and an audio callback
//!
//! The renderer owns the frame cursor and the gain stage. The control side
//! (transport) and the rendering side (engine callback) both reach it through
//! a [`SharedRenderer`]; every mutation is serialized behind that one mutex.

use crate::gain::GainRamp;
use loudcheck_core::AudioTrack;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Renderer handle shared with the audio callback
pub type SharedRenderer = Arc<Mutex<Renderer>>;

/// Lock a shared renderer
///
/// A panic while holding the lock cannot leave the cursor or gain in an
/// invalid state, so a poisoned lock is recovered rather than propagated.
pub fn lock_renderer(renderer: &SharedRenderer) -> MutexGuard<'_, Renderer> {
    renderer.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Renders one track into interleaved device buffers
#[derive(Debug)]
pub struct Renderer {
    /// Track at the output rate
    track: AudioTrack,

    /// Interleaved channel count of the output buffers
    output_channels: usize,

    /// Next frame to render
    cursor: usize,

    /// Whether the callback should advance the cursor
    playing: bool,

    /// Cursor reached the end while playing
    finished: bool,

    /// Smoothed gain stage
    gain: GainRamp,
}

impl Renderer {
    /// Create a renderer at unity gain, paused at frame 0
    ///
    /// The track must already be at the output sample rate.
    pub fn new(track: AudioTrack, output_channels: u16, gain_smoothing: Duration) -> Self {
        let gain = GainRamp::new(track.sample_rate(), gain_smoothing);
        Self {
            track,
            output_channels: usize::from(output_channels.max(1)),
            cursor: 0,
            playing: false,
            finished: false,
            gain,
        }
    }

    /// Wrap in a [`SharedRenderer`]
    pub fn into_shared(self) -> SharedRenderer {
        Arc::new(Mutex::new(self))
    }

    /// Output sample rate
    pub fn sample_rate(&self) -> u32 {
        self.track.sample_rate()
    }

    /// Output channel count
    pub fn output_channels(&self) -> usize {
        self.output_channels
    }

    /// Total frames
    pub fn frame_count(&self) -> usize {
        self.track.frame_count()
    }

    /// Start or stop advancing the cursor
    pub fn set_playing(&mut self, playing: bool) {
        self.playing = playing;
        if playing {
            self.finished = false;
        }
    }

    /// Whether the cursor is advancing
    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Whether the cursor ran off the end of the track while playing
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Current position in seconds
    pub fn position_secs(&self) -> f64 {
        self.cursor as f64 / f64::from(self.track.sample_rate())
    }

    /// Move the cursor, clamped to `[0, duration]`
    pub fn seek_secs(&mut self, position_secs: f64) {
        let frames = self.track.frame_count();
        let target = (position_secs.max(0.0) * f64::from(self.track.sample_rate())).round();
        self.cursor = (target as usize).min(frames);
        self.finished = false;
    }

    /// Set the gain to approach (linear)
    pub fn set_target_gain(&mut self, linear: f32) {
        self.gain.set_target(linear);
    }

    /// Fill an interleaved output buffer
    ///
    /// Mono tracks are duplicated to every output channel; track channels
    /// beyond the output channel count are dropped, and output channels beyond
    /// the track's are silent. Returns the number of track frames consumed.
    pub fn render(&mut self, output: &mut [f32]) -> usize {
        let channels = self.output_channels;
        let total = self.track.frame_count();
        let track_channels = self.track.channel_count();
        let mut consumed = 0;

        for frame in output.chunks_mut(channels) {
            if !self.playing || frame.len() < channels {
                frame.fill(0.0);
                continue;
            }
            if self.cursor >= total {
                self.playing = false;
                self.finished = true;
                frame.fill(0.0);
                continue;
            }

            let gain = self.gain.next_gain();
            for (ch, out) in frame.iter_mut().enumerate() {
                let source = if track_channels == 1 { 0 } else { ch };
                *out = self
                    .track
                    .channel(source)
                    .map_or(0.0, |samples| samples[self.cursor] * gain);
            }

            self.cursor += 1;
            consumed += 1;

            if self.cursor >= total {
                self.playing = false;
                self.finished = true;
            }
        }

        consumed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn renderer(channels: Vec<Vec<f32>>, output_channels: u16) -> Renderer {
        let track = AudioTrack::new(1000, channels).unwrap();
        Renderer::new(track, output_channels, Duration::ZERO)
    }

    #[test]
    fn silent_until_playing() {
        let mut r = renderer(vec![vec![0.5; 10]], 2);
        let mut out = [1.0; 8];
        assert_eq!(r.render(&mut out), 0);
        assert!(out.iter().all(|&s| s == 0.0));
        assert_eq!(r.position_secs(), 0.0);
    }

    #[test]
    fn mono_is_duplicated() {
        let mut r = renderer(vec![vec![0.5, -0.25, 0.125]], 2);
        r.set_playing(true);
        let mut out = [0.0; 6];
        assert_eq!(r.render(&mut out), 3);
        assert_eq!(out, [0.5, 0.5, -0.25, -0.25, 0.125, 0.125]);
    }

    #[test]
    fn extra_track_channels_are_dropped() {
        let mut r = renderer(vec![vec![0.1; 2], vec![0.2; 2], vec![0.3; 2]], 2);
        r.set_playing(true);
        let mut out = [0.0; 4];
        r.render(&mut out);
        assert_eq!(out, [0.1, 0.2, 0.1, 0.2]);
    }

    #[test]
    fn extra_output_channels_are_silent() {
        let mut r = renderer(vec![vec![0.1; 2], vec![0.2; 2]], 4);
        r.set_playing(true);
        let mut out = [9.0; 4];
        r.render(&mut out);
        assert_eq!(out, [0.1, 0.2, 0.0, 0.0]);
    }

    #[test]
    fn end_of_track_marks_finished() {
        let mut r = renderer(vec![vec![0.5; 3]], 1);
        r.set_playing(true);
        let mut out = [0.0; 5];
        assert_eq!(r.render(&mut out), 3);
        assert_eq!(out, [0.5, 0.5, 0.5, 0.0, 0.0]);
        assert!(r.is_finished());
        assert!(!r.is_playing());
        assert!((r.position_secs() - 0.003).abs() < 1e-12);
    }

    #[test]
    fn seek_clamps_and_clears_finished() {
        let mut r = renderer(vec![vec![0.5; 100]], 1);
        r.seek_secs(-3.0);
        assert_eq!(r.position_secs(), 0.0);
        r.seek_secs(50.0);
        assert!((r.position_secs() - 0.1).abs() < 1e-12);
        r.seek_secs(0.05);
        assert!((r.position_secs() - 0.05).abs() < 1e-12);
    }

    #[test]
    fn gain_is_applied() {
        let mut r = renderer(vec![vec![0.5; 4]], 1);
        r.set_target_gain(0.5);
        r.set_playing(true);
        let mut out = [0.0; 4];
        r.render(&mut out);
        assert!(out.iter().all(|&s| (s - 0.25).abs() < 1e-6));
    }
}
