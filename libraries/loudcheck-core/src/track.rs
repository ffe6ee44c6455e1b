//! Decoded audio tracks
//!
//! An [`AudioTrack`] is the immutable result of decoding one file: a sample
//! rate, a channel count and one sample sequence per channel. Samples are
//! nominally in [-1.0, 1.0] but are never clamped here.

use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Immutable multichannel PCM track
///
/// Channels are stored planar (one `Vec<f32>` per channel) behind an `Arc`,
/// so cloning a track is cheap and the analyzer, the transport and the
/// rendering thread can all hold the same samples.
#[derive(Debug, Clone)]
pub struct AudioTrack {
    sample_rate: u32,
    channels: Arc<[Vec<f32>]>,
}

impl AudioTrack {
    /// Create a track from planar channel data
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidTrack`] if the sample rate is zero, there
    /// are no channels, the channels differ in length, the track has no
    /// frames, or any sample is NaN or infinite.
    pub fn new(sample_rate: u32, channels: Vec<Vec<f32>>) -> Result<Self> {
        if sample_rate == 0 {
            return Err(CoreError::invalid_track("sample rate must be > 0"));
        }
        let Some(first) = channels.first() else {
            return Err(CoreError::invalid_track("track has no channels"));
        };
        let frames = first.len();
        if frames == 0 {
            return Err(CoreError::invalid_track("track has no frames"));
        }
        if let Some((index, ch)) = channels
            .iter()
            .enumerate()
            .find(|(_, ch)| ch.len() != frames)
        {
            return Err(CoreError::invalid_track(format!(
                "channel {} has {} frames, expected {}",
                index,
                ch.len(),
                frames
            )));
        }
        if channels.iter().flatten().any(|s| !s.is_finite()) {
            return Err(CoreError::invalid_track("track contains non-finite samples"));
        }

        Ok(Self {
            sample_rate,
            channels: channels.into(),
        })
    }

    /// Create a track from interleaved samples (L R L R ... for stereo)
    ///
    /// # Errors
    /// Same conditions as [`AudioTrack::new`], plus a sample count that is not
    /// a multiple of `channel_count`.
    pub fn from_interleaved(sample_rate: u32, channel_count: u16, samples: &[f32]) -> Result<Self> {
        let count = channel_count as usize;
        if count == 0 {
            return Err(CoreError::invalid_track("track has no channels"));
        }
        if samples.len() % count != 0 {
            return Err(CoreError::invalid_track(format!(
                "sample count {} is not divisible by channel count {}",
                samples.len(),
                count
            )));
        }

        let frames = samples.len() / count;
        let mut planar = vec![Vec::with_capacity(frames); count];
        for frame in samples.chunks_exact(count) {
            for (ch, &sample) in planar.iter_mut().zip(frame) {
                ch.push(sample);
            }
        }

        Self::new(sample_rate, planar)
    }

    /// Sample rate in Hz
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of channels (always >= 1)
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Number of frames (samples per channel)
    pub fn frame_count(&self) -> usize {
        self.channels[0].len()
    }

    /// Samples of one channel, or `None` if out of range
    pub fn channel(&self, index: usize) -> Option<&[f32]> {
        self.channels.get(index).map(Vec::as_slice)
    }

    /// Samples of the first channel
    pub fn first_channel(&self) -> &[f32] {
        &self.channels[0]
    }

    /// Iterate over all channels in order
    pub fn channels(&self) -> impl Iterator<Item = &[f32]> {
        self.channels.iter().map(Vec::as_slice)
    }

    /// Duration in seconds (`frame_count / sample_rate`)
    pub fn duration_secs(&self) -> f64 {
        self.frame_count() as f64 / f64::from(self.sample_rate)
    }

    /// Duration as a `Duration`
    pub fn duration(&self) -> Duration {
        Duration::from_secs_f64(self.duration_secs())
    }

    /// Serializable description of this track for the presentation layer
    pub fn info(&self) -> TrackInfo {
        TrackInfo {
            sample_rate: self.sample_rate,
            channels: self.channel_count() as u16,
            frames: self.frame_count() as u64,
            duration_secs: self.duration_secs(),
        }
    }
}

/// Format summary of a loaded track
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackInfo {
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Number of channels
    pub channels: u16,
    /// Frames per channel
    pub frames: u64,
    /// Duration in seconds
    pub duration_secs: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zero_sample_rate() {
        assert!(matches!(
            AudioTrack::new(0, vec![vec![0.0; 10]]),
            Err(CoreError::InvalidTrack(_))
        ));
    }

    #[test]
    fn rejects_empty_and_ragged_channels() {
        assert!(AudioTrack::new(44100, vec![]).is_err());
        assert!(AudioTrack::new(44100, vec![vec![]]).is_err());
        assert!(AudioTrack::new(44100, vec![vec![0.0; 10], vec![0.0; 9]]).is_err());
    }

    #[test]
    fn rejects_non_finite_samples() {
        assert!(AudioTrack::new(44100, vec![vec![0.0, f32::NAN]]).is_err());
        assert!(AudioTrack::new(44100, vec![vec![f32::INFINITY]]).is_err());
    }

    #[test]
    fn does_not_clamp_out_of_range_samples() {
        let track = AudioTrack::new(8000, vec![vec![1.5, -2.0]]).unwrap();
        assert_eq!(track.first_channel(), &[1.5, -2.0]);
    }

    #[test]
    fn deinterleaves_stereo() {
        let track = AudioTrack::from_interleaved(48000, 2, &[0.1, -0.1, 0.2, -0.2]).unwrap();
        assert_eq!(track.channel_count(), 2);
        assert_eq!(track.frame_count(), 2);
        assert_eq!(track.channel(0).unwrap(), &[0.1, 0.2]);
        assert_eq!(track.channel(1).unwrap(), &[-0.1, -0.2]);
        assert!(track.channel(2).is_none());
    }

    #[test]
    fn interleaved_count_must_divide() {
        assert!(AudioTrack::from_interleaved(48000, 2, &[0.1, 0.2, 0.3]).is_err());
        assert!(AudioTrack::from_interleaved(48000, 0, &[0.1]).is_err());
    }

    #[test]
    fn duration_is_frames_over_rate() {
        let track = AudioTrack::new(44100, vec![vec![0.0; 22050]]).unwrap();
        assert!((track.duration_secs() - 0.5).abs() < 1e-12);
        assert_eq!(track.duration(), Duration::from_millis(500));
    }

    #[test]
    fn clones_share_samples() {
        let track = AudioTrack::new(44100, vec![vec![0.25; 4]]).unwrap();
        let copy = track.clone();
        assert!(std::ptr::eq(track.first_channel(), copy.first_channel()));
    }
}
