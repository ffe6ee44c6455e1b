//! Device-rate conversion applied once when a graph is built

use loudcheck_core::AudioTrack;
use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};

const SINC_LEN: usize = 256;

/// Convert `track` to `target_rate`
///
/// The whole track is processed as one chunk. The filter delay is trimmed so
/// the output lines up with the input, and the length is exactly
/// `round(frames * target_rate / source_rate)` frames.
pub fn resample_track(track: &AudioTrack, target_rate: u32) -> Result<AudioTrack, String> {
    let source_rate = track.sample_rate();
    if source_rate == target_rate {
        return Ok(track.clone());
    }

    let ratio = f64::from(target_rate) / f64::from(source_rate);
    let frames = track.frame_count();
    let target_frames = ((frames as f64 * ratio).round() as usize).max(1);

    let params = SincInterpolationParameters {
        sinc_len: SINC_LEN,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 256,
        window: WindowFunction::BlackmanHarris2,
    };

    // Zero tail flushes the filter
    let chunk = frames + SINC_LEN;
    let mut resampler =
        SincFixedIn::<f32>::new(ratio, 2.0, params, chunk, track.channel_count())
            .map_err(|e| e.to_string())?;

    let input: Vec<Vec<f32>> = track
        .channels()
        .map(|channel| {
            let mut padded = Vec::with_capacity(chunk);
            padded.extend_from_slice(channel);
            padded.resize(chunk, 0.0);
            padded
        })
        .collect();

    let delay = resampler.output_delay();
    let output = resampler
        .process(&input, None)
        .map_err(|e| e.to_string())?;

    let channels = output
        .into_iter()
        .map(|channel| {
            let mut aligned: Vec<f32> = channel.into_iter().skip(delay).take(target_frames).collect();
            aligned.resize(target_frames, 0.0);
            aligned
        })
        .collect();

    AudioTrack::new(target_rate, channels).map_err(|e| e.to_string())
}
