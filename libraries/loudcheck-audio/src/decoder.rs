/// PCM source implementation using Symphonia
use crate::error::{AudioError, Result};
use loudcheck_core::{AudioTrack, CoreError, PcmSource};
use std::fs::File;
use std::path::Path;
use symphonia::core::audio::{AudioBuffer, AudioBufferRef, Signal};
use symphonia::core::codecs::{Decoder, DecoderOptions};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::core::sample::Sample;
use tracing::{debug, info, warn};

/// File extensions this source is expected to handle
const SUPPORTED_EXTENSIONS: &[&str] = &["mp3", "flac", "ogg", "oga", "wav", "m4a", "mp4", "aac"];

/// PCM source using Symphonia
///
/// Decodes the whole file into memory. Unlike a playback decoder it never
/// downmixes or resamples: loudness analysis needs every channel exactly as
/// stored, and the transport maps channels at render time.
#[derive(Debug, Default)]
pub struct SymphoniaSource {
    _private: (),
}

/// Opened container with the decoder for its default track
struct OpenedFile {
    format: Box<dyn FormatReader>,
    decoder: Box<dyn Decoder>,
    track_id: u32,
    sample_rate: Option<u32>,
}

impl SymphoniaSource {
    /// Create a new source
    pub fn new() -> Self {
        Self::default()
    }

    /// Probe a file and build a decoder for its default track
    fn open(path: &Path) -> Result<OpenedFile> {
        if !path.exists() {
            return Err(AudioError::FileNotFound(path.display().to_string()));
        }

        let file = File::open(path)?;
        let mss = MediaSourceStream::new(Box::new(file), Default::default());

        // Create a hint to help the format registry guess the format
        let mut hint = Hint::new();
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            hint.with_extension(ext);
        }

        let probed = symphonia::default::get_probe().format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )?;

        let format = probed.format;
        let track = format
            .default_track()
            .ok_or_else(|| AudioError::DecodeError("No audio tracks found".to_string()))?;

        let track_id = track.id;
        let sample_rate = track.codec_params.sample_rate;
        let decoder = symphonia::default::get_codecs()
            .make(&track.codec_params, &DecoderOptions::default())?;

        Ok(OpenedFile {
            format,
            decoder,
            track_id,
            sample_rate,
        })
    }

    /// Decode every packet of the default track into planar f32 channels
    fn decode_planar(opened: &mut OpenedFile) -> Result<(u32, Vec<Vec<f32>>)> {
        let mut planar: Vec<Vec<f32>> = Vec::new();
        let mut sample_rate = opened.sample_rate;

        loop {
            let packet = match opened.format.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    break;
                }
                Err(SymphoniaError::ResetRequired) => {
                    opened.decoder.reset();
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            // Skip packets that are not for the default track
            if packet.track_id() != opened.track_id {
                continue;
            }

            let decoded = match opened.decoder.decode(&packet) {
                Ok(decoded) => decoded,
                Err(SymphoniaError::DecodeError(msg)) => {
                    // Corrupt frame; symphonia recovers on the next packet
                    warn!("Skipping undecodable packet: {}", msg);
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            let spec = *decoded.spec();
            sample_rate.get_or_insert(spec.rate);
            if planar.is_empty() {
                planar = vec![Vec::new(); spec.channels.count()];
            }

            Self::append_planar_f32(decoded, &mut planar);
        }

        let sample_rate = sample_rate
            .ok_or_else(|| AudioError::DecodeError("Unknown sample rate".to_string()))?;
        Ok((sample_rate, planar))
    }

    /// Append one decoded buffer of any sample format to the planar output
    ///
    /// Signed integers are scaled symmetrically (divide by 2^(N-1)), unsigned
    /// integers are centred around zero. Float formats pass through unclamped.
    fn append_planar_f32(decoded: AudioBufferRef, planar: &mut [Vec<f32>]) {
        match decoded {
            AudioBufferRef::F32(buf) => Self::append_channels(&buf, planar, |s| s),
            AudioBufferRef::F64(buf) => Self::append_channels(&buf, planar, |s| s as f32),
            AudioBufferRef::S8(buf) => Self::append_channels(&buf, planar, |s| s as f32 / 128.0),
            AudioBufferRef::S16(buf) => {
                Self::append_channels(&buf, planar, |s| s as f32 / 32768.0);
            }
            AudioBufferRef::S24(buf) => {
                Self::append_channels(&buf, planar, |s| s.inner() as f32 / 8388608.0);
            }
            AudioBufferRef::S32(buf) => {
                Self::append_channels(&buf, planar, |s| s as f32 / 2147483648.0);
            }
            AudioBufferRef::U8(buf) => {
                Self::append_channels(&buf, planar, |s| (s as f32 / u8::MAX as f32) * 2.0 - 1.0);
            }
            AudioBufferRef::U16(buf) => {
                Self::append_channels(&buf, planar, |s| (s as f32 / u16::MAX as f32) * 2.0 - 1.0);
            }
            AudioBufferRef::U24(buf) => {
                Self::append_channels(&buf, planar, |s| (s.inner() as f32 / 16777215.0) * 2.0 - 1.0);
            }
            AudioBufferRef::U32(buf) => {
                Self::append_channels(&buf, planar, |s| (s as f32 / u32::MAX as f32) * 2.0 - 1.0);
            }
        }
    }

    /// Generic planar copy with a per-format normalization function
    fn append_channels<T, F>(buf: &AudioBuffer<T>, planar: &mut [Vec<f32>], normalize: F)
    where
        T: Sample,
        F: Fn(T) -> f32,
    {
        let channels = buf.spec().channels.count().min(planar.len());
        for (ch, out) in planar.iter_mut().enumerate().take(channels) {
            out.extend(buf.chan(ch).iter().map(|&s| normalize(s)));
        }
    }
}

impl PcmSource for SymphoniaSource {
    fn decode(&mut self, path: &Path) -> loudcheck_core::Result<AudioTrack> {
        debug!("Decoding {}", path.display());

        let mut opened = Self::open(path)?;
        let (sample_rate, planar) = Self::decode_planar(&mut opened)?;

        let track = AudioTrack::new(sample_rate, planar).map_err(|e| {
            CoreError::decode_failure(format!("{} did not decode to a usable track: {}", path.display(), e))
        })?;

        info!(
            "Decoded {}: {} Hz, {} channel(s), {:.2}s",
            path.display(),
            track.sample_rate(),
            track.channel_count(),
            track.duration_secs()
        );
        Ok(track)
    }

    fn supports_format(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|ext| SUPPORTED_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
            .unwrap_or(false)
    }
}
