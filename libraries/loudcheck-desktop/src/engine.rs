//! CPAL rendering engine
//!
//! `cpal::Stream` is not `Send` on every platform, so each graph gets a
//! dedicated device thread that owns its stream. The graph talks to that
//! thread over a channel and shares only the [`SharedRenderer`] with the
//! audio callback.

use crate::error::{Result, StudioError};
use crate::resample::resample_track;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::Stream;
use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
use loudcheck_core::AudioTrack;
use loudcheck_playback::{
    lock_renderer, PlaybackError, RenderEngine, RenderGraph, RenderSettings, Renderer,
    SharedRenderer,
};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, error, info, warn};

/// Commands sent to a device thread
enum DeviceCommand {
    /// Start the stream and report the outcome
    Start(Sender<std::result::Result<(), String>>),
    /// Pause the stream
    Halt,
    /// Drop the stream and exit
    Close,
}

/// Engine rendering through the default output device
#[derive(Debug, Clone)]
pub struct CpalEngine {
    sample_rate: u32,
    channels: u16,
}

impl CpalEngine {
    /// Create an engine for the default output device
    ///
    /// # Errors
    /// Returns an error if no output device is available
    pub fn new() -> Result<Self> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| StudioError::Device("No default output device".to_string()))?;
        let config = device.default_output_config()?;

        let engine = Self {
            sample_rate: config.sample_rate(),
            channels: config.channels(),
        };
        info!(
            "Output device: {} Hz, {} channels",
            engine.sample_rate, engine.channels
        );
        Ok(engine)
    }

    /// Device rate observed when the engine was created
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Device channel count observed when the engine was created
    pub fn channels(&self) -> u16 {
        self.channels
    }
}

impl RenderEngine for CpalEngine {
    type Graph = CpalGraph;

    fn build(
        &mut self,
        track: &AudioTrack,
        settings: RenderSettings,
    ) -> loudcheck_playback::Result<CpalGraph> {
        let (ready_tx, ready_rx) = bounded::<std::result::Result<SharedRenderer, String>>(1);
        let (command_tx, command_rx) = unbounded::<DeviceCommand>();

        let track = track.clone();
        let thread = thread::Builder::new()
            .name("loudcheck-device".to_string())
            .spawn(move || device_thread_run(track, settings, &ready_tx, &command_rx))
            .map_err(|e| PlaybackError::GraphBuild(e.to_string()))?;

        match ready_rx.recv() {
            Ok(Ok(renderer)) => Ok(CpalGraph {
                renderer,
                commands: command_tx,
                thread: Some(thread),
            }),
            Ok(Err(message)) => {
                let _ = thread.join();
                Err(PlaybackError::GraphBuild(message))
            }
            Err(_) => {
                let _ = thread.join();
                Err(PlaybackError::GraphBuild(
                    "Device thread exited during setup".to_string(),
                ))
            }
        }
    }
}

/// Open the default device and build a paused stream for `track`
fn open_stream(
    track: AudioTrack,
    settings: RenderSettings,
) -> std::result::Result<(Stream, SharedRenderer), String> {
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| "No default output device".to_string())?;
    let supported = device
        .default_output_config()
        .map_err(|e| e.to_string())?;

    let sample_rate = supported.sample_rate();
    let channels = supported.channels();
    let config = supported.config();

    let track = if track.sample_rate() == sample_rate {
        track
    } else {
        debug!(
            "Resampling {} Hz -> {} Hz",
            track.sample_rate(),
            sample_rate
        );
        resample_track(&track, sample_rate)?
    };

    let renderer = Renderer::new(track, channels, settings.gain_smoothing).into_shared();
    let callback_renderer = Arc::clone(&renderer);

    let stream = device
        .build_output_stream(
            &config,
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                lock_renderer(&callback_renderer).render(data);
            },
            |err| error!("Audio stream error: {}", err),
            None,
        )
        .map_err(|e| e.to_string())?;

    // Some hosts start streams on creation
    if let Err(e) = stream.pause() {
        debug!("Initial pause not supported: {}", e);
    }

    Ok((stream, renderer))
}

/// Device thread main loop; owns the stream until `Close`
fn device_thread_run(
    track: AudioTrack,
    settings: RenderSettings,
    ready: &Sender<std::result::Result<SharedRenderer, String>>,
    commands: &Receiver<DeviceCommand>,
) {
    let stream = match open_stream(track, settings) {
        Ok((stream, renderer)) => {
            let _ = ready.send(Ok(renderer));
            stream
        }
        Err(message) => {
            error!("Failed to build output stream: {}", message);
            let _ = ready.send(Err(message));
            return;
        }
    };

    while let Ok(command) = commands.recv() {
        match command {
            DeviceCommand::Start(reply) => {
                let result = stream.play().map_err(|e| e.to_string());
                if let Err(e) = &result {
                    error!("Failed to start output stream: {}", e);
                }
                let _ = reply.send(result);
            }
            DeviceCommand::Halt => {
                if let Err(e) = stream.pause() {
                    warn!("Failed to pause output stream: {}", e);
                }
            }
            DeviceCommand::Close => break,
        }
    }

    drop(stream);
    debug!("Device thread exiting");
}

/// Graph backed by a device thread
pub struct CpalGraph {
    renderer: SharedRenderer,
    commands: Sender<DeviceCommand>,
    thread: Option<JoinHandle<()>>,
}

impl RenderGraph for CpalGraph {
    fn renderer(&self) -> &SharedRenderer {
        &self.renderer
    }

    // cpal streams have no suspended state distinct from paused
    fn is_suspended(&self) -> bool {
        false
    }

    fn resume(&mut self) -> loudcheck_playback::Result<()> {
        Ok(())
    }

    fn start(&mut self) -> loudcheck_playback::Result<()> {
        let unavailable =
            || PlaybackError::RenderingUnavailable("Device thread has exited".to_string());

        let (reply_tx, reply_rx) = bounded(1);
        self.commands
            .send(DeviceCommand::Start(reply_tx))
            .map_err(|_| unavailable())?;

        match reply_rx.recv() {
            Ok(Ok(())) => Ok(()),
            Ok(Err(message)) => Err(PlaybackError::RenderingUnavailable(message)),
            Err(_) => Err(unavailable()),
        }
    }

    fn halt(&mut self) {
        let _ = self.commands.send(DeviceCommand::Halt);
    }

    fn close(&mut self) {
        if let Some(thread) = self.thread.take() {
            let _ = self.commands.send(DeviceCommand::Close);
            if thread.join().is_err() {
                error!("Device thread panicked");
            }
        }
    }
}

impl Drop for CpalGraph {
    fn drop(&mut self) {
        self.close();
    }
}
