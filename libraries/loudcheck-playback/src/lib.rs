//! Loudcheck - Audition Transport
//!
//! Platform-agnostic playback transport that renders one track at a time
//! through a smoothed gain stage.
//!
//! This crate provides:
//! - Transport state machine (Idle, Loaded, Playing, Paused)
//! - Seek with silent clamping to the track bounds
//! - Click-free gain changes (one-pole smoothing, ~10 ms)
//! - Channel mapping from track layout to device layout
//! - Event subscriptions with bounded-rate position updates
//!
//! # Architecture
//!
//! `loudcheck-playback` has no dependency on any audio API. Platform code
//! implements [`RenderEngine`] and [`RenderGraph`]; the transport only sees
//! those traits and the shared [`Renderer`].
//!
//! ```text
//! control timeline                    rendering timeline
//! ┌───────────────────┐   build      ┌──────────────┐
//! │ PlaybackTransport │ ───────────► │ RenderGraph  │ (device callback)
//! └───────────────────┘              └──────────────┘
//!           │  seek / gain                   │ pull
//!           ▼                                ▼
//!        ┌──────────────── SharedRenderer ────────────────┐
//!        │ cursor · GainRamp · channel mapping            │
//!        └────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust
//! use loudcheck_core::AudioTrack;
//! use loudcheck_playback::{
//!     ActiveProfile, ManualEngine, PlaybackTransport, TransportConfig, TransportEvent,
//!     TransportState,
//! };
//!
//! let mut transport = PlaybackTransport::new(ManualEngine::new(2), TransportConfig::default());
//! let events = transport.subscribe();
//!
//! let track = AudioTrack::new(48_000, vec![vec![0.25; 48_000]]).unwrap();
//! transport.load(track).unwrap();
//! transport.play().unwrap();
//!
//! // Audition the track as a platform would play it
//! transport
//!     .select_profile(ActiveProfile::Platform("spotify".into()), -4.5)
//!     .unwrap();
//! assert_eq!(transport.state(), TransportState::Playing);
//!
//! transport.seek(30.0).unwrap(); // clamps to the 1 s duration
//! assert_eq!(transport.position_secs(), 1.0);
//!
//! transport.stop();
//! assert!(events
//!     .try_iter()
//!     .any(|e| e == TransportEvent::StateChanged { state: TransportState::Idle }));
//! ```

#![forbid(unsafe_code)]

mod engine;
mod error;
mod events;
mod gain;
mod renderer;
mod transport;
pub mod types;

// Public exports
pub use engine::{ManualEngine, ManualGraph, RenderEngine, RenderGraph, RenderSettings};
pub use error::{PlaybackError, Result};
pub use events::TransportEvent;
pub use gain::GainRamp;
pub use renderer::{lock_renderer, Renderer, SharedRenderer};
pub use transport::PlaybackTransport;
pub use types::{ActiveProfile, TransportConfig, TransportState};
