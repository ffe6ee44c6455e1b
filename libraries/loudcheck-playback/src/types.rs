//! Core types for the audition transport

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Transport state
///
/// `Idle -> Loaded -> Playing <-> Paused`, and any state returns to `Idle`
/// on stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TransportState {
    /// No track loaded, no rendering graph
    #[default]
    Idle,

    /// Track loaded, graph built, not yet started
    Loaded,

    /// Rendering
    Playing,

    /// Rendering halted, position retained
    Paused,
}

impl fmt::Display for TransportState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Loaded => "loaded",
            Self::Playing => "playing",
            Self::Paused => "paused",
        };
        f.write_str(name)
    }
}

/// Which gain is live on the transport
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "camelCase")]
pub enum ActiveProfile {
    /// Unmodified track (0 dB)
    #[default]
    Original,

    /// Gain computed for a platform profile
    Platform(String),
}

impl ActiveProfile {
    /// Profile id, if a platform is active
    pub fn platform_id(&self) -> Option<&str> {
        match self {
            Self::Original => None,
            Self::Platform(id) => Some(id),
        }
    }
}

/// Transport configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportConfig {
    /// Time constant of the gain stage
    pub gain_smoothing: Duration,

    /// Minimum spacing between position updates
    pub position_interval: Duration,

    /// Per-subscriber event channel capacity
    pub event_capacity: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            gain_smoothing: Duration::from_millis(10),
            position_interval: Duration::from_millis(50),
            event_capacity: 64,
        }
    }
}
