//! Transport Events
//!
//! Observer channel for presentation shells. Events are emitted at key points:
//! - State changes (load/play/pause/stop/end of track)
//! - Position updates (on seek, and rate-limited while playing)
//! - Gain changes (profile selection)
//! - Recoverable errors (rendering engine refused to start)
//!
//! Every subscriber owns a bounded channel. Delivery never blocks the control
//! timeline: a full subscriber misses events, a dropped receiver is pruned.

use crate::types::{ActiveProfile, TransportState};
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Events emitted by the transport
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TransportEvent {
    /// Transport state changed
    StateChanged {
        /// The new state
        state: TransportState,
    },

    /// Observable position changed
    PositionUpdate {
        /// Current position in seconds
        position_secs: f64,
        /// Track duration in seconds
        duration_secs: f64,
    },

    /// Target gain changed
    GainChanged {
        /// New gain in dB
        gain_db: f64,
        /// Profile the gain belongs to
        profile: ActiveProfile,
    },

    /// Rendering reached the end of the track
    TrackEnded,

    /// Recoverable error on the control timeline
    Error {
        /// Error message
        message: String,
    },
}

/// Fan-out of transport events to subscribers
#[derive(Debug)]
pub(crate) struct EventHub {
    subscribers: Vec<Sender<TransportEvent>>,
    capacity: usize,
}

impl EventHub {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            subscribers: Vec::new(),
            capacity: capacity.max(1),
        }
    }

    pub(crate) fn subscribe(&mut self) -> Receiver<TransportEvent> {
        let (tx, rx) = bounded(self.capacity);
        self.subscribers.push(tx);
        rx
    }

    pub(crate) fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    pub(crate) fn emit(&mut self, event: TransportEvent) {
        self.subscribers
            .retain(|tx| match tx.try_send(event.clone()) {
                Ok(()) => true,
                Err(TrySendError::Full(_)) => {
                    trace!("Subscriber full, dropping {:?}", event);
                    true
                }
                Err(TrySendError::Disconnected(_)) => false,
            });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_subscriber_receives() {
        let mut hub = EventHub::new(4);
        let a = hub.subscribe();
        let b = hub.subscribe();

        hub.emit(TransportEvent::TrackEnded);

        assert_eq!(a.try_recv(), Ok(TransportEvent::TrackEnded));
        assert_eq!(b.try_recv(), Ok(TransportEvent::TrackEnded));
    }

    #[test]
    fn full_subscriber_drops_newest() {
        let mut hub = EventHub::new(1);
        let rx = hub.subscribe();

        hub.emit(TransportEvent::TrackEnded);
        hub.emit(TransportEvent::StateChanged {
            state: TransportState::Paused,
        });

        assert_eq!(rx.try_recv(), Ok(TransportEvent::TrackEnded));
        assert!(rx.try_recv().is_err());
        assert_eq!(hub.subscriber_count(), 1);
    }

    #[test]
    fn dropped_receivers_are_pruned() {
        let mut hub = EventHub::new(4);
        let rx = hub.subscribe();
        drop(rx);

        hub.emit(TransportEvent::TrackEnded);
        assert_eq!(hub.subscriber_count(), 0);
    }
}
