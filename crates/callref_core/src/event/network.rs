//! Network layer contract for remote event delivery.

use crate::codec::args::EncodedArgs;
use log::debug;
use parking_lot::Mutex;

/// Fan-out limit attached to every remote event.
pub const MAX_FANOUT: u16 = 65535;

/// Remote peer id. `-1` addresses every connected peer.
pub type PeerId = i32;

/// Peer id used for broadcast and as the source id of local triggers.
pub const ALL_PEERS: PeerId = -1;

/// Ships already-encoded events to remote peers.
pub trait NetworkSink: Send + Sync {
    fn send_event(
        &self,
        event_name: &str,
        payload: &EncodedArgs,
        peer_id: PeerId,
        max_fanout: u16,
    );
}

/// Sink for hosts without a network layer; drops every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullNetwork;

impl NetworkSink for NullNetwork {
    fn send_event(
        &self,
        event_name: &str,
        payload: &EncodedArgs,
        peer_id: PeerId,
        _max_fanout: u16,
    ) {
        debug!(
            "event=remote_send module=event status=dropped name={} peer_id={} bytes={}",
            event_name,
            peer_id,
            payload.len()
        );
    }
}

/// One event queued for remote delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundEvent {
    pub event_name: String,
    pub payload: EncodedArgs,
    pub peer_id: PeerId,
    pub max_fanout: u16,
}

/// In-memory outbox the host drains on its own network turn.
#[derive(Debug, Default)]
pub struct EventOutbox {
    queued: Mutex<Vec<OutboundEvent>>,
}

impl EventOutbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes every queued event in send order.
    pub fn drain(&self) -> Vec<OutboundEvent> {
        std::mem::take(&mut *self.queued.lock())
    }

    pub fn len(&self) -> usize {
        self.queued.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.queued.lock().is_empty()
    }
}

impl NetworkSink for EventOutbox {
    fn send_event(
        &self,
        event_name: &str,
        payload: &EncodedArgs,
        peer_id: PeerId,
        max_fanout: u16,
    ) {
        self.queued.lock().push(OutboundEvent {
            event_name: event_name.to_string(),
            payload: payload.clone(),
            peer_id,
            max_fanout,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::{EventOutbox, NetworkSink, MAX_FANOUT};
    use crate::codec::args::EncodedArgs;

    #[test]
    fn outbox_drains_in_send_order() {
        let outbox = EventOutbox::new();
        outbox.send_event("first", &EncodedArgs::nil(), 1, MAX_FANOUT);
        outbox.send_event("second", &EncodedArgs::nil(), 2, MAX_FANOUT);
        assert_eq!(outbox.len(), 2);

        let drained = outbox.drain();
        assert_eq!(drained[0].event_name, "first");
        assert_eq!(drained[1].peer_id, 2);
        assert!(outbox.is_empty());
    }
}
