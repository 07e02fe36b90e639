//! Local event dispatch coordinator.
//!
//! # Responsibility
//! - Run locally registered handlers in registration order under one
//!   cancellation flag per dispatch.
//! - Forward remote triggers and gate remote acceptance on the whitelist.
//!
//! # Invariants
//! - A handler whose owning instance is not live is never invoked.
//! - Handlers of stopped or errored instances are dropped at the next
//!   dispatch that meets them.

use crate::callref::owner::Owner;
use crate::codec::args::{CodecError, EncodedArgs};
use crate::event::network::{NetworkSink, PeerId, ALL_PEERS, MAX_FANOUT};
use log::{debug, info, warn};
use parking_lot::RwLock;
use std::collections::{BTreeMap, BTreeSet};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cancellation flag scoped to one dispatch.
///
/// Advisory only: setting it never interrupts handlers, it only changes the
/// dispatch outcome reported to the trigger caller.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the flag. Idempotent.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Origin of one dispatched event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventSource {
    /// Triggered inside this process.
    Local,
    /// Accepted from a remote peer.
    Peer(PeerId),
}

impl EventSource {
    /// Numeric source id handed to handlers; local triggers use `-1`.
    pub fn source_id(self) -> PeerId {
        match self {
            Self::Local => ALL_PEERS,
            Self::Peer(peer_id) => peer_id,
        }
    }
}

/// Destination of a trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventTarget {
    Local,
    Remote(PeerId),
}

/// Per-handler view of the dispatch in progress.
#[derive(Debug)]
pub struct EventScope<'a> {
    event_name: &'a str,
    source: EventSource,
    payload: &'a EncodedArgs,
    flag: &'a CancellationFlag,
}

impl<'a> EventScope<'a> {
    pub fn event_name(&self) -> &'a str {
        self.event_name
    }

    pub fn source(&self) -> EventSource {
        self.source
    }

    pub fn payload(&self) -> &'a EncodedArgs {
        self.payload
    }

    /// Cancels the dispatch this handler runs in.
    pub fn cancel(&self) {
        self.flag.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.is_cancelled()
    }
}

type EventHandlerFn = dyn Fn(&EventScope<'_>) + Send + Sync;

#[derive(Clone)]
struct RegisteredHandler {
    owner: Owner,
    handler: Arc<EventHandlerFn>,
}

/// Event dispatch and remote-forwarding errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventError {
    /// A remote peer triggered an event no extension whitelisted.
    NotWhitelisted(String),
    /// Argument encoding failed before the event could be sent.
    Codec(CodecError),
}

impl Display for EventError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotWhitelisted(name) => {
                write!(f, "event is not allowed from remote peers: {name}")
            }
            Self::Codec(err) => write!(f, "{err}"),
        }
    }
}

impl Error for EventError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Codec(err) => Some(err),
            Self::NotWhitelisted(_) => None,
        }
    }
}

impl From<CodecError> for EventError {
    fn from(value: CodecError) -> Self {
        Self::Codec(value)
    }
}

/// Registry of event handlers plus the remote whitelist.
pub struct EventDispatcher {
    handlers: RwLock<BTreeMap<String, Vec<RegisteredHandler>>>,
    whitelist: RwLock<BTreeSet<String>>,
    network: Arc<dyn NetworkSink>,
    max_fanout: u16,
}

impl EventDispatcher {
    pub fn new(network: Arc<dyn NetworkSink>) -> Self {
        Self {
            handlers: RwLock::new(BTreeMap::new()),
            whitelist: RwLock::new(BTreeSet::new()),
            network,
            max_fanout: MAX_FANOUT,
        }
    }

    pub fn with_max_fanout(mut self, max_fanout: u16) -> Self {
        self.max_fanout = max_fanout;
        self
    }

    /// Appends a handler for `event_name` owned by `owner`.
    pub fn add_handler(
        &self,
        event_name: &str,
        owner: Owner,
        handler: impl Fn(&EventScope<'_>) + Send + Sync + 'static,
    ) {
        self.handlers
            .write()
            .entry(event_name.to_string())
            .or_default()
            .push(RegisteredHandler {
                owner,
                handler: Arc::new(handler),
            });
    }

    /// Drops handlers whose owning instance was stopped or failed; returns
    /// how many. A reload stops the outgoing instance, so its handlers go
    /// while the new instance's stay.
    pub fn prune_retired(&self) -> usize {
        let mut handlers = self.handlers.write();
        let mut removed = 0;
        for entries in handlers.values_mut() {
            let before = entries.len();
            entries.retain(|entry| !entry.owner.is_retired());
            removed += before - entries.len();
        }
        handlers.retain(|_, entries| !entries.is_empty());
        if removed > 0 {
            info!(
                "event=handler_prune module=event status=ok removed={}",
                removed
            );
        }
        removed
    }

    pub fn handler_count(&self, event_name: &str) -> usize {
        self.handlers.read().get(event_name).map_or(0, Vec::len)
    }

    /// Creates the flag for a new dispatch.
    pub fn begin_dispatch(&self) -> CancellationFlag {
        CancellationFlag::new()
    }

    pub fn cancel(&self, flag: &CancellationFlag) {
        flag.cancel();
    }

    pub fn is_cancelled(&self, flag: &CancellationFlag) -> bool {
        flag.is_cancelled()
    }

    /// Triggers `event_name` locally or forwards it to one remote peer.
    ///
    /// Local triggers return `true` unless a handler cancelled the dispatch.
    /// Remote triggers always return `true` once handed to the network.
    pub fn trigger(&self, event_name: &str, payload: &EncodedArgs, target: EventTarget) -> bool {
        match target {
            EventTarget::Local => self.dispatch(event_name, payload, EventSource::Local),
            EventTarget::Remote(peer_id) => {
                self.network
                    .send_event(event_name, payload, peer_id, self.max_fanout);
                debug!(
                    "event=event_send module=event status=ok name={} peer_id={} bytes={}",
                    event_name,
                    peer_id,
                    payload.len()
                );
                true
            }
        }
    }

    /// Marks `event_name` as triggerable by remote peers.
    pub fn whitelist_event(&self, event_name: &str) {
        self.whitelist.write().insert(event_name.to_string());
    }

    pub fn is_whitelisted(&self, event_name: &str) -> bool {
        self.whitelist.read().contains(event_name)
    }

    /// Acceptance path for events arriving from remote peers.
    ///
    /// # Errors
    /// - `NotWhitelisted` when no extension registered `event_name`.
    pub fn accept_remote_event(
        &self,
        event_name: &str,
        payload: &EncodedArgs,
        peer_id: PeerId,
    ) -> Result<bool, EventError> {
        if !self.is_whitelisted(event_name) {
            warn!(
                "event=remote_accept module=event status=rejected name={} peer_id={}",
                event_name, peer_id
            );
            return Err(EventError::NotWhitelisted(event_name.to_string()));
        }
        Ok(self.dispatch(event_name, payload, EventSource::Peer(peer_id)))
    }

    fn dispatch(&self, event_name: &str, payload: &EncodedArgs, source: EventSource) -> bool {
        // Snapshot so handlers may register handlers or trigger nested events.
        let handlers = self
            .handlers
            .read()
            .get(event_name)
            .cloned()
            .unwrap_or_default();

        let flag = self.begin_dispatch();
        let scope = EventScope {
            event_name,
            source,
            payload,
            flag: &flag,
        };
        let mut invoked = 0;
        let mut saw_retired = false;
        for entry in &handlers {
            // Liveness is read per handler: an earlier handler may stop an owner.
            if !entry.owner.is_live() {
                saw_retired |= entry.owner.is_retired();
                continue;
            }
            (entry.handler)(&scope);
            invoked += 1;
        }

        let cancelled = self.is_cancelled(&flag);
        debug!(
            "event=event_dispatch module=event status={} name={} source_id={} handlers={} skipped={}",
            if cancelled { "cancelled" } else { "ok" },
            event_name,
            source.source_id(),
            invoked,
            handlers.len() - invoked
        );
        if saw_retired {
            self.prune_retired();
        }
        !cancelled
    }
}
