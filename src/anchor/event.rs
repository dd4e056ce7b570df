//! Insert notifications and the sinks that receive them.
//!
//! The anchor never talks to observers directly; it hands each committed
//! event to an injected [`EventSink`].

use core::fmt;
use std::sync::mpsc;

use serde::{Deserialize, Serialize};

use crate::types::Leaf;

/// Emitted once per successful `insert_leaf`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeafInserted {
    /// The inserted leaf.
    #[serde(with = "hex_digest")]
    pub leaf: Leaf,
    /// Zero-based position of the leaf.
    pub index: u32,
    /// Root after the insert.
    #[serde(with = "hex_digest")]
    pub root: Leaf,
}

/// Wire form of anchor notifications, tagged on `"event"`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum AnchorEvent {
    LeafInserted(LeafInserted),
}

impl AnchorEvent {
    /// Encode as a JSON payload.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Decode a JSON payload.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

impl From<LeafInserted> for AnchorEvent {
    fn from(event: LeafInserted) -> Self {
        Self::LeafInserted(event)
    }
}

/// Receives anchor notifications.
pub trait EventSink {
    /// Deliver one event.
    fn emit(&mut self, event: AnchorEvent);
}

impl<E: EventSink + ?Sized> EventSink for &mut E {
    fn emit(&mut self, event: AnchorEvent) {
        (**self).emit(event)
    }
}

/// Buffers events in order.
impl EventSink for Vec<AnchorEvent> {
    fn emit(&mut self, event: AnchorEvent) {
        self.push(event);
    }
}

/// Drops every event.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoopSink;

impl EventSink for NoopSink {
    fn emit(&mut self, _event: AnchorEvent) {}
}

impl EventSink for mpsc::Sender<AnchorEvent> {
    fn emit(&mut self, event: AnchorEvent) {
        // Receiver gone means nobody is listening.
        let _ = self.send(event);
    }
}

#[cfg(feature = "runtime")]
impl EventSink for tokio::sync::broadcast::Sender<AnchorEvent> {
    fn emit(&mut self, event: AnchorEvent) {
        let _ = self.send(event);
    }
}

/// Handle returned by [`ListenerRegistry::subscribe`].
pub type ListenerId = u64;

type Listener = Box<dyn FnMut(&AnchorEvent) + Send>;

/// Callback fan-out with subscribe/unsubscribe.
#[derive(Default)]
pub struct ListenerRegistry {
    next_id: ListenerId,
    listeners: Vec<(ListenerId, Listener)>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback; it sees every event emitted afterwards.
    pub fn subscribe<F>(&mut self, listener: F) -> ListenerId
    where
        F: FnMut(&AnchorEvent) + Send + 'static,
    {
        let id = self.next_id;
        self.next_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Remove a callback. Returns `false` if `id` was not registered.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener_id, _)| *listener_id != id);
        self.listeners.len() != before
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

impl EventSink for ListenerRegistry {
    fn emit(&mut self, event: AnchorEvent) {
        for (_, listener) in &mut self.listeners {
            listener(&event);
        }
    }
}

impl fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerRegistry")
            .field("next_id", &self.next_id)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

/// Serde adapter writing digests as lowercase hex strings.
mod hex_digest {
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    use crate::types::Leaf;

    pub fn serialize<S: Serializer>(digest: &Leaf, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(digest))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Leaf, D::Error> {
        let raw = String::deserialize(deserializer)?;
        let bytes = hex::decode(&raw).map_err(D::Error::custom)?;
        bytes
            .try_into()
            .map_err(|b: Vec<u8>| D::Error::custom(format!("expected 32 bytes, got {}", b.len())))
    }
}
