//! Notifications pushed to browser tabs.
//!
//! [`ServerEvent`] is the wire type. Anything able to deliver it implements
//! [`Broadcast`]; the server uses [`NotificationBroadcaster`], a
//! `tokio::sync::broadcast` channel that every WebSocket connection
//! subscribes to.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Event sent to clients as a JSON text frame.
///
/// Serialized as `{"type": "...", "data": {...}}`. Absent optional fields are
/// omitted rather than sent as `null`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ServerEvent {
    /// A new document got a route.
    FileAdded {
        route: String,
        file: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        title: Option<String>,
    },

    /// A document or something it pulls in changed.
    FileChange {
        /// Route of the changed document itself
        #[serde(default, skip_serializing_if = "Option::is_none")]
        route: Option<String>,
        /// Routes of documents that include the changed file
        #[serde(default, skip_serializing_if = "Option::is_none")]
        affected_routes: Option<Vec<String>>,
    },

    /// A document lost its route. `file` is the display file name.
    FileRemove { file: String },
}

impl ServerEvent {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Message a client may send after connecting.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ClientEvent {
    /// Sent once the socket opens, with the page the tab is showing.
    Connect { path: String },
}

/// Delivers server events to whoever is listening.
pub trait Broadcast: Send + Sync {
    /// Fire and forget. Delivery failures are never reported back.
    fn broadcast(&self, event: ServerEvent);
}

/// Fan-out channel shared by all WebSocket connections.
#[derive(Clone)]
pub struct NotificationBroadcaster {
    sender: broadcast::Sender<ServerEvent>,
}

impl NotificationBroadcaster {
    /// Create a broadcaster. Slow receivers lag once `capacity` events queue up.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn send(&self, event: ServerEvent) {
        match self.sender.send(event) {
            Ok(count) => {
                crate::debug_event!("broadcast", "sent", "to {count} subscribers");
            }
            Err(broadcast::error::SendError(event)) => {
                crate::debug_event!("broadcast", "dropped", "no subscribers for {event:?}");
            }
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ServerEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Broadcast for NotificationBroadcaster {
    fn broadcast(&self, event: ServerEvent) {
        self.send(event);
    }
}
