//! Environment change notifications.
//!
//! Providers broadcast [`EnvironmentEvent`]s; the search-path service drops
//! the caches that depend on environment variables when it sees one.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::debug;

/// Broadcast channel capacity for environment events
const CHANNEL_CAPACITY: usize = 16;

/// Signals emitted by an environment provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EnvironmentEvent {
    /// Some environment variable may have changed value.
    VariablesChanged,
}

/// Fan-out of environment events to any number of subscribers.
#[derive(Debug, Clone)]
pub struct EnvironmentEventBroadcaster {
    sender: broadcast::Sender<EnvironmentEvent>,
}

impl EnvironmentEventBroadcaster {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    /// Broadcast an event to all current subscribers.
    pub fn broadcast(&self, event: EnvironmentEvent) {
        debug!(
            ?event,
            subscribers = self.sender.receiver_count(),
            "Broadcasting environment event"
        );
        // No subscribers is not an error
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EnvironmentEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EnvironmentEventBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_broadcast_without_subscribers_is_silent() {
        let broadcaster = EnvironmentEventBroadcaster::new();
        broadcaster.broadcast(EnvironmentEvent::VariablesChanged);
        assert_eq!(broadcaster.subscriber_count(), 0);
    }

    #[test]
    fn test_subscriber_receives_event() {
        let broadcaster = EnvironmentEventBroadcaster::new();
        let mut rx = broadcaster.subscribe();
        broadcaster.broadcast(EnvironmentEvent::VariablesChanged);
        assert_eq!(rx.try_recv().unwrap(), EnvironmentEvent::VariablesChanged);
    }

    #[test]
    fn test_wire_format() {
        let json = serde_json::to_string(&EnvironmentEvent::VariablesChanged).unwrap();
        assert_eq!(json, r#"{"type":"variables_changed"}"#);
    }
}
