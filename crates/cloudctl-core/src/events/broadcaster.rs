//! Event bus shared by the store and every controller.

use std::sync::Arc;
use tokio::sync::broadcast;

use super::types::ResourceEvent;
use crate::meta::ObjectKey;

/// Events beyond this limit are dropped for slow receivers, which then see
/// `RecvError::Lagged` and must resync.
const DEFAULT_BUFFER_SIZE: usize = 1024;

#[derive(Clone)]
pub struct EventBroadcaster {
    sender: broadcast::Sender<ResourceEvent>,
}

impl EventBroadcaster {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_BUFFER_SIZE)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Returns the number of subscribers that received the event.
    pub fn send(&self, event: ResourceEvent) -> usize {
        tracing::trace!(
            event_type = %event.event_type,
            key = %event.key,
            "broadcasting resource event"
        );
        self.sender.send(event).unwrap_or_default()
    }

    pub fn send_created(&self, key: ObjectKey) -> usize {
        self.send(ResourceEvent::created(key))
    }

    pub fn send_deleted(&self, key: ObjectKey) -> usize {
        self.send(ResourceEvent::deleted(key))
    }

    /// Events sent before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<ResourceEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    pub fn has_subscribers(&self) -> bool {
        self.sender.receiver_count() > 0
    }
}

impl Default for EventBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventBroadcaster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBroadcaster")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}
