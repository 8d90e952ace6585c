//! Per-key work queue.
//!
//! A key is either idle, queued once, or in flight. Enqueuing an in-flight
//! key marks it dirty and it is queued again when its pass finishes, so one
//! key never has two passes running while no trigger is lost.

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};

use tokio::sync::mpsc;

use cloudctl_core::ObjectKey;

#[derive(Debug, Default)]
struct QueueState {
    queued: HashSet<ObjectKey>,
    in_flight: HashSet<ObjectKey>,
    dirty: HashSet<ObjectKey>,
}

pub struct KeyedQueue {
    state: Mutex<QueueState>,
    sender: mpsc::UnboundedSender<ObjectKey>,
    receiver: tokio::sync::Mutex<mpsc::UnboundedReceiver<ObjectKey>>,
}

impl KeyedQueue {
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self {
            state: Mutex::new(QueueState::default()),
            sender,
            receiver: tokio::sync::Mutex::new(receiver),
        }
    }

    fn state(&self) -> MutexGuard<'_, QueueState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Returns `false` if the key was already waiting.
    pub fn enqueue(&self, key: ObjectKey) -> bool {
        let mut state = self.state();
        if state.in_flight.contains(&key) {
            return state.dirty.insert(key);
        }
        if !state.queued.insert(key.clone()) {
            return false;
        }
        // The receiver lives as long as the queue.
        let _ = self.sender.send(key);
        true
    }

    /// Waits for the next key and marks it in flight.
    pub async fn next(&self) -> Option<ObjectKey> {
        let key = self.receiver.lock().await.recv().await?;
        let mut state = self.state();
        state.queued.remove(&key);
        state.in_flight.insert(key.clone());
        Some(key)
    }

    /// Ends the pass for `key`, requeueing it if it was triggered meanwhile.
    pub fn done(&self, key: &ObjectKey) {
        let mut state = self.state();
        state.in_flight.remove(key);
        if state.dirty.remove(key) {
            state.queued.insert(key.clone());
            let _ = self.sender.send(key.clone());
        }
    }

    pub fn is_in_flight(&self, key: &ObjectKey) -> bool {
        self.state().in_flight.contains(key)
    }

    pub fn is_idle(&self) -> bool {
        let state = self.state();
        state.queued.is_empty() && state.in_flight.is_empty()
    }
}

impl Default for KeyedQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cloudctl_core::ResourceKind;

    fn key(name: &str) -> ObjectKey {
        ObjectKey::new(ResourceKind::Product, "team-a", name)
    }

    #[tokio::test]
    async fn test_enqueue_coalesces() {
        let queue = KeyedQueue::new();
        assert!(queue.enqueue(key("a")));
        assert!(!queue.enqueue(key("a")));
        assert!(queue.enqueue(key("b")));

        assert_eq!(queue.next().await, Some(key("a")));
        assert_eq!(queue.next().await, Some(key("b")));
        queue.done(&key("a"));
        queue.done(&key("b"));
        assert!(queue.is_idle());
    }

    #[tokio::test]
    async fn test_in_flight_key_is_redelivered_once_after_done() {
        let queue = KeyedQueue::new();
        queue.enqueue(key("a"));
        let first = queue.next().await.unwrap();
        assert!(queue.is_in_flight(&first));

        assert!(queue.enqueue(key("a")));
        assert!(!queue.enqueue(key("a")));
        assert!(!queue.is_idle());

        queue.done(&first);
        assert!(!queue.is_in_flight(&first));
        assert_eq!(queue.next().await, Some(key("a")));
        queue.done(&key("a"));
        assert!(queue.is_idle());
    }
}
