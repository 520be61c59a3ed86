//! In-process topic hub.
//!
//! One `tokio::sync::broadcast` channel per topic, created on first
//! subscribe. Publishing to a topic nobody listens to is a no-op.

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::broadcast;

use super::{Broadcaster, ChatMessage, RelayError};

/// Default per-topic buffer.
pub const DEFAULT_CAPACITY: usize = 256;

/// Multi-topic broadcaster for connected sessions.
pub struct TopicHub {
    topics: DashMap<String, broadcast::Sender<ChatMessage>>,
    capacity: usize,
}

impl TopicHub {
    /// Creates a hub whose topics buffer `capacity` messages per subscriber.
    pub fn new(capacity: usize) -> Self {
        Self {
            topics: DashMap::new(),
            capacity: capacity.max(1),
        }
    }

    /// Subscribes to `topic`, creating it if needed.
    pub fn subscribe(&self, topic: &str) -> broadcast::Receiver<ChatMessage> {
        self.topics
            .entry(topic.to_string())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .subscribe()
    }

    /// Number of topics currently held.
    pub fn topic_count(&self) -> usize {
        self.topics.len()
    }

    /// Live receivers on `topic`.
    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.topics
            .get(topic)
            .map(|sender| sender.receiver_count())
            .unwrap_or(0)
    }

    /// Drops `topic` once its last receiver is gone. Returns whether it was removed.
    ///
    /// Call after the receiver has been dropped; a topic with live
    /// subscribers is kept.
    pub fn release(&self, topic: &str) -> bool {
        self.topics
            .remove_if(topic, |_, sender| sender.receiver_count() == 0)
            .is_some()
    }

    /// Sends `message` to `topic`; returns how many receivers got it.
    pub fn send(&self, topic: &str, message: &ChatMessage) -> usize {
        let delivered = match self.topics.get(topic) {
            Some(sender) => sender.send(message.clone()).unwrap_or(0),
            None => return 0,
        };
        if delivered == 0 {
            self.release(topic);
        }
        delivered
    }
}

impl Default for TopicHub {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl std::fmt::Debug for TopicHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TopicHub")
            .field("topics", &self.topics.len())
            .field("capacity", &self.capacity)
            .finish()
    }
}

#[async_trait]
impl Broadcaster for TopicHub {
    async fn publish(&self, channel: &str, message: &ChatMessage) -> Result<(), RelayError> {
        self.send(channel, message);
        Ok(())
    }
}
