//! Message relay — stamps chat messages and fans them out to topic channels.
//!
//! Every message goes to the recipient's channel and then to the sender's
//! own channel, so the sender's other sessions see what they sent. The
//! server clock is the only source of message time.

pub mod hub;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Local, SecondsFormat};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

pub use hub::TopicHub;

/// Prefix of every per-user delivery channel.
pub const CHANNEL_PREFIX: &str = "topic/messages/";

/// Errors raised while delivering a relayed message.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("Failed to publish to {channel}: {reason}")]
    Publish { channel: String, reason: String },
}

/// A direct chat message between two users.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    #[serde(default)]
    pub sender: String,
    #[serde(default)]
    pub recipient: String,
    #[serde(default)]
    pub content: String,
    /// Server-assigned; whatever the client sends is replaced.
    #[serde(default)]
    pub timestamp: Option<String>,
}

impl ChatMessage {
    pub fn new(
        sender: impl Into<String>,
        recipient: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            sender: sender.into(),
            recipient: recipient.into(),
            content: content.into(),
            timestamp: None,
        }
    }
}

/// Delivery capability behind the relay.
#[async_trait]
pub trait Broadcaster: Send + Sync {
    /// Delivers `message` to every subscriber of `channel`.
    async fn publish(&self, channel: &str, message: &ChatMessage) -> Result<(), RelayError>;
}

/// Channel name for a user.
pub fn channel_for(user: &str) -> String {
    format!("{CHANNEL_PREFIX}{user}")
}

/// Strips the leading `/` clients commonly put on destinations.
pub fn normalize_destination(destination: &str) -> &str {
    destination.trim_start_matches('/')
}

/// Formats `at` as ISO-8601 with an explicit offset.
pub fn format_timestamp(at: DateTime<FixedOffset>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Returns a new message with `at` as its timestamp.
pub fn enrich(message: ChatMessage, at: DateTime<FixedOffset>) -> ChatMessage {
    ChatMessage {
        timestamp: Some(format_timestamp(at)),
        ..message
    }
}

/// Channels a message is delivered to: recipient first, then sender.
///
/// When sender and recipient are the same user both entries are equal and
/// the message is delivered twice.
pub fn delivery_channels(message: &ChatMessage) -> [String; 2] {
    [channel_for(&message.recipient), channel_for(&message.sender)]
}

/// Stamps inbound messages and publishes them through a [`Broadcaster`].
#[derive(Clone)]
pub struct MessageRelay {
    broadcaster: Arc<dyn Broadcaster>,
}

impl MessageRelay {
    pub fn new(broadcaster: Arc<dyn Broadcaster>) -> Self {
        Self { broadcaster }
    }

    /// Relays `message` stamped with the current local time.
    pub async fn on_message(&self, message: ChatMessage) -> Result<ChatMessage, RelayError> {
        self.relay_at(message, Local::now().fixed_offset()).await
    }

    /// Relays `message` stamped with `at`.
    ///
    /// Both channels are attempted even if the first publish fails; the
    /// first failure is returned.
    pub async fn relay_at(
        &self,
        message: ChatMessage,
        at: DateTime<FixedOffset>,
    ) -> Result<ChatMessage, RelayError> {
        if message.sender.is_empty() || message.recipient.is_empty() {
            warn!(
                sender = %message.sender,
                recipient = %message.recipient,
                "relaying message with empty participant"
            );
        }

        let enriched = enrich(message, at);
        let mut first_error = None;

        for channel in delivery_channels(&enriched) {
            match self.broadcaster.publish(&channel, &enriched).await {
                Ok(()) => debug!(channel = %channel, "relayed message"),
                Err(e) => {
                    warn!(channel = %channel, error = %e, "relay publish failed");
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(enriched),
        }
    }
}

impl std::fmt::Debug for MessageRelay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageRelay").finish_non_exhaustive()
    }
}
