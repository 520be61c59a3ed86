//! Wire types for the assistant chat endpoint.

use serde::{Deserialize, Serialize};

/// One inbound chat turn. Both fields may be null or absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurnRequest {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub history: Option<Vec<HistoryEntry>>,
}

impl ChatTurnRequest {
    /// A turn with a message and no history.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            history: None,
        }
    }

    /// Replaces the history.
    pub fn with_history(mut self, history: Vec<HistoryEntry>) -> Self {
        self.history = Some(history);
        self
    }
}

/// A prior turn as sent by the client.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

impl HistoryEntry {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: Some(role.into()),
            content: Some(content.into()),
        }
    }

    /// Role, defaulting to `"user"`.
    pub fn role_or_default(&self) -> &str {
        self.role.as_deref().unwrap_or("user")
    }

    /// Content, defaulting to the empty string.
    pub fn content_or_default(&self) -> &str {
        self.content.as_deref().unwrap_or("")
    }
}

/// The single response shape of the chat endpoint, success or not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AiReplyEnvelope {
    pub reply: String,
}

impl AiReplyEnvelope {
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_fields_deserialize_as_none() {
        let req: ChatTurnRequest =
            serde_json::from_str(r#"{"message":null,"history":[{"role":null,"content":null}]}"#)
                .unwrap();
        assert!(req.message.is_none());
        let history = req.history.unwrap();
        assert_eq!(history[0].role_or_default(), "user");
        assert_eq!(history[0].content_or_default(), "");
    }

    #[test]
    fn absent_fields_deserialize_as_none() {
        let req: ChatTurnRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(req, ChatTurnRequest::default());
    }

    #[test]
    fn envelope_serializes_single_field() {
        let json = serde_json::to_value(AiReplyEnvelope::new("Xin chào")).unwrap();
        assert_eq!(json, serde_json::json!({ "reply": "Xin chào" }));
    }
}
