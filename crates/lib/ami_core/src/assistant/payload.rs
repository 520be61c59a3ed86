//! Outbound completion payload.
//!
//! Layout: one system entry, then at most `history_limit` history entries
//! taken from the front of the client history, then the current message.

use serde::Serialize;

use super::models::ChatTurnRequest;
use crate::config::AssistantConfig;

/// Request body for the chat completions endpoint. Built per request.
#[derive(Debug, Serialize)]
pub struct CompletionPayload<'a> {
    pub model: &'a str,
    pub temperature: f64,
    pub messages: Vec<CompletionMessage<'a>>,
}

/// One role/content pair in [`CompletionPayload::messages`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompletionMessage<'a> {
    pub role: &'a str,
    pub content: &'a str,
}

/// Builds the payload for `request`.
///
/// History beyond the limit is dropped from the tail: the earliest entries
/// are the ones kept.
pub fn build_payload<'a>(
    config: &'a AssistantConfig,
    request: &'a ChatTurnRequest,
) -> CompletionPayload<'a> {
    let history = request.history.as_deref().unwrap_or_default();
    let kept = history.len().min(config.history_limit);

    let mut messages = Vec::with_capacity(kept + 2);
    messages.push(CompletionMessage {
        role: "system",
        content: &config.system_prompt,
    });
    messages.extend(history.iter().take(kept).map(|entry| CompletionMessage {
        role: entry.role_or_default(),
        content: entry.content_or_default(),
    }));
    messages.push(CompletionMessage {
        role: "user",
        content: request.message.as_deref().unwrap_or(""),
    });

    CompletionPayload {
        model: &config.model,
        temperature: config.temperature,
        messages,
    }
}
