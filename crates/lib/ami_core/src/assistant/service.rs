//! Assistant reply service.
//!
//! One POST per turn, no retry. Every outcome becomes an [`AiReplyEnvelope`].

use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use serde_json::Value;
use tracing::{debug, warn};

use super::models::{AiReplyEnvelope, ChatTurnRequest};
use super::payload::build_payload;
use super::AssistantError;
use crate::config::AssistantConfig;

/// Stateless proxy to the chat completions provider.
///
/// Cheap to share behind an `Arc`; the inner `reqwest::Client` pools
/// connections across concurrent turns.
pub struct AiReplyService {
    config: AssistantConfig,
    client: Client,
}

impl AiReplyService {
    /// Builds the service and its HTTP client with the configured timeouts.
    pub fn new(config: AssistantConfig) -> Result<Self, AssistantError> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .build()
            .map_err(AssistantError::ClientBuild)?;
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &AssistantConfig {
        &self.config
    }

    /// Whether a usable API key is present.
    pub fn is_configured(&self) -> bool {
        self.config.is_configured()
    }

    /// Produces a reply for `request`. Never fails: provider problems are
    /// answered with the matching fixed text.
    pub async fn create_reply(&self, request: &ChatTurnRequest) -> AiReplyEnvelope {
        match self.try_reply(request).await {
            Ok(reply) => AiReplyEnvelope::new(reply),
            Err(AssistantError::Unconfigured) => {
                debug!("assistant has no API key, answering with advisory");
                AiReplyEnvelope::new(AssistantError::Unconfigured.fallback_reply())
            }
            Err(e) => {
                warn!(error = %e, "assistant reply degraded");
                AiReplyEnvelope::new(e.fallback_reply())
            }
        }
    }

    /// Same as [`create_reply`](Self::create_reply) but exposes the failure.
    pub async fn try_reply(&self, request: &ChatTurnRequest) -> Result<String, AssistantError> {
        let api_key = self.config.api_key().ok_or(AssistantError::Unconfigured)?;
        let payload = build_payload(&self.config, request);

        debug!(
            endpoint = %self.config.endpoint,
            messages = payload.messages.len(),
            "sending completion request"
        );

        let response = self
            .client
            .post(self.config.endpoint.as_str())
            .bearer_auth(api_key)
            .header(CONTENT_TYPE, "application/json")
            .json(&payload)
            .send()
            .await
            .map_err(AssistantError::Transport)?;

        let status = response.status();
        if status.as_u16() >= 400 {
            return Err(AssistantError::Upstream(status.as_u16()));
        }

        let body = response.text().await.map_err(AssistantError::Transport)?;
        extract_reply(&body)
    }
}

/// Pulls `choices[0].message.content` out of a completion body, trimmed.
///
/// Scalar content is rendered as text; `null`, objects and arrays count
/// as missing.
fn extract_reply(body: &str) -> Result<String, AssistantError> {
    let root: Value = serde_json::from_str(body)?;
    match root.pointer("/choices/0/message/content") {
        Some(Value::String(content)) => Ok(content.trim().to_string()),
        Some(scalar @ (Value::Number(_) | Value::Bool(_))) => Ok(scalar.to_string()),
        _ => Err(AssistantError::MissingContent),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assistant::REPLY_UNCONFIGURED;

    #[test]
    fn extracts_and_trims_content() {
        let body = r#"{"choices":[{"message":{"content":"  Hello.  "}}]}"#;
        assert_eq!(extract_reply(body).unwrap(), "Hello.");
    }

    #[test]
    fn empty_choices_is_missing_content() {
        let err = extract_reply(r#"{"choices":[]}"#).unwrap_err();
        assert!(matches!(err, AssistantError::MissingContent));
    }

    #[test]
    fn null_content_is_missing_content() {
        let body = r#"{"choices":[{"message":{"content":null}}]}"#;
        assert!(matches!(
            extract_reply(body).unwrap_err(),
            AssistantError::MissingContent
        ));
    }

    #[test]
    fn scalar_content_is_rendered_as_text() {
        let number = r#"{"choices":[{"message":{"content":42}}]}"#;
        assert_eq!(extract_reply(number).unwrap(), "42");

        let flag = r#"{"choices":[{"message":{"content":true}}]}"#;
        assert_eq!(extract_reply(flag).unwrap(), "true");
    }

    #[test]
    fn structured_content_is_missing_content() {
        let body = r#"{"choices":[{"message":{"content":{"text":"hi"}}}]}"#;
        assert!(matches!(
            extract_reply(body).unwrap_err(),
            AssistantError::MissingContent
        ));
    }

    #[test]
    fn invalid_json_is_decode_error() {
        assert!(matches!(
            extract_reply("<html>").unwrap_err(),
            AssistantError::Decode(_)
        ));
    }

    #[tokio::test]
    async fn unconfigured_service_answers_with_advisory() {
        let service = AiReplyService::new(AssistantConfig::default()).unwrap();
        let envelope = service.create_reply(&ChatTurnRequest::new("hi")).await;
        assert_eq!(envelope.reply, REPLY_UNCONFIGURED);
    }
}
