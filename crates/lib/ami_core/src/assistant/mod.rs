//! Assistant module — proxies a chat turn to the completion provider.
//!
//! Every failure is mapped to a fixed, polite reply so the chat surface
//! never shows a technical error.
//!
//! # Public API
//!
//! - [`AiReplyService::create_reply`] — answer a [`ChatTurnRequest`]
//! - [`payload::build_payload`] — the bounded outbound payload
//! - [`AssistantError::fallback_reply`] — canned text per failure

pub mod models;
pub mod payload;
pub mod service;

use thiserror::Error;

pub use models::{AiReplyEnvelope, ChatTurnRequest, HistoryEntry};
pub use service::AiReplyService;

/// Reply when no API key is configured.
pub const REPLY_UNCONFIGURED: &str = "AMI chưa được cấu hình API key. Vui lòng liên hệ quản trị.";

/// Reply when the provider answers with an error status.
pub const REPLY_BUSY: &str = "AMI đang bận, vui lòng thử lại sau.";

/// Reply when the provider answer has no message content.
pub const REPLY_NO_ANSWER: &str = "AMI chưa thể trả lời lúc này.";

/// Reply when the provider cannot be reached.
pub const REPLY_CONNECTION_ERROR: &str = "AMI gặp lỗi kết nối. Vui lòng thử lại.";

/// Reasons a reply could not come from the provider.
#[derive(Debug, Error)]
pub enum AssistantError {
    #[error("API key is not configured")]
    Unconfigured,

    #[error("Upstream returned status {0}")]
    Upstream(u16),

    #[error("Upstream response has no message content")]
    MissingContent,

    #[error("Transport failure: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("Upstream body is not valid JSON: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),
}

impl AssistantError {
    /// The fixed user-facing text for this failure.
    pub fn fallback_reply(&self) -> &'static str {
        match self {
            AssistantError::Unconfigured => REPLY_UNCONFIGURED,
            AssistantError::Upstream(_) => REPLY_BUSY,
            AssistantError::MissingContent => REPLY_NO_ANSWER,
            AssistantError::Transport(_)
            | AssistantError::Decode(_)
            | AssistantError::ClientBuild(_) => REPLY_CONNECTION_ERROR,
        }
    }
}
