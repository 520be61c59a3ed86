//! Assistant configuration.
//!
//! Built once at process start and handed to
//! [`AiReplyService::new`](crate::assistant::AiReplyService::new).

use std::time::Duration;

/// Completion endpoint used when no override is configured.
pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";

/// Model identifier sent with every completion request.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Sampling temperature sent with every completion request.
pub const DEFAULT_TEMPERATURE: f64 = 0.3;

/// Maximum number of history entries forwarded upstream.
pub const DEFAULT_HISTORY_LIMIT: usize = 8;

/// Persona instruction prepended to every completion request.
pub const SYSTEM_PROMPT: &str = "Bạn là AMI của PTIT. Trả lời ngắn gọn, lịch sự, ưu tiên thông tin học vụ, \
dịch vụ sinh viên, và hướng dẫn thủ tục. Nếu thiếu dữ liệu, hãy hỏi lại.";

/// Configuration for the assistant reply service.
#[derive(Clone)]
pub struct AssistantConfig {
    /// Provider API key. `None` or blank means the service is unconfigured.
    pub api_key: Option<String>,
    /// Chat completions endpoint URL.
    pub endpoint: String,
    /// Model identifier.
    pub model: String,
    /// Sampling temperature.
    pub temperature: f64,
    /// System instruction placed first in every payload.
    pub system_prompt: String,
    /// Number of leading history entries kept in the payload.
    pub history_limit: usize,
    /// Bound on TCP/TLS connection establishment.
    pub connect_timeout: Duration,
    /// Bound on the whole request, connection included.
    pub request_timeout: Duration,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            system_prompt: SYSTEM_PROMPT.to_string(),
            history_limit: DEFAULT_HISTORY_LIMIT,
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl AssistantConfig {
    /// Sets the API key, keeping every other field.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Returns the trimmed API key, or `None` when absent or blank.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }

    /// Whether a usable API key is present.
    pub fn is_configured(&self) -> bool {
        self.api_key().is_some()
    }
}

impl std::fmt::Debug for AssistantConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssistantConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("history_limit", &self.history_limit)
            .field("connect_timeout", &self.connect_timeout)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}
