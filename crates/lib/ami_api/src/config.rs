//! API server configuration.

use ami_core::relay::hub::DEFAULT_CAPACITY;

/// Configuration for the API server.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    /// Address to bind the HTTP listener (e.g. "0.0.0.0:8080").
    pub bind_addr: String,
    /// Single origin allowed to call the REST routes cross-origin.
    pub allowed_origin: String,
    /// Per-topic buffer for relayed messages.
    pub channel_capacity: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".into(),
            allowed_origin: "http://localhost:5173".into(),
            channel_capacity: DEFAULT_CAPACITY,
        }
    }
}
