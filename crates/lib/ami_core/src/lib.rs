//! # ami_core
//!
//! Core domain logic for AMI: the assistant reply service that proxies a chat
//! turn to the completion provider, and the message relay that fans chat
//! messages out to topic channels.

pub mod assistant;
pub mod config;
pub mod relay;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
