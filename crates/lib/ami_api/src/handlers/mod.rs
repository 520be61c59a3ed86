//! Request handlers.

pub mod ai_chat;
pub mod health;
pub mod relay_ws;
