//! # Connector Layer
//!
//! External integrations implementing the application ports:
//! - Telegram Bot API (inbound updates and outbound messages)
//! - Gemini text generation and Stability image generation
//! - In-memory session storage
//! - Configuration and wiring (`api`)

pub mod adapter;
pub mod api;

pub use adapter::*;
pub use api::*;
