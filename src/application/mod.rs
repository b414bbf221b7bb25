//! # Application Layer
//!
//! Ports to the chat platform and AI providers, and the use cases that drive
//! a conversation: text chat, supervised image generation with live progress,
//! and the dialogue state machine routing between them.

pub mod interfaces;
pub mod use_cases;

pub use interfaces::*;
pub use use_cases::*;
