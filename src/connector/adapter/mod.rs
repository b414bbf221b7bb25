mod gemini_client;
mod in_memory_session_store;
mod mock_providers;
mod stability_client;
mod telegram_client;

pub use gemini_client::GeminiClient;
pub use in_memory_session_store::*;
pub use mock_providers::*;
pub use stability_client::StabilityClient;
pub use telegram_client::TelegramClient;

pub mod defaults {
    pub use super::gemini_client::{
        DEFAULT_BASE_URL as GEMINI_BASE_URL, DEFAULT_MODEL as GEMINI_MODEL,
    };
    pub use super::stability_client::{
        DEFAULT_BASE_URL as STABILITY_BASE_URL, DEFAULT_ENGINE as STABILITY_ENGINE,
    };
    pub use super::telegram_client::DEFAULT_API_URL as TELEGRAM_API_URL;
}
