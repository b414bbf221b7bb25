use async_trait::async_trait;

use crate::domain::{DomainError, TextReply, Turn};

/// Produces conversational replies from a hosted language model.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Send `message` as the next user turn after `history`.
    ///
    /// On success the returned history ends with the new user turn followed by
    /// the model's reply. Any network failure, non-success status or
    /// unusable payload is reported as [`DomainError::Upstream`].
    async fn generate_text(&self, history: &[Turn], message: &str)
        -> Result<TextReply, DomainError>;
}
