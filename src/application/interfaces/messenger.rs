use async_trait::async_trait;

use crate::domain::{ChatId, DomainError, InboundMessage, MessageRef, Reply, TextFormat};

/// Outbound side of the chat platform.
#[async_trait]
pub trait Messenger: Send + Sync {
    async fn send_text(&self, chat: ChatId, reply: &Reply) -> Result<MessageRef, DomainError>;

    async fn send_photo(
        &self,
        chat: ChatId,
        photo: &[u8],
        caption: &str,
        format: TextFormat,
    ) -> Result<MessageRef, DomainError>;

    /// Replace the text of a posted message.
    ///
    /// Fails with [`DomainError::MessageUnchanged`] when the text is already
    /// current and [`DomainError::MessageNotFound`] when the message is gone.
    async fn edit_text(
        &self,
        message: &MessageRef,
        text: &str,
        format: TextFormat,
    ) -> Result<(), DomainError>;

    async fn delete_message(&self, message: &MessageRef) -> Result<(), DomainError>;

    /// Show a "typing..." indicator in the chat.
    async fn send_typing(&self, chat: ChatId) -> Result<(), DomainError>;
}

/// Inbound side of the chat platform.
#[async_trait]
pub trait UpdateSource: Send + Sync {
    /// Wait for the next batch of user messages.
    ///
    /// An empty batch is normal (for example a long poll that expired).
    async fn next_batch(&self) -> Result<Vec<InboundMessage>, DomainError>;
}
