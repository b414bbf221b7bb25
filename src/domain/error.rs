use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Delivery error: {0}")]
    Delivery(String),

    #[error("Delivery timed out: {0}")]
    DeliveryTimeout(String),

    #[error("Message is not modified")]
    MessageUnchanged,

    #[error("Message not found: {0}")]
    MessageNotFound(String),

    #[error("A generation task is already active for session {0}")]
    TaskAlreadyActive(String),
}

impl DomainError {
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn upstream(msg: impl Into<String>) -> Self {
        Self::Upstream(msg.into())
    }

    pub fn delivery(msg: impl Into<String>) -> Self {
        Self::Delivery(msg.into())
    }

    pub fn delivery_timeout(msg: impl Into<String>) -> Self {
        Self::DeliveryTimeout(msg.into())
    }

    pub fn message_not_found(msg: impl Into<String>) -> Self {
        Self::MessageNotFound(msg.into())
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }

    pub fn is_upstream(&self) -> bool {
        matches!(self, Self::Upstream(_))
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::DeliveryTimeout(_))
    }

    /// Edit failures the progress animation may ignore: the text was already
    /// current, or the message is gone.
    pub fn is_benign_edit_failure(&self) -> bool {
        matches!(self, Self::MessageUnchanged | Self::MessageNotFound(_))
    }
}
