use std::sync::Arc;

use crate::application::TextGenerator;
use crate::domain::{DomainError, Session};

/// Default chat flow: one round trip to the text provider per message.
pub struct ConverseUseCase {
    generator: Arc<dyn TextGenerator>,
}

impl ConverseUseCase {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    /// Returns the reply text. The session history is only replaced when
    /// the provider call succeeds.
    pub async fn execute(&self, session: &mut Session, message: &str) -> Result<String, DomainError> {
        let reply = self
            .generator
            .generate_text(session.history(), message)
            .await?;
        session.replace_history(reply.history);
        Ok(reply.text)
    }

    pub fn clear(&self, session: &mut Session) -> bool {
        session.clear_history()
    }
}
