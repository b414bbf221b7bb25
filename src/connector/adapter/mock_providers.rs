use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::application::{ImageGenerator, TextGenerator};
use crate::domain::{DomainError, TextReply, Turn};

/// A valid 1x1 transparent PNG.
pub const PLACEHOLDER_PNG: [u8; 67] = [
    0x89, 0x50, 0x4e, 0x47, 0x0d, 0x0a, 0x1a, 0x0a, 0x00, 0x00, 0x00, 0x0d, 0x49, 0x48, 0x44,
    0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1f,
    0x15, 0xc4, 0x89, 0x00, 0x00, 0x00, 0x0a, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9c, 0x63, 0x00,
    0x01, 0x00, 0x00, 0x05, 0x00, 0x01, 0x0d, 0x0a, 0x2d, 0xb4, 0x00, 0x00, 0x00, 0x00, 0x49,
    0x45, 0x4e, 0x44, 0xae, 0x42, 0x60, 0x82,
];

/// Offline [`TextGenerator`] that echoes the message back.
pub struct MockTextGenerator;

impl MockTextGenerator {
    pub fn new() -> Self {
        Self
    }
}

impl Default for MockTextGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TextGenerator for MockTextGenerator {
    async fn generate_text(
        &self,
        history: &[Turn],
        message: &str,
    ) -> Result<TextReply, DomainError> {
        let text = format!("(turn {}) You said: {}", history.len() / 2 + 1, message);
        let mut updated = history.to_vec();
        updated.push(Turn::user(message));
        updated.push(Turn::model(text.clone()));
        Ok(TextReply {
            text,
            history: updated,
        })
    }
}

/// Offline [`ImageGenerator`] that returns a placeholder PNG after a delay,
/// long enough to watch the progress animation.
pub struct MockImageGenerator {
    delay: Duration,
}

impl MockImageGenerator {
    pub fn new() -> Self {
        Self {
            delay: Duration::from_secs(3),
        }
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self { delay }
    }
}

impl Default for MockImageGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ImageGenerator for MockImageGenerator {
    async fn generate_image(&self, prompt: &str) -> Option<Vec<u8>> {
        debug!("MockImageGenerator: pretending to draw {:?}", prompt);
        tokio::time::sleep(self.delay).await;
        Some(PLACEHOLDER_PNG.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_text_generator_appends_both_turns() {
        let generator = MockTextGenerator::new();
        let first = generator.generate_text(&[], "hello").await.unwrap();
        assert_eq!(first.text, "(turn 1) You said: hello");
        assert_eq!(first.history, vec![Turn::user("hello"), Turn::model(first.text.clone())]);

        let second = generator
            .generate_text(&first.history, "again")
            .await
            .unwrap();
        assert_eq!(second.text, "(turn 2) You said: again");
        assert_eq!(second.history.len(), 4);
    }

    #[tokio::test]
    async fn mock_image_generator_returns_png() {
        let generator = MockImageGenerator::with_delay(Duration::from_millis(1));
        let bytes = generator.generate_image("anything").await.unwrap();
        assert_eq!(&bytes[1..4], b"PNG");
    }
}
