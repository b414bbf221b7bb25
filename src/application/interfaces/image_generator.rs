use async_trait::async_trait;

/// Turns a text prompt into image bytes using a hosted text-to-image model.
///
/// Failures are soft: any network error, timeout, non-success status or
/// missing payload yields `None` so callers can treat "finished without an
/// image" uniformly.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    async fn generate_image(&self, prompt: &str) -> Option<Vec<u8>>;
}
