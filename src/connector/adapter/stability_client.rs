use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::application::ImageGenerator;

pub const DEFAULT_BASE_URL: &str = "https://api.stability.ai";
pub const DEFAULT_ENGINE: &str = "stable-diffusion-xl-1024-v1-0";
/// Upper bound for one generation request, connection included.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(180);

const IMAGE_SIZE: u32 = 1024;
const CFG_SCALE: u32 = 7;
const SAMPLES: u32 = 1;
const STYLE_PRESET: &str = "photographic";

#[derive(Serialize)]
struct ApiRequest<'a> {
    text_prompts: [TextPrompt<'a>; 1],
    cfg_scale: u32,
    height: u32,
    width: u32,
    samples: u32,
    style_preset: &'a str,
}

#[derive(Serialize)]
struct TextPrompt<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct ApiResponse {
    #[serde(default)]
    artifacts: Vec<Artifact>,
}

#[derive(Deserialize)]
struct Artifact {
    base64: Option<String>,
}

/// [`ImageGenerator`] backed by the Stability AI v1 text-to-image endpoint.
///
/// Every request asks for one square photographic sample. Errors never
/// escape: they are logged and reported as `None`.
pub struct StabilityClient {
    client: reqwest::Client,
    api_key: String,
    url: String,
}

impl StabilityClient {
    pub fn new(
        api_key: impl Into<String>,
        engine: impl AsRef<str>,
        base_url: impl AsRef<str>,
    ) -> Self {
        let url = format!(
            "{}/v1/generation/{}/text-to-image",
            base_url.as_ref().trim_end_matches('/'),
            engine.as_ref()
        );
        Self {
            client: Self::build_client(DEFAULT_TIMEOUT),
            api_key: api_key.into(),
            url,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.client = Self::build_client(timeout);
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.url
    }

    fn build_client(timeout: Duration) -> reqwest::Client {
        reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default()
    }

    async fn request(&self, prompt: &str) -> Result<Vec<u8>, String> {
        let payload = ApiRequest {
            text_prompts: [TextPrompt { text: prompt }],
            cfg_scale: CFG_SCALE,
            height: IMAGE_SIZE,
            width: IMAGE_SIZE,
            samples: SAMPLES,
            style_preset: STYLE_PRESET,
        };

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    format!("request timed out: {e}")
                } else {
                    format!("request failed: {e}")
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(format!("API returned {status}: {body}"));
        }

        let api_response: ApiResponse = response
            .json()
            .await
            .map_err(|e| format!("failed to parse response: {e}"))?;

        let encoded = api_response
            .artifacts
            .into_iter()
            .next()
            .and_then(|artifact| artifact.base64)
            .ok_or_else(|| "response has no artifacts[0].base64".to_string())?;

        STANDARD
            .decode(encoded.as_bytes())
            .map_err(|e| format!("artifact is not valid base64: {e}"))
    }
}

#[async_trait]
impl ImageGenerator for StabilityClient {
    async fn generate_image(&self, prompt: &str) -> Option<Vec<u8>> {
        match self.request(prompt).await {
            Ok(bytes) => {
                debug!("StabilityClient: received {} image bytes", bytes.len());
                Some(bytes)
            }
            Err(e) => {
                error!("StabilityClient: generation failed for prompt {prompt:?}: {e}");
                None
            }
        }
    }
}
