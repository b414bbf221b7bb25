use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::application::TextGenerator;
use crate::domain::{DomainError, Role, TextReply, Turn};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash-latest";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Serialize)]
struct ApiRequest<'a> {
    contents: Vec<ApiContent<'a>>,
}

#[derive(Serialize)]
struct ApiContent<'a> {
    role: &'a str,
    parts: Vec<ApiPart<'a>>,
}

#[derive(Serialize)]
struct ApiPart<'a> {
    text: &'a str,
}

/// The subset of a `generateContent` response we read.
#[derive(Deserialize)]
struct ApiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

/// [`TextGenerator`] backed by the Google Generative Language REST API.
///
/// The whole history is sent with every request; the provider keeps no
/// conversation state of its own.
pub struct GeminiClient {
    client: reqwest::Client,
    api_key: String,
    /// Full `generateContent` endpoint for the configured model.
    url: String,
}

impl GeminiClient {
    pub fn new(
        api_key: impl Into<String>,
        model: impl AsRef<str>,
        base_url: impl AsRef<str>,
    ) -> Self {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            base_url.as_ref().trim_end_matches('/'),
            model.as_ref()
        );
        Self {
            client: reqwest::Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .unwrap_or_default(),
            api_key: api_key.into(),
            url,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.url
    }

    fn extract_text(response: ApiResponse) -> Option<String> {
        let text: String = response
            .candidates
            .into_iter()
            .next()?
            .content?
            .parts
            .into_iter()
            .filter_map(|part| part.text)
            .collect();
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate_text(
        &self,
        history: &[Turn],
        message: &str,
    ) -> Result<TextReply, DomainError> {
        let contents = history
            .iter()
            .map(|turn| ApiContent {
                role: turn.role().as_str(),
                parts: vec![ApiPart { text: turn.text() }],
            })
            .chain(std::iter::once(ApiContent {
                role: Role::User.as_str(),
                parts: vec![ApiPart { text: message }],
            }))
            .collect();

        debug!("GeminiClient: sending {} prior turns", history.len());

        let response = self
            .client
            .post(&self.url)
            .header("x-goog-api-key", &self.api_key)
            .json(&ApiRequest { contents })
            .send()
            .await
            .map_err(|e| DomainError::upstream(format!("GeminiClient: request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!("GeminiClient: API returned {status}: {body}");
            return Err(DomainError::upstream(format!(
                "GeminiClient: API returned {status}"
            )));
        }

        let api_response: ApiResponse = response.json().await.map_err(|e| {
            DomainError::upstream(format!("GeminiClient: failed to parse response: {e}"))
        })?;

        let text = Self::extract_text(api_response)
            .ok_or_else(|| DomainError::upstream("GeminiClient: response contained no text"))?;

        let mut updated = history.to_vec();
        updated.push(Turn::user(message));
        updated.push(Turn::model(text.clone()));

        Ok(TextReply {
            text,
            history: updated,
        })
    }
}
