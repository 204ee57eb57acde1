//! Gemini REST implementation of VisionBackend
//!
//! Sends one `generateContent` request with a text part and an inline image
//! part, and concatenates the text parts of the first candidate.

use super::{BackendError, ImagePayload, VisionBackend};
use async_trait::async_trait;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_MODEL: &str = "models/gemini-2.5-flash";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Upper bound on error bodies kept in [`BackendError::Status`]
const MAX_ERROR_BODY_CHARS: usize = 500;

#[derive(Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part<'a> {
    Text { text: &'a str },
    InlineData { inline_data: InlineData<'a> },
}

#[derive(Serialize)]
struct InlineData<'a> {
    mime_type: &'a str,
    data: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

/// Google Gemini via the Generative Language REST API
pub struct GeminiBackend {
    http_client: reqwest::Client,
    api_key: Option<String>,
    model: String,
    base_url: String,
}

impl GeminiBackend {
    pub fn new(api_key: Option<String>, model: Option<String>) -> Self {
        Self {
            http_client: reqwest::Client::builder()
                .connect_timeout(Duration::from_secs(10))
                .build()
                .unwrap_or_default(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Point at another endpoint (proxy, test server)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// `{base}/v1beta/models/<name>:generateContent`
    fn endpoint(&self) -> String {
        let model = if self.model.starts_with("models/") {
            self.model.clone()
        } else {
            format!("models/{}", self.model)
        };
        format!(
            "{}/v1beta/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            model
        )
    }
}

#[async_trait]
impl VisionBackend for GeminiBackend {
    async fn generate(&self, prompt: &str, image: &ImagePayload) -> Result<String, BackendError> {
        let api_key = self.api_key.as_deref().ok_or(BackendError::NotConfigured)?;

        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![
                    Part::Text { text: prompt },
                    Part::InlineData {
                        inline_data: InlineData {
                            mime_type: &image.mime_type,
                            data: base64::engine::general_purpose::STANDARD.encode(&image.bytes),
                        },
                    },
                ],
            }],
        };

        debug!(
            model = %self.model,
            prompt_chars = prompt.len(),
            image_bytes = image.bytes.len(),
            "sending generateContent request"
        );

        let response = self
            .http_client
            .post(self.endpoint())
            .header("x-goog-api-key", api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::Status {
                status: status.as_u16(),
                body: body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
            });
        }

        let body: GenerateContentResponse = response.json().await?;
        extract_text(body)
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn is_ready(&self) -> bool {
        self.api_key.is_some()
    }
}

fn extract_text(body: GenerateContentResponse) -> Result<String, BackendError> {
    if let Some(reason) = body.prompt_feedback.and_then(|f| f.block_reason) {
        return Err(BackendError::Blocked(reason));
    }

    let candidate = body.candidates.into_iter().next().ok_or(BackendError::EmptyResponse)?;
    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        return match candidate.finish_reason {
            Some(reason) if reason != "STOP" => Err(BackendError::Blocked(reason)),
            _ => Err(BackendError::EmptyResponse),
        };
    }

    Ok(text)
}
