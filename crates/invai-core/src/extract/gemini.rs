//! Gemini `generateContent` client.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::DocumentExtractor;
use crate::encode::EncodedPayload;
use crate::error::ExtractorError;
use crate::models::config::ExtractorConfig;

/// Longest service error body kept in an error message.
const MAX_ERROR_BODY: usize = 512;

/// Extractor backed by the Gemini generative language API.
pub struct GeminiClient {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
    api_key_env: String,
    timeout_secs: u64,
}

impl GeminiClient {
    /// Create a client; the API key is read from the configured environment
    /// variable.
    pub fn new(config: &ExtractorConfig) -> Result<Self, ExtractorError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ExtractorError::Configuration(format!("HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key: config.api_key(),
            api_key_env: config.api_key_env.clone(),
            timeout_secs: config.timeout_secs,
        })
    }

    /// Override the API key.
    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key.filter(|k| !k.trim().is_empty());
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn url(&self) -> String {
        format!("{}/models/{}:generateContent", self.endpoint, self.model)
    }

    fn api_key(&self) -> Result<&str, ExtractorError> {
        self.api_key.as_deref().ok_or_else(|| {
            ExtractorError::Configuration(format!(
                "API key is not set (expected in {})",
                self.api_key_env
            ))
        })
    }
}

/// Request body for `models/{model}:generateContent`.
#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part<'a> {
    #[serde(rename_all = "camelCase")]
    InlineData { inline_data: InlineData<'a> },
    Text { text: &'a str },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData<'a> {
    mime_type: &'a str,
    data: &'a str,
}

/// Response body from `generateContent`.
#[derive(Deserialize)]
struct GenerateResponse {
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
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

fn build_request<'a>(payload: &'a EncodedPayload, prompt: &'a str) -> GenerateRequest<'a> {
    GenerateRequest {
        contents: vec![Content {
            parts: vec![
                Part::InlineData {
                    inline_data: InlineData {
                        mime_type: &payload.mime_type,
                        data: &payload.data,
                    },
                },
                Part::Text { text: prompt },
            ],
        }],
    }
}

/// Text of the first candidate, its text parts joined.
fn response_text(response: GenerateResponse) -> Option<String> {
    let content = response.candidates.into_iter().next()?.content?;
    let text: Vec<String> = content.parts.into_iter().filter_map(|p| p.text).collect();
    if text.is_empty() {
        None
    } else {
        Some(text.join(""))
    }
}

fn truncate(body: &str) -> &str {
    match body.char_indices().nth(MAX_ERROR_BODY) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}

#[async_trait]
impl DocumentExtractor for GeminiClient {
    fn preflight(&self) -> Result<(), ExtractorError> {
        self.api_key().map(|_| ())
    }

    async fn extract(
        &self,
        file_name: &str,
        payload: &EncodedPayload,
        prompt: &str,
    ) -> Result<String, ExtractorError> {
        let api_key = self.api_key()?;
        let unavailable = |reason: String| ExtractorError::Unavailable {
            file: file_name.to_string(),
            reason,
        };

        debug!("Submitting {} to {}", file_name, self.model);

        let response = self
            .client
            .post(self.url())
            .header("x-goog-api-key", api_key)
            .json(&build_request(payload, prompt))
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    unavailable(format!("cannot connect to {}", self.endpoint))
                } else if e.is_timeout() {
                    unavailable(format!("request timed out after {}s", self.timeout_secs))
                } else {
                    unavailable(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(unavailable(format!(
                "service returned {}: {}",
                status.as_u16(),
                truncate(body.trim())
            )));
        }

        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|e| unavailable(format!("unreadable response: {e}")))?;

        response_text(body).ok_or_else(|| unavailable("response contained no text".to_string()))
    }

    fn name(&self) -> &str {
        "gemini"
    }
}
