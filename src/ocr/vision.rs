//! Vision-capable chat completion backends.
//!
//! Requests and responses use the `async-openai` chat types, so any OpenAI-compatible
//! `/chat/completions` endpoint works.

use std::time::Duration;

use async_openai::types::chat::{CreateChatCompletionRequest, CreateChatCompletionResponse};
use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde_json::json;
use tracing::debug;

use super::encode::EncodedImage;
use super::error::{OcrError, OcrResult};
use crate::config::{ApiKey, Config};

/// Instruction sent with every page image.
pub const OCR_INSTRUCTION: &str = "Extract ALL text from this document image.
Preserve the exact formatting, structure, headers, and layout as much as possible.
Return ONLY the extracted text, with no additional commentary or explanation.
Preserve line breaks and spacing.";

/// Longest error body kept in [`OcrError::Status`].
const MAX_ERROR_BODY_CHARS: usize = 512;

#[async_trait]
/// Turns one page image into verbatim text.
pub trait VisionBackend: Send + Sync {
    /// Model identifier recorded with cached results.
    fn model(&self) -> &str;

    /// Transcribes `image`, returning at most `max_tokens` tokens of text.
    async fn transcribe(&self, image: &EncodedImage, max_tokens: u32) -> OcrResult<String>;
}

/// OpenAI-compatible `/chat/completions` client.
pub struct OpenAiVisionClient {
    http: HttpClient,
    endpoint: String,
    api_key: ApiKey,
    model: String,
}

impl std::fmt::Debug for OpenAiVisionClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiVisionClient")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl OpenAiVisionClient {
    /// Creates a client for `base_url` (e.g. `https://api.openai.com/v1`).
    ///
    /// Fails when the HTTP client cannot be built with `timeout`.
    pub fn new(
        api_key: ApiKey,
        base_url: &str,
        model: impl Into<String>,
        timeout: Duration,
    ) -> OcrResult<Self> {
        let http = HttpClient::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            api_key,
            model: model.into(),
        })
    }

    /// Builds a client from `config`; `Ok(None)` when no API key is set.
    pub fn from_config(config: &Config) -> OcrResult<Option<Self>> {
        let Some(key) = config.openai_api_key.clone() else {
            return Ok(None);
        };
        Self::new(
            key,
            &config.openai_base_url,
            config.ocr_model.clone(),
            config.ocr_timeout,
        )
        .map(Some)
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

/// Chat completion request for one page: the instruction and the image as one user turn.
pub fn completion_request(
    model: &str,
    image: &EncodedImage,
    max_tokens: u32,
) -> OcrResult<CreateChatCompletionRequest> {
    let value = json!({
        "model": model,
        "messages": [{
            "role": "user",
            "content": [
                { "type": "text", "text": OCR_INSTRUCTION },
                { "type": "image_url", "image_url": { "url": image.data_url() } }
            ]
        }],
        "temperature": 0.0,
        "max_completion_tokens": max_tokens
    });

    serde_json::from_value(value).map_err(|e| OcrError::Request(format!("invalid request: {e}")))
}

/// Pulls the trimmed text of the first choice out of a completion body.
///
/// A body that is not a chat completion, or whose content is not a string, is
/// [`OcrError::InvalidResponse`]; no choice, null content or blank text is
/// [`OcrError::EmptyResponse`].
pub fn parse_completion(body: &[u8]) -> OcrResult<String> {
    let response: CreateChatCompletionResponse =
        serde_json::from_slice(body).map_err(|e| OcrError::InvalidResponse(e.to_string()))?;

    let text = response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or(OcrError::EmptyResponse)?;

    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(OcrError::EmptyResponse);
    }
    Ok(trimmed.to_string())
}

#[async_trait]
impl VisionBackend for OpenAiVisionClient {
    fn model(&self) -> &str {
        &self.model
    }

    async fn transcribe(&self, image: &EncodedImage, max_tokens: u32) -> OcrResult<String> {
        let request = completion_request(&self.model, image, max_tokens)?;

        let resp = self
            .http
            .post(&self.endpoint)
            .bearer_auth(self.api_key.expose())
            .json(&request)
            .send()
            .await?;

        let status = resp.status();
        let bytes = resp.bytes().await?;

        if !status.is_success() {
            let body: String = String::from_utf8_lossy(&bytes)
                .chars()
                .take(MAX_ERROR_BODY_CHARS)
                .collect();
            return Err(OcrError::Status {
                status: status.as_u16(),
                body,
            });
        }

        debug!(
            model = %self.model,
            image_bytes = image.byte_len,
            response_bytes = bytes.len(),
            "Vision completion received"
        );

        parse_completion(&bytes)
    }
}
