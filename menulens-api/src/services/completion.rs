//! Completion-model collaborator
//!
//! Trait seam over a chat-completions API so engines and tests don't care
//! which model serves them. The production client speaks the OpenAI wire
//! format via reqwest; images travel as base64 data URLs.

use async_trait::async_trait;
use base64::Engine as _;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

use menulens_common::{Error, Result};

const TEXT_TIMEOUT: Duration = Duration::from_secs(30);
const VISION_TIMEOUT: Duration = Duration::from_secs(120);

/// One image for a vision completion
#[derive(Debug, Clone)]
pub struct ImageAttachment {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

/// Text completion parameters
#[derive(Debug, Clone)]
pub struct TextCompletionRequest {
    pub system: Option<String>,
    pub user: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

/// Completion-model interface.
///
/// Output may be wrapped in a markdown code fence; callers strip it with
/// [`strip_code_fence`] before parsing.
#[async_trait]
pub trait CompletionModel: Send + Sync {
    async fn complete_text(&self, request: TextCompletionRequest) -> Result<String>;
    async fn complete_vision(&self, prompt: &str, images: &[ImageAttachment]) -> Result<String>;
}

/// Strip an optional surrounding markdown code fence from model output.
///
/// Only a fence at the very start counts; backticks inside unfenced output
/// (a review quote, say) must pass through untouched.
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();

    let rest = if let Some(rest) = trimmed.strip_prefix("```json") {
        rest
    } else if let Some(rest) = trimmed.strip_prefix("```") {
        rest
    } else {
        return trimmed;
    };

    let rest = rest.trim();
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// OpenAI-compatible chat-completions client
pub struct OpenAiClient {
    http_client: reqwest::Client,
    base_url: String,
    api_key: String,
    text_model: String,
    vision_model: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: String,
}

impl OpenAiClient {
    pub fn new(base_url: String, api_key: String) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .build()
            .map_err(|e| Error::Upstream(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            base_url,
            api_key,
            text_model: "gpt-4o".to_string(),
            vision_model: "gpt-4o".to_string(),
        })
    }

    async fn chat(&self, body: serde_json::Value, timeout: Duration) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.api_key)
            .timeout(timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Upstream(format!("Completion request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(Error::Upstream(format!(
                "Completion API error {}: {}",
                status.as_u16(),
                error_text
            )));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| Error::Upstream(format!("Completion response parse error: {}", e)))?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| Error::Upstream("Completion response contained no choices".to_string()))
    }
}

#[async_trait]
impl CompletionModel for OpenAiClient {
    async fn complete_text(&self, request: TextCompletionRequest) -> Result<String> {
        let mut messages = Vec::new();
        if let Some(system) = &request.system {
            messages.push(json!({"role": "system", "content": system}));
        }
        messages.push(json!({"role": "user", "content": request.user}));

        let body = json!({
            "model": self.text_model,
            "messages": messages,
            "max_tokens": request.max_tokens,
            "temperature": request.temperature,
        });

        self.chat(body, TEXT_TIMEOUT).await
    }

    async fn complete_vision(&self, prompt: &str, images: &[ImageAttachment]) -> Result<String> {
        let mut content: Vec<serde_json::Value> = images
            .iter()
            .map(|image| {
                let encoded = base64::engine::general_purpose::STANDARD.encode(&image.bytes);
                let media_type = if image.content_type.is_empty() {
                    "image/jpeg"
                } else {
                    &image.content_type
                };
                json!({
                    "type": "image_url",
                    "image_url": {
                        "url": format!("data:{};base64,{}", media_type, encoded),
                        "detail": "auto",
                    }
                })
            })
            .collect();
        content.push(json!({"type": "text", "text": prompt}));

        let body = json!({
            "model": self.vision_model,
            "messages": [{"role": "user", "content": content}],
            "max_tokens": 4096,
            "temperature": 0.1,
        });

        self.chat(body, VISION_TIMEOUT).await
    }
}
