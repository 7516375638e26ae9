//! OpenAI-compatible chat completions adapter for the text/evaluation backend.

use super::{
    build_provider_http_client, classify_status, map_http_error, CompletionOptions, TextBackend,
};
use crate::error::{ApiError, BackendError};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

#[derive(Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    refusal: Option<String>,
}

/// OpenAI (or compatible endpoint) text client
pub struct OpenAiTextClient {
    client: Client,
    model: String,
    api_key: String,
    base_url: String,
}

impl OpenAiTextClient {
    pub fn new(
        model: String,
        api_key: String,
        base_url: Option<String>,
        timeout: Duration,
    ) -> Result<Self, ApiError> {
        let base_url = base_url
            .map(|value| value.trim().trim_end_matches('/').to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string());
        Ok(Self {
            client: build_provider_http_client(timeout)?,
            model,
            api_key,
            base_url,
        })
    }
}

pub(crate) fn build_chat_request_body(
    model: &str,
    instruction: &str,
    options: &CompletionOptions,
) -> Value {
    let mut messages = Vec::new();
    if let Some(system) = &options.system_instruction {
        messages.push(json!({ "role": "system", "content": system }));
    }

    let user_content = match &options.input_image {
        Some(image) => json!([
            { "type": "text", "text": instruction },
            {
                "type": "image_url",
                "image_url": {
                    "url": format!("data:{};base64,{}", image.mime_type, BASE64.encode(&image.bytes)),
                }
            }
        ]),
        None => json!(instruction),
    };
    messages.push(json!({ "role": "user", "content": user_content }));

    let mut body = json!({
        "model": model,
        "messages": messages,
        "stream": false,
    });
    if let Some(temperature) = options.temperature {
        body["temperature"] = json!(temperature);
    }
    if let Some(max_tokens) = options.max_tokens {
        body["max_tokens"] = json!(max_tokens);
    }
    body
}

fn extract_completion_text(completion: ChatCompletionResponse) -> Result<String, BackendError> {
    let choice = completion
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| BackendError::EmptyResult("No choices in response".to_string()))?;

    if choice.finish_reason.as_deref() == Some("content_filter") {
        return Err(BackendError::ContentBlocked(
            "completion stopped by content filter".to_string(),
        ));
    }
    if let Some(refusal) = choice.message.refusal.filter(|r| !r.trim().is_empty()) {
        return Err(BackendError::ContentBlocked(format!("model refused: {}", refusal)));
    }

    choice
        .message
        .content
        .map(|content| content.trim().to_string())
        .filter(|content| !content.is_empty())
        .ok_or_else(|| BackendError::EmptyResult("response contained no text".to_string()))
}

#[async_trait]
impl TextBackend for OpenAiTextClient {
    async fn complete(
        &self,
        instruction: &str,
        options: CompletionOptions,
    ) -> Result<String, BackendError> {
        let request = build_chat_request_body(&self.model, instruction, &options);
        let url = format!("{}/chat/completions", self.base_url);
        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(map_http_error)?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(classify_status(status.as_u16(), &error_text));
        }

        let completion: ChatCompletionResponse = response.json().await.map_err(|e| {
            BackendError::BackendRejected(format!("Failed to parse response: {}", e))
        })?;
        extract_completion_text(completion)
    }

    fn provider_name(&self) -> &str {
        "openai"
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
