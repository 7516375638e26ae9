//! Gemini `generateContent` adapters.
//!
//! One endpoint wrapper shared by the image client and the text client. Both
//! classify failures here, where the response is still in hand.

use super::{
    build_provider_http_client, classify_status, map_http_error, CompletionOptions,
    GenerationRequest, GenerationResult, ImageBackend, TextBackend,
};
use crate::error::{ApiError, BackendError};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::Utc;
use reqwest::Client;
use serde_json::{json, Map, Value};
use std::time::Duration;
use tracing::debug;

const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Candidate finish reasons that mean the backend refused on policy grounds.
const BLOCKING_FINISH_REASONS: [&str; 6] = [
    "SAFETY",
    "PROHIBITED_CONTENT",
    "IMAGE_SAFETY",
    "BLOCKLIST",
    "SPII",
    "RECITATION",
];

struct GeminiEndpoint {
    client: Client,
    model: String,
    api_key: String,
    base_url: String,
}

impl GeminiEndpoint {
    fn new(
        model: String,
        api_key: String,
        base_url: Option<String>,
        timeout: Duration,
    ) -> Result<Self, ApiError> {
        let base_url = base_url
            .map(|value| value.trim().trim_end_matches('/').to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.to_string());
        Ok(Self {
            client: build_provider_http_client(timeout)?,
            model,
            api_key,
            base_url,
        })
    }

    fn url(&self) -> String {
        let model = self.model.trim();
        let model_path = if model.starts_with("models/") {
            model.to_string()
        } else {
            format!("models/{}", model)
        };
        format!("{}/{}:generateContent", self.base_url, model_path)
    }

    async fn post(&self, body: &Value) -> Result<Value, BackendError> {
        let response = self
            .client
            .post(self.url())
            .header("x-goog-api-key", &self.api_key)
            .json(body)
            .send()
            .await
            .map_err(map_http_error)?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(classify_status(status.as_u16(), &error_text));
        }

        response.json::<Value>().await.map_err(|e| {
            BackendError::BackendRejected(format!("Failed to parse Gemini response: {}", e))
        })
    }
}

/// Gemini image generation client
pub struct GeminiImageClient {
    endpoint: GeminiEndpoint,
}

impl GeminiImageClient {
    pub fn new(
        model: String,
        api_key: String,
        base_url: Option<String>,
        timeout: Duration,
    ) -> Result<Self, ApiError> {
        Ok(Self {
            endpoint: GeminiEndpoint::new(model, api_key, base_url, timeout)?,
        })
    }
}

#[async_trait]
impl ImageBackend for GeminiImageClient {
    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationResult, BackendError> {
        let body = build_image_request_body(request);
        debug!(
            model = %self.endpoint.model,
            prompt_chars = request.prompt.chars().count(),
            has_source_image = request.source_image.is_some(),
            grounding = request.options.grounding,
            "Sending Gemini image request"
        );
        let payload = self.endpoint.post(&body).await?;
        let (bytes, mime_type) = extract_inline_image(&payload)?;
        let model = payload
            .get("modelVersion")
            .and_then(Value::as_str)
            .unwrap_or(&self.endpoint.model)
            .to_string();

        Ok(GenerationResult {
            bytes,
            mime_type,
            model,
            prompt: request.prompt.clone(),
            generated_at: Utc::now(),
        })
    }

    fn provider_name(&self) -> &str {
        "gemini"
    }

    fn model_name(&self) -> &str {
        &self.endpoint.model
    }
}

/// Gemini text / multimodal evaluation client
pub struct GeminiTextClient {
    endpoint: GeminiEndpoint,
}

impl GeminiTextClient {
    pub fn new(
        model: String,
        api_key: String,
        base_url: Option<String>,
        timeout: Duration,
    ) -> Result<Self, ApiError> {
        Ok(Self {
            endpoint: GeminiEndpoint::new(model, api_key, base_url, timeout)?,
        })
    }
}

#[async_trait]
impl TextBackend for GeminiTextClient {
    async fn complete(
        &self,
        instruction: &str,
        options: CompletionOptions,
    ) -> Result<String, BackendError> {
        let body = build_text_request_body(instruction, &options);
        let payload = self.endpoint.post(&body).await?;
        extract_text(&payload)
    }

    fn provider_name(&self) -> &str {
        "gemini"
    }

    fn model_name(&self) -> &str {
        &self.endpoint.model
    }
}

fn inline_data_part(bytes: &[u8], mime_type: &str) -> Value {
    json!({
        "inlineData": {
            "mimeType": mime_type,
            "data": BASE64.encode(bytes),
        }
    })
}

pub(crate) fn build_image_request_body(request: &GenerationRequest) -> Value {
    let mut parts = Vec::new();
    if let Some(source) = request.source_image.as_deref() {
        parts.push(inline_data_part(&source.bytes, &source.mime_type));
        parts.push(json!({ "text": request.options.edit_fidelity.instruction() }));
    }
    if let Some(style) = request.options.style.as_deref() {
        parts.push(json!({ "text": format!("Visual style: {}.", style) }));
    }
    parts.push(json!({ "text": request.prompt }));

    let mut image_config = Map::new();
    if let Some(ratio) = &request.options.aspect_ratio {
        image_config.insert("aspectRatio".to_string(), json!(ratio.as_str()));
    }
    if let Some(resolution) = request.options.resolution {
        image_config.insert("imageSize".to_string(), json!(resolution.as_str()));
    }

    let mut body = json!({
        "contents": [{ "role": "user", "parts": parts }],
        "generationConfig": {
            "responseModalities": ["TEXT", "IMAGE"],
        },
    });
    if !image_config.is_empty() {
        body["generationConfig"]["imageConfig"] = Value::Object(image_config);
    }
    if request.options.grounding {
        body["tools"] = json!([{ "google_search": {} }]);
    }
    body
}

pub(crate) fn build_text_request_body(instruction: &str, options: &CompletionOptions) -> Value {
    let mut parts = vec![json!({ "text": instruction })];
    if let Some(image) = &options.input_image {
        parts.push(inline_data_part(&image.bytes, &image.mime_type));
    }

    let mut generation_config = Map::new();
    if let Some(temperature) = options.temperature {
        generation_config.insert("temperature".to_string(), json!(temperature));
    }
    if let Some(max_tokens) = options.max_tokens {
        generation_config.insert("maxOutputTokens".to_string(), json!(max_tokens));
    }

    let mut body = json!({
        "contents": [{ "role": "user", "parts": parts }],
        "generationConfig": Value::Object(generation_config),
    });
    if let Some(system) = &options.system_instruction {
        body["systemInstruction"] = json!({ "parts": [{ "text": system }] });
    }
    body
}

fn candidate_parts(payload: &Value) -> impl Iterator<Item = &Value> {
    payload
        .get("candidates")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(|candidate| candidate.pointer("/content/parts").and_then(Value::as_array))
        .flatten()
}

fn prompt_block_reason(payload: &Value) -> Option<&str> {
    payload
        .pointer("/promptFeedback/blockReason")
        .and_then(Value::as_str)
}

fn blocking_finish_reason(payload: &Value) -> Option<&str> {
    payload
        .get("candidates")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(|candidate| candidate.get("finishReason").and_then(Value::as_str))
        .find(|reason| BLOCKING_FINISH_REASONS.contains(reason))
}

pub(crate) fn extract_inline_image(payload: &Value) -> Result<(Vec<u8>, String), BackendError> {
    if let Some(reason) = prompt_block_reason(payload) {
        return Err(BackendError::ContentBlocked(format!(
            "prompt blocked ({})",
            reason
        )));
    }

    for part in candidate_parts(payload) {
        let Some(inline) = part.get("inlineData").or_else(|| part.get("inline_data")) else {
            continue;
        };
        let data = inline.get("data").and_then(Value::as_str).unwrap_or_default();
        if data.is_empty() {
            continue;
        }
        let bytes = BASE64.decode(data.as_bytes()).map_err(|e| {
            BackendError::BackendRejected(format!("Gemini image base64 decode failed: {}", e))
        })?;
        let mime_type = inline
            .get("mimeType")
            .or_else(|| inline.get("mime_type"))
            .and_then(Value::as_str)
            .unwrap_or("image/png")
            .to_string();
        return Ok((bytes, mime_type));
    }

    if let Some(reason) = blocking_finish_reason(payload) {
        return Err(BackendError::ContentBlocked(format!(
            "generation stopped ({})",
            reason
        )));
    }

    let text = collect_text(payload);
    Err(BackendError::EmptyResult(if text.is_empty() {
        "response contained no image".to_string()
    } else {
        format!("response contained no image; model said: {}", text)
    }))
}

fn collect_text(payload: &Value) -> String {
    candidate_parts(payload)
        .filter_map(|part| part.get("text").and_then(Value::as_str))
        .collect::<Vec<_>>()
        .join("")
        .trim()
        .to_string()
}

pub(crate) fn extract_text(payload: &Value) -> Result<String, BackendError> {
    if let Some(reason) = prompt_block_reason(payload) {
        return Err(BackendError::ContentBlocked(format!(
            "prompt blocked ({})",
            reason
        )));
    }
    let text = collect_text(payload);
    if !text.is_empty() {
        return Ok(text);
    }
    if let Some(reason) = blocking_finish_reason(payload) {
        return Err(BackendError::ContentBlocked(format!(
            "completion stopped ({})",
            reason
        )));
    }
    Err(BackendError::EmptyResult(
        "response contained no text".to_string(),
    ))
}
