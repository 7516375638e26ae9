//! Backend Provider Abstraction
//!
//! Narrow async interfaces to the image-generation backend and the text/evaluation
//! backend, plus the request and result types that cross them. Adapters classify
//! every failure into a [`BackendError`] variant at the point the call returns;
//! nothing downstream re-derives the class from message text.

use crate::error::{ApiError, BackendError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

pub mod gemini;
pub mod handles;
pub mod openai;
pub mod profile;

pub use handles::BackendHandles;
pub use profile::{ImageProviderConfig, ProvidersConfig, TextProviderConfig, TextProviderType};

/// Aspect ratios accepted by the image backend.
pub const SUPPORTED_ASPECT_RATIOS: [&str; 10] = [
    "1:1", "2:3", "3:2", "3:4", "4:3", "4:5", "5:4", "9:16", "16:9", "21:9",
];

/// Validated aspect ratio, e.g. `16:9`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct AspectRatio(String);

impl AspectRatio {
    pub fn parse(value: &str) -> Option<Self> {
        let trimmed = value.trim();
        SUPPORTED_ASPECT_RATIOS
            .iter()
            .find(|candidate| **candidate == trimmed)
            .map(|candidate| AspectRatio(candidate.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Output resolution tier.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
pub enum Resolution {
    #[serde(rename = "1K")]
    #[value(name = "1K", alias = "1k")]
    OneK,
    #[serde(rename = "2K")]
    #[value(name = "2K", alias = "2k")]
    TwoK,
    #[serde(rename = "4K")]
    #[value(name = "4K", alias = "4k")]
    FourK,
}

impl Resolution {
    pub fn as_str(self) -> &'static str {
        match self {
            Resolution::OneK => "1K",
            Resolution::TwoK => "2K",
            Resolution::FourK => "4K",
        }
    }
}

/// How closely an edit should track the source image.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum EditFidelity {
    Preserve,
    #[default]
    Balanced,
    Creative,
}

impl EditFidelity {
    pub fn as_str(self) -> &'static str {
        match self {
            EditFidelity::Preserve => "preserve",
            EditFidelity::Balanced => "balanced",
            EditFidelity::Creative => "creative",
        }
    }

    /// Instruction sent alongside a source image.
    pub fn instruction(self) -> &'static str {
        match self {
            EditFidelity::Preserve => {
                "Edit the provided image. Keep its composition, layout, colours and all \
                 existing content unchanged except for what the request explicitly asks to change."
            }
            EditFidelity::Balanced => {
                "Use the provided image as the base. Apply the requested changes while keeping \
                 its overall composition and key elements recognisable."
            }
            EditFidelity::Creative => {
                "Use the provided image as loose reference. You may reinterpret layout and \
                 styling freely to satisfy the request."
            }
        }
    }
}

/// Image bytes supplied by the caller for edit requests.
#[derive(Clone, PartialEq, Eq)]
pub struct SourceImage {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

impl fmt::Debug for SourceImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceImage")
            .field("bytes", &self.bytes.len())
            .field("mime_type", &self.mime_type)
            .finish()
    }
}

/// Per-request generation options passed through to the image backend.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationOptions {
    pub aspect_ratio: Option<AspectRatio>,
    pub resolution: Option<Resolution>,
    pub style: Option<String>,
    pub grounding: bool,
    pub edit_fidelity: EditFidelity,
}

/// One image generation call. Built once per attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub prompt: String,
    pub source_image: Option<Arc<SourceImage>>,
    pub options: GenerationOptions,
}

impl GenerationRequest {
    pub fn new(
        prompt: impl Into<String>,
        source_image: Option<Arc<SourceImage>>,
        options: GenerationOptions,
    ) -> Self {
        Self {
            prompt: prompt.into(),
            source_image,
            options,
        }
    }

    /// Copy of this request carrying a different prompt.
    pub fn with_prompt(&self, prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            source_image: self.source_image.clone(),
            options: self.options.clone(),
        }
    }
}

/// Output of one successful generation attempt.
#[derive(Clone, PartialEq, Eq)]
pub struct GenerationResult {
    pub bytes: Vec<u8>,
    pub mime_type: String,
    pub model: String,
    pub prompt: String,
    pub generated_at: DateTime<Utc>,
}

impl fmt::Debug for GenerationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenerationResult")
            .field("bytes", &self.bytes.len())
            .field("mime_type", &self.mime_type)
            .field("model", &self.model)
            .field("generated_at", &self.generated_at)
            .finish()
    }
}

/// Text completion options.
#[derive(Debug, Clone, Default)]
pub struct CompletionOptions {
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub system_instruction: Option<String>,
    pub input_image: Option<SourceImage>,
}

/// Image generation backend.
#[async_trait]
pub trait ImageBackend: Send + Sync {
    async fn generate(&self, request: &GenerationRequest)
        -> Result<GenerationResult, BackendError>;

    fn provider_name(&self) -> &str;

    fn model_name(&self) -> &str;
}

/// Text (optionally multimodal) completion backend.
#[async_trait]
pub trait TextBackend: Send + Sync {
    async fn complete(
        &self,
        instruction: &str,
        options: CompletionOptions,
    ) -> Result<String, BackendError>;

    fn provider_name(&self) -> &str;

    fn model_name(&self) -> &str;
}

/// Creates backend clients from provider configuration.
pub struct ProviderFactory;

impl ProviderFactory {
    pub fn create_image_client(
        config: &ImageProviderConfig,
    ) -> Result<Arc<dyn ImageBackend>, ApiError> {
        let api_key = config.resolve_api_key().ok_or_else(|| {
            ApiError::ProviderNotConfigured(
                "image provider requires an API key (providers.image.api_key or GEMINI_API_KEY)"
                    .to_string(),
            )
        })?;
        let client = gemini::GeminiImageClient::new(
            config.model.clone(),
            api_key,
            config.base_url.clone(),
            Duration::from_secs(config.timeout_secs),
        )?;
        Ok(Arc::new(client))
    }

    pub fn create_text_client(
        config: &TextProviderConfig,
    ) -> Result<Arc<dyn TextBackend>, ApiError> {
        let api_key = config.resolve_api_key().ok_or_else(|| {
            ApiError::ProviderNotConfigured(format!(
                "text provider '{}' requires an API key",
                config.provider_type.as_str()
            ))
        })?;
        let timeout = Duration::from_secs(config.timeout_secs);
        match config.provider_type {
            TextProviderType::Gemini => Ok(Arc::new(gemini::GeminiTextClient::new(
                config.model.clone(),
                api_key,
                config.base_url.clone(),
                timeout,
            )?)),
            TextProviderType::OpenAI => Ok(Arc::new(openai::OpenAiTextClient::new(
                config.model.clone(),
                api_key,
                config.base_url.clone(),
                timeout,
            )?)),
        }
    }
}

const PROVIDER_HTTP_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const ERROR_BODY_EXCERPT_CHARS: usize = 400;

pub(crate) fn build_provider_http_client(request_timeout: Duration) -> Result<Client, ApiError> {
    Client::builder()
        .connect_timeout(PROVIDER_HTTP_CONNECT_TIMEOUT)
        .timeout(request_timeout)
        .build()
        .map_err(|e| ApiError::ConfigError(format!("Failed to create HTTP client: {}", e)))
}

/// Classify a transport-level reqwest error.
pub(crate) fn map_http_error(error: reqwest::Error) -> BackendError {
    if error.is_timeout() {
        BackendError::Network(format!("Request timeout: {}", error))
    } else if error.is_connect() {
        BackendError::Network(format!("Connection error: {}", error))
    } else if let Some(status) = error.status() {
        classify_status(status.as_u16(), &error.to_string())
    } else if error.is_decode() {
        BackendError::BackendRejected(format!("Undecodable response: {}", error))
    } else {
        BackendError::Network(format!("HTTP error: {}", error))
    }
}

/// Classify a non-success HTTP status. Server-side (5xx) failures are treated as
/// transport problems; every 4xx is a rejection of the request itself.
pub(crate) fn classify_status(status: u16, body: &str) -> BackendError {
    let excerpt = excerpt(body);
    if status >= 500 {
        BackendError::Network(format!("HTTP {}: {}", status, excerpt))
    } else {
        let reason = match status {
            401 | 403 => "authentication failed",
            404 => "model or endpoint not found",
            429 => "quota or rate limit exceeded",
            _ => "malformed request",
        };
        BackendError::BackendRejected(format!("HTTP {} ({}): {}", status, reason, excerpt))
    }
}

fn excerpt(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.chars().count() <= ERROR_BODY_EXCERPT_CHARS {
        return trimmed.to_string();
    }
    let mut cut: String = trimmed.chars().take(ERROR_BODY_EXCERPT_CHARS).collect();
    cut.push('…');
    cut
}

/// Remove a surrounding Markdown code fence (```json ... ```) from a model reply.
pub fn strip_code_fences(reply: &str) -> &str {
    let trimmed = reply.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string (e.g. `json`) on the opening fence line.
    let body = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => single_line_body(rest),
    };
    body.trim_end()
        .strip_suffix("```")
        .unwrap_or(body)
        .trim()
}

// "```json{...}```": drop the info string only when JSON follows it directly.
fn single_line_body(rest: &str) -> &str {
    let after_info = rest.trim_start_matches(|c: char| c.is_ascii_alphabetic());
    if after_info.len() < rest.len() && after_info.trim_start().starts_with(|c| c == '{' || c == '[') {
        after_info
    } else {
        rest
    }
}
