//! Provider profiles: configuration for the image and text backends.

use serde::{Deserialize, Serialize};

pub const DEFAULT_IMAGE_MODEL: &str = "gemini-2.5-flash-image";
pub const DEFAULT_GEMINI_TEXT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_OPENAI_TEXT_MODEL: &str = "gpt-4o-mini";

/// Text provider type
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextProviderType {
    #[default]
    Gemini,
    #[serde(rename = "openai")]
    OpenAI,
}

impl TextProviderType {
    pub fn as_str(self) -> &'static str {
        match self {
            TextProviderType::Gemini => "gemini",
            TextProviderType::OpenAI => "openai",
        }
    }
}

/// Image generation backend configuration (Gemini `generateContent`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageProviderConfig {
    #[serde(default = "default_image_model")]
    pub model: String,

    /// Falls back to GEMINI_API_KEY, then GOOGLE_API_KEY
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default)]
    pub base_url: Option<String>,

    #[serde(default = "default_image_timeout_secs")]
    pub timeout_secs: u64,
}

/// Text/evaluation backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextProviderConfig {
    #[serde(default)]
    pub provider_type: TextProviderType,

    /// Empty means "default model for the provider type"
    #[serde(default)]
    pub model: String,

    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default)]
    pub base_url: Option<String>,

    #[serde(default = "default_text_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub image: ImageProviderConfig,

    #[serde(default)]
    pub text: TextProviderConfig,
}

fn default_image_model() -> String {
    DEFAULT_IMAGE_MODEL.to_string()
}

fn default_image_timeout_secs() -> u64 {
    180
}

fn default_text_timeout_secs() -> u64 {
    60
}

impl Default for ImageProviderConfig {
    fn default() -> Self {
        Self {
            model: default_image_model(),
            api_key: None,
            base_url: None,
            timeout_secs: default_image_timeout_secs(),
        }
    }
}

impl Default for TextProviderConfig {
    fn default() -> Self {
        Self {
            provider_type: TextProviderType::default(),
            model: String::new(),
            api_key: None,
            base_url: None,
            timeout_secs: default_text_timeout_secs(),
        }
    }
}

impl ImageProviderConfig {
    pub fn resolve_api_key(&self) -> Option<String> {
        non_empty(self.api_key.clone())
            .or_else(|| non_empty_env("GEMINI_API_KEY"))
            .or_else(|| non_empty_env("GOOGLE_API_KEY"))
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.model.trim().is_empty() {
            return Err("Model name cannot be empty".to_string());
        }
        if self.timeout_secs == 0 {
            return Err("timeout_secs must be greater than zero".to_string());
        }
        Ok(())
    }
}

impl TextProviderConfig {
    pub fn effective_model(&self) -> String {
        if !self.model.trim().is_empty() {
            return self.model.trim().to_string();
        }
        match self.provider_type {
            TextProviderType::Gemini => DEFAULT_GEMINI_TEXT_MODEL.to_string(),
            TextProviderType::OpenAI => DEFAULT_OPENAI_TEXT_MODEL.to_string(),
        }
    }

    pub fn resolve_api_key(&self) -> Option<String> {
        let configured = non_empty(self.api_key.clone());
        match self.provider_type {
            TextProviderType::Gemini => configured
                .or_else(|| non_empty_env("GEMINI_API_KEY"))
                .or_else(|| non_empty_env("GOOGLE_API_KEY")),
            TextProviderType::OpenAI => configured.or_else(|| non_empty_env("OPENAI_API_KEY")),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.timeout_secs == 0 {
            return Err("timeout_secs must be greater than zero".to_string());
        }
        if let Some(base_url) = &self.base_url {
            if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
                return Err(format!("base_url must be an http(s) URL, got '{}'", base_url));
            }
        }
        Ok(())
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn non_empty_env(name: &str) -> Option<String> {
    non_empty(std::env::var(name).ok())
}
