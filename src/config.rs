//! Configuration System
//!
//! Layered configuration: built-in defaults, the global user file, workspace
//! files, `FIGURA__SECTION__KEY` environment variables and an explicit file.
//! `FiguraConfig::validate` reports every problem at once.

use crate::enrichment::{DEFAULT_ENRICHMENT_MAX_TOKENS, DEFAULT_ENRICHMENT_TEMPERATURE};
use crate::error::ApiError;
use crate::logging::LoggingConfig;
use crate::provider::ProvidersConfig;
use crate::qa::evaluator::DEFAULT_QA_TEMPERATURE;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

mod loader;
mod merge;
mod sources;

pub use loader::ConfigLoader;
pub use sources::global_file::global_config_path;

/// Upper bound for `qa.max_retries`.
pub const MAX_QA_RETRIES: u32 = 5;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FiguraConfig {
    #[serde(default)]
    pub providers: ProvidersConfig,

    #[serde(default)]
    pub qa: QaConfig,

    #[serde(default)]
    pub enrichment: EnrichmentConfig,

    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QaConfig {
    /// Global QA switch; a per-call flag overrides it.
    #[serde(default)]
    pub enabled: bool,

    /// Regenerations allowed after the first attempt.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_qa_temperature")]
    pub temperature: f32,
}

fn default_max_retries() -> u32 {
    1
}

fn default_qa_temperature() -> f32 {
    DEFAULT_QA_TEMPERATURE
}

impl Default for QaConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            max_retries: default_max_retries(),
            temperature: default_qa_temperature(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichmentConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_enrichment_temperature")]
    pub temperature: f32,

    #[serde(default = "default_enrichment_max_tokens")]
    pub max_tokens: u32,
}

fn default_true() -> bool {
    true
}

fn default_enrichment_temperature() -> f32 {
    DEFAULT_ENRICHMENT_TEMPERATURE
}

fn default_enrichment_max_tokens() -> u32 {
    DEFAULT_ENRICHMENT_MAX_TOKENS
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            temperature: default_enrichment_temperature(),
            max_tokens: default_enrichment_max_tokens(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Output root; relative paths resolve against the workspace.
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,

    #[serde(default)]
    pub write_qa_sidecar: bool,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("figures")
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            write_qa_sidecar: false,
        }
    }
}

impl OutputConfig {
    pub fn resolve_root(&self, workspace_root: &Path) -> PathBuf {
        if self.dir.is_absolute() {
            self.dir.clone()
        } else {
            workspace_root.join(&self.dir)
        }
    }
}

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValidationError {
    Provider(String, String),
    Qa(String),
    Enrichment(String),
    Output(String),
}

impl fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigValidationError::Provider(name, msg) => write!(f, "Provider '{}': {}", name, msg),
            ConfigValidationError::Qa(msg) => write!(f, "QA: {}", msg),
            ConfigValidationError::Enrichment(msg) => write!(f, "Enrichment: {}", msg),
            ConfigValidationError::Output(msg) => write!(f, "Output: {}", msg),
        }
    }
}

impl std::error::Error for ConfigValidationError {}

fn temperature_in_range(value: f32) -> bool {
    (0.0..=2.0).contains(&value)
}

impl FiguraConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), Vec<ConfigValidationError>> {
        let mut errors = Vec::new();

        if let Err(e) = self.providers.image.validate() {
            errors.push(ConfigValidationError::Provider("image".to_string(), e));
        }
        if let Err(e) = self.providers.text.validate() {
            errors.push(ConfigValidationError::Provider("text".to_string(), e));
        }

        if self.qa.max_retries > MAX_QA_RETRIES {
            errors.push(ConfigValidationError::Qa(format!(
                "max_retries must be at most {} (got {})",
                MAX_QA_RETRIES, self.qa.max_retries
            )));
        }
        if !temperature_in_range(self.qa.temperature) {
            errors.push(ConfigValidationError::Qa(format!(
                "temperature must be within [0, 2] (got {})",
                self.qa.temperature
            )));
        }

        if !temperature_in_range(self.enrichment.temperature) {
            errors.push(ConfigValidationError::Enrichment(format!(
                "temperature must be within [0, 2] (got {})",
                self.enrichment.temperature
            )));
        }
        if self.enrichment.max_tokens == 0 {
            errors.push(ConfigValidationError::Enrichment(
                "max_tokens must be greater than zero".to_string(),
            ));
        }

        if self.output.dir.as_os_str().is_empty() {
            errors.push(ConfigValidationError::Output("dir cannot be empty".to_string()));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// `validate` folded into a single `ApiError`.
    pub fn ensure_valid(&self) -> Result<(), ApiError> {
        self.validate().map_err(|errors| {
            let error_msgs: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            ApiError::ConfigError(format!(
                "Configuration validation failed:\n{}",
                error_msgs.join("\n")
            ))
        })
    }
}
