//! Error types for the Figura figure generation service.

use std::path::PathBuf;
use thiserror::Error;

/// Classified failure of a single backend call.
///
/// The variant is assigned once, by the adapter that talked to the backend.
/// Downstream code matches on it and never inspects the message text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    #[error("Network failure: {0}")]
    Network(String),

    #[error("Backend rejected request: {0}")]
    BackendRejected(String),

    #[error("Content blocked by backend policy: {0}")]
    ContentBlocked(String),

    #[error("Backend returned no usable result: {0}")]
    EmptyResult(String),

    #[error("QA infrastructure failure: {0}")]
    QaInfrastructure(String),
}

impl BackendError {
    /// Stable machine-readable kind, used in tool responses and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            BackendError::Network(_) => "network",
            BackendError::BackendRejected(_) => "backend_rejected",
            BackendError::ContentBlocked(_) => "content_blocked",
            BackendError::EmptyResult(_) => "empty_result",
            BackendError::QaInfrastructure(_) => "qa_infrastructure",
        }
    }
}

/// Tool argument validation errors. Raised before any backend is contacted.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Invalid tool arguments: {0}")]
    InvalidArguments(String),

    #[error("Prompt must not be empty")]
    EmptyPrompt,

    #[error("Prompt exceeds {max} characters (got {actual})")]
    PromptTooLong { max: usize, actual: usize },

    #[error("Unsupported aspect ratio: {0}")]
    UnsupportedAspectRatio(String),

    #[error("Style tag exceeds {max} characters")]
    StyleTooLong { max: usize },

    #[error("Source image not found: {0}")]
    SourceImageNotFound(PathBuf),

    #[error("Source image must stay inside the workspace: {0}")]
    SourceImageOutsideWorkspace(String),

    #[error("Source image is {actual} bytes (max {max})")]
    SourceImageTooLarge { max: usize, actual: usize },

    #[error("Source image format is not one of png, jpeg, webp, gif")]
    UnsupportedSourceImage,

    #[error("Invalid source image data: {0}")]
    InvalidSourceImage(String),

    #[error("Invalid output path: {0}")]
    InvalidOutputPath(String),
}

/// Errors writing the final artifact.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("Invalid output path: {0}")]
    InvalidPath(String),

    #[error("Persistence I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to encode QA sidecar: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Operation-level errors surfaced to the tool caller.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    #[error("Provider not configured: {0}")]
    ProviderNotConfigured(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl ApiError {
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "validation",
            ApiError::Backend(err) => err.kind(),
            ApiError::Persistence(_) => "persistence",
            ApiError::ProviderNotConfigured(_) | ApiError::ConfigError(_) => "config",
        }
    }
}

impl From<config::ConfigError> for ApiError {
    fn from(err: config::ConfigError) -> Self {
        ApiError::ConfigError(err.to_string())
    }
}
