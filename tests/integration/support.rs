//! Scripted backends and tool builders shared by the integration tests.

use async_trait::async_trait;
use chrono::Utc;
use figura::config::FiguraConfig;
use figura::error::BackendError;
use figura::persistence::FsArtifactStore;
use figura::provider::{
    BackendHandles, CompletionOptions, GenerationRequest, GenerationResult, ImageBackend,
    TextBackend,
};
use figura::tool::FigureTool;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::path::Path;
use std::sync::Arc;

pub const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 13];

/// Image backend replaying queued outcomes; returns PNG bytes once the queue drains.
pub struct ScriptedImage {
    outcomes: Mutex<VecDeque<Result<Vec<u8>, BackendError>>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedImage {
    pub fn new(outcomes: Vec<Result<Vec<u8>, BackendError>>) -> Arc<Self> {
        Arc::new(Self {
            outcomes: Mutex::new(outcomes.into()),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn always_png() -> Arc<Self> {
        Self::new(Vec::new())
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }
}

#[async_trait]
impl ImageBackend for ScriptedImage {
    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResult, BackendError> {
        self.prompts.lock().push(request.prompt.clone());
        let next = self.outcomes.lock().pop_front();
        let bytes = next.unwrap_or_else(|| Ok(PNG.to_vec()))?;
        Ok(GenerationResult {
            bytes,
            mime_type: "image/png".to_string(),
            model: "scripted-image".to_string(),
            prompt: request.prompt.clone(),
            generated_at: Utc::now(),
        })
    }

    fn provider_name(&self) -> &str {
        "scripted"
    }

    fn model_name(&self) -> &str {
        "scripted-image"
    }
}

/// Text backend replaying queued replies and recording every call.
pub struct ScriptedText {
    replies: Mutex<VecDeque<Result<String, BackendError>>>,
    calls: Mutex<Vec<(String, CompletionOptions)>>,
}

impl ScriptedText {
    pub fn new(replies: Vec<Result<String, BackendError>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    pub fn calls(&self) -> Vec<(String, CompletionOptions)> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl TextBackend for ScriptedText {
    async fn complete(
        &self,
        instruction: &str,
        options: CompletionOptions,
    ) -> Result<String, BackendError> {
        self.calls.lock().push((instruction.to_string(), options));
        let next = self.replies.lock().pop_front();
        next.unwrap_or_else(|| Err(BackendError::EmptyResult("no scripted reply".to_string())))
    }

    fn provider_name(&self) -> &str {
        "scripted"
    }

    fn model_name(&self) -> &str {
        "scripted-text"
    }
}

/// Evaluator reply listing `(id, status, detail)` entries.
pub fn qa_reply(entries: &[(&str, &str, &str)]) -> String {
    let checks: Vec<serde_json::Value> = entries
        .iter()
        .map(|(id, status, detail)| {
            serde_json::json!({ "id": id, "status": status, "detail": detail })
        })
        .collect();
    serde_json::json!({ "checks": checks }).to_string()
}

/// Defaults with enrichment off so only QA calls reach the text backend.
pub fn config_with_qa(enabled: bool, max_retries: u32) -> FiguraConfig {
    let mut config = FiguraConfig::default();
    config.qa.enabled = enabled;
    config.qa.max_retries = max_retries;
    config.enrichment.enabled = false;
    config
}

pub fn build_tool(
    config: FiguraConfig,
    workspace: &Path,
    image: Arc<ScriptedImage>,
    text: Arc<ScriptedText>,
) -> FigureTool {
    let store = FsArtifactStore::new(config.output.resolve_root(workspace))
        .with_qa_sidecar(config.output.write_qa_sidecar);
    FigureTool::with_components(
        config,
        workspace.to_path_buf(),
        Arc::new(BackendHandles::with_backends(image, Some(text))),
        Arc::new(store),
    )
}
