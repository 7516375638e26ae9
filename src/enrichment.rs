//! Prompt enrichment
//!
//! Rewrites a terse user request into a detailed generation prompt using the
//! text backend. The rewrite runs at most once per operation.

use crate::error::BackendError;
use crate::figure::FigureStyle;
use crate::provider::{strip_code_fences, CompletionOptions, TextBackend};
use std::sync::Arc;

pub const DEFAULT_ENRICHMENT_TEMPERATURE: f32 = 0.4;
pub const DEFAULT_ENRICHMENT_MAX_TOKENS: u32 = 1024;

const SYSTEM_INSTRUCTION: &str = "You are a prompt writer for an image generation model. \
    Rewrite the user's request into one detailed, self-contained image prompt. Preserve every \
    concrete fact, label, number and name from the request verbatim. Describe composition, \
    layout, colours and typography. Reply with the prompt text only.";

pub struct PromptEnricher {
    text: Arc<dyn TextBackend>,
    temperature: f32,
    max_tokens: u32,
}

impl PromptEnricher {
    pub fn new(text: Arc<dyn TextBackend>) -> Self {
        Self {
            text,
            temperature: DEFAULT_ENRICHMENT_TEMPERATURE,
            max_tokens: DEFAULT_ENRICHMENT_MAX_TOKENS,
        }
    }

    pub fn with_limits(mut self, temperature: f32, max_tokens: u32) -> Self {
        self.temperature = temperature;
        self.max_tokens = max_tokens;
        self
    }

    pub async fn enrich(
        &self,
        prompt: &str,
        style: Option<FigureStyle>,
    ) -> Result<String, BackendError> {
        let instruction = build_enrichment_instruction(prompt, style);
        let options = CompletionOptions {
            temperature: Some(self.temperature),
            max_tokens: Some(self.max_tokens),
            system_instruction: Some(SYSTEM_INSTRUCTION.to_string()),
            input_image: None,
        };
        let reply = self.text.complete(&instruction, options).await?;
        let enriched = strip_code_fences(&reply).trim();
        if enriched.is_empty() {
            return Err(BackendError::EmptyResult(
                "enrichment reply was empty".to_string(),
            ));
        }
        Ok(enriched.to_string())
    }
}

pub fn build_enrichment_instruction(prompt: &str, style: Option<FigureStyle>) -> String {
    match style {
        Some(style) => format!(
            "Target figure: {}.\n\nRequest:\n{}",
            style.framing(),
            prompt.trim()
        ),
        None => format!("Request:\n{}", prompt.trim()),
    }
}
