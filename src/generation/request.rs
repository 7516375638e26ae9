use crate::figure::FigureStyle;
use crate::provider::{GenerationRequest, GenerationResult};
use crate::qa::QaReport;

/// QA runs only for styled figures. A per-call flag overrides the global
/// setting in either direction.
pub fn qa_active(style: Option<FigureStyle>, per_call: Option<bool>, global_enabled: bool) -> bool {
    style.is_some() && per_call.unwrap_or(global_enabled)
}

/// Validated input to one orchestration run.
#[derive(Debug, Clone)]
pub struct OrchestrationRequest {
    /// Carries the caller's original prompt; attempts replace only the prompt.
    pub generation: GenerationRequest,
    pub figure_style: Option<FigureStyle>,
    pub qa: bool,
    pub enrich: bool,
}

impl OrchestrationRequest {
    pub fn new(generation: GenerationRequest) -> Self {
        Self {
            generation,
            figure_style: None,
            qa: false,
            enrich: false,
        }
    }

    pub fn with_style(mut self, style: Option<FigureStyle>) -> Self {
        self.figure_style = style;
        self
    }

    pub fn with_qa(mut self, qa: bool) -> Self {
        self.qa = qa;
        self
    }

    pub fn with_enrichment(mut self, enrich: bool) -> Self {
        self.enrich = enrich;
        self
    }

    /// Style to evaluate against, when QA applies to this run.
    pub fn qa_style(&self) -> Option<FigureStyle> {
        self.figure_style.filter(|_| self.qa)
    }

    pub fn original_prompt(&self) -> &str {
        &self.generation.prompt
    }
}

/// Final artifact and report of a completed run.
#[derive(Debug, Clone)]
pub struct OrchestrationOutcome {
    pub artifact: GenerationResult,
    /// Absent when QA was inactive.
    pub report: Option<QaReport>,
    pub attempts: u32,
    /// Prompt every attempt was derived from (enriched or original).
    pub structured_prompt: String,
    pub enrichment_applied: bool,
}
