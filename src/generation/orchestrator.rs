//! Generate/QA retry loop.
//!
//! enriching -> generating -> evaluating -> (patching -> generating) | done
//!
//! Every attempt's prompt is derived from the structured prompt and the latest
//! report only. Backend failures abort the run; QA failures drive retries until
//! the budget is spent; QA infrastructure failures never retry.

use super::request::{OrchestrationOutcome, OrchestrationRequest};
use crate::enrichment::PromptEnricher;
use crate::error::BackendError;
use crate::figure::FigureStyle;
use crate::provider::{GenerationResult, ImageBackend};
use crate::qa::{build_attempt_prompt, build_retry_patch, QaReport, QualityGate};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct FigureOrchestrator {
    image: Arc<dyn ImageBackend>,
    enricher: Option<Arc<PromptEnricher>>,
    gate: Option<Arc<dyn QualityGate>>,
    max_retries: u32,
}

impl FigureOrchestrator {
    pub fn new(image: Arc<dyn ImageBackend>, max_retries: u32) -> Self {
        Self {
            image,
            enricher: None,
            gate: None,
            max_retries,
        }
    }

    pub fn with_enricher(mut self, enricher: Option<Arc<PromptEnricher>>) -> Self {
        self.enricher = enricher;
        self
    }

    pub fn with_gate(mut self, gate: Option<Arc<dyn QualityGate>>) -> Self {
        self.gate = gate;
        self
    }

    pub async fn run(
        &self,
        request: &OrchestrationRequest,
    ) -> Result<OrchestrationOutcome, BackendError> {
        let (structured_prompt, enrichment_applied) = self.structured_prompt(request).await;
        let qa_style = request.qa_style();
        let max_attempts = match qa_style {
            Some(_) => self.max_retries.saturating_add(1),
            None => 1,
        };
        let style_field = request.figure_style.map(FigureStyle::as_str).unwrap_or("none");

        let mut attempt: u32 = 1;
        let mut previous_report: Option<QaReport> = None;
        loop {
            let prompt = build_attempt_prompt(&structured_prompt, previous_report.as_ref());
            info!(
                phase = "generating",
                attempt,
                max_attempts,
                figure_style = style_field,
                "Generating figure"
            );
            let artifact = self
                .image
                .generate(&request.generation.with_prompt(prompt))
                .await
                .map_err(|err| {
                    warn!(
                        phase = "generating",
                        attempt,
                        error_kind = err.kind(),
                        error = %err,
                        "Image generation failed"
                    );
                    err
                })?;

            let Some(style) = qa_style else {
                info!(phase = "done", attempt, qa = false, "Figure generated");
                return Ok(OrchestrationOutcome {
                    artifact,
                    report: None,
                    attempts: attempt,
                    structured_prompt,
                    enrichment_applied,
                });
            };

            let report = self
                .evaluate(&artifact, style, request.original_prompt())
                .await
                .with_attempts(attempt);

            if report.passed() || attempt >= max_attempts {
                return Ok(self.finish(artifact, report, structured_prompt, enrichment_applied, max_attempts));
            }

            let patch = build_retry_patch(&report.checks);
            if patch.is_empty() {
                return Ok(self.finish(artifact, report, structured_prompt, enrichment_applied, max_attempts));
            }

            info!(
                phase = "patching",
                attempt,
                max_attempts,
                figure_style = style_field,
                hard_fail_count = report.hard_fail_count(),
                failed_checks = %failed_ids(&report),
                "QA failed; retrying with corrections"
            );
            previous_report = Some(report);
            attempt += 1;
        }
    }

    async fn structured_prompt(&self, request: &OrchestrationRequest) -> (String, bool) {
        let original = request.original_prompt();
        if !request.enrich {
            return (original.to_string(), false);
        }
        let Some(enricher) = &self.enricher else {
            debug!(phase = "enriching", "No enrichment backend; using original prompt");
            return (original.to_string(), false);
        };

        info!(phase = "enriching", "Enriching prompt");
        match enricher.enrich(original, request.figure_style).await {
            Ok(enriched) => (enriched, true),
            Err(err) => {
                warn!(
                    phase = "enriching",
                    error_kind = err.kind(),
                    error = %err,
                    "Prompt enrichment failed; using original prompt"
                );
                (original.to_string(), false)
            }
        }
    }

    async fn evaluate(
        &self,
        artifact: &GenerationResult,
        style: FigureStyle,
        original_prompt: &str,
    ) -> QaReport {
        info!(phase = "evaluating", figure_style = style.as_str(), "Evaluating figure");
        let Some(gate) = &self.gate else {
            warn!(
                phase = "evaluating",
                qa_status = "qa_unavailable",
                "No QA evaluator available; figure is unreviewed"
            );
            return QaReport::unavailable(style, "no QA evaluator configured", 0);
        };
        match gate.evaluate(artifact, style, original_prompt).await {
            Ok(report) => report,
            Err(err) => {
                warn!(
                    phase = "evaluating",
                    qa_status = "qa_unavailable",
                    error_kind = err.kind(),
                    error = %err,
                    "QA evaluation failed; figure is unreviewed"
                );
                QaReport::unavailable(style, err.to_string(), 0)
            }
        }
    }

    fn finish(
        &self,
        artifact: GenerationResult,
        report: QaReport,
        structured_prompt: String,
        enrichment_applied: bool,
        max_attempts: u32,
    ) -> OrchestrationOutcome {
        info!(
            phase = "done",
            attempt = report.attempts,
            max_attempts,
            figure_style = report.figure_style.as_str(),
            passed = report.passed(),
            score = report.score(),
            qa_status = report.availability.as_str(),
            "Figure generated"
        );
        OrchestrationOutcome {
            attempts: report.attempts,
            artifact,
            report: Some(report),
            structured_prompt,
            enrichment_applied,
        }
    }
}

fn failed_ids(report: &QaReport) -> String {
    report
        .hard_failures()
        .map(|c| c.id.as_str())
        .collect::<Vec<_>>()
        .join(",")
}
