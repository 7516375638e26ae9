//! Checklist evaluation through the text/evaluation backend.

use super::checks::{effective_checks, QaCheckDefinition};
use super::report::{CheckStatus, QaCheck, QaReport};
use super::QualityGate;
use crate::error::BackendError;
use crate::figure::FigureStyle;
use crate::provider::{strip_code_fences, CompletionOptions, GenerationResult, SourceImage, TextBackend};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

pub const DEFAULT_QA_TEMPERATURE: f32 = 0.1;
const TOKENS_PER_CHECK: u32 = 80;
const TOKEN_HEADROOM: u32 = 256;

/// Scores a generated image against the figure style's checklist.
pub struct QaEvaluator {
    text: Arc<dyn TextBackend>,
    temperature: f32,
}

impl QaEvaluator {
    pub fn new(text: Arc<dyn TextBackend>) -> Self {
        Self {
            text,
            temperature: DEFAULT_QA_TEMPERATURE,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Evaluate an artifact. Never fails: backend errors and unparseable
    /// replies yield an all-skipped `qa_unavailable` report.
    pub async fn validate(
        &self,
        artifact: &GenerationResult,
        style: FigureStyle,
        original_prompt: &str,
    ) -> QaReport {
        let checks = effective_checks(style);
        let instruction = build_evaluation_instruction(original_prompt, style, &checks);
        let options = CompletionOptions {
            temperature: Some(self.temperature),
            max_tokens: Some(evaluation_token_budget(checks.len())),
            system_instruction: None,
            input_image: Some(SourceImage {
                bytes: artifact.bytes.clone(),
                mime_type: artifact.mime_type.clone(),
            }),
        };

        let started = Instant::now();
        let reply = self.text.complete(&instruction, options).await;
        match reply {
            Ok(reply) => {
                let report = parse_evaluation_reply(&reply, style, elapsed_ms(started));
                debug!(
                    figure_style = %style,
                    qa_status = report.availability.as_str(),
                    hard_fail_count = report.hard_fail_count(),
                    score = report.score(),
                    "QA evaluation parsed"
                );
                report
            }
            Err(err) => {
                warn!(
                    figure_style = %style,
                    qa_status = "qa_unavailable",
                    error_kind = err.kind(),
                    error = %err,
                    "QA evaluator backend failed; treating figure as unreviewed"
                );
                QaReport::unavailable(style, err.to_string(), elapsed_ms(started))
            }
        }
    }
}

#[async_trait]
impl QualityGate for QaEvaluator {
    async fn evaluate(
        &self,
        artifact: &GenerationResult,
        style: FigureStyle,
        original_prompt: &str,
    ) -> Result<QaReport, BackendError> {
        Ok(self.validate(artifact, style, original_prompt).await)
    }
}

pub fn evaluation_token_budget(check_count: usize) -> u32 {
    TOKENS_PER_CHECK * check_count as u32 + TOKEN_HEADROOM
}

pub fn build_evaluation_instruction(
    original_prompt: &str,
    style: FigureStyle,
    checks: &[&QaCheckDefinition],
) -> String {
    let mut out = String::new();
    out.push_str(
        "You are a strict quality reviewer for generated figures. Inspect the attached \
         image and judge it against every check below. Do not be lenient: a check passes \
         only if the image clearly satisfies it.\n\n",
    );
    out.push_str(&format!("Figure style: {}\n", style.as_str()));
    out.push_str("Original request:\n\"\"\"\n");
    out.push_str(original_prompt.trim());
    out.push_str("\n\"\"\"\n\nChecks:\n");
    for (index, check) in checks.iter().enumerate() {
        out.push_str(&format!(
            "{}. id=\"{}\" ({}): {}\n",
            index + 1,
            check.id,
            check.name,
            check.instruction
        ));
    }
    out.push_str(
        "\nRespond with JSON only, no prose before or after it, exactly in this shape:\n\
         {\"checks\":[{\"id\":\"<check id>\",\"status\":\"pass|fail|warning\",\"detail\":\"<short reason>\"}]}\n\
         Include every check id listed above exactly once, in the same order.\n",
    );
    out
}

/// Parse the evaluator's JSON reply into a report over the style's effective checks.
pub fn parse_evaluation_reply(reply: &str, style: FigureStyle, evaluation_time_ms: u64) -> QaReport {
    let body = strip_code_fences(reply);
    let value: Value = match serde_json::from_str(body) {
        Ok(value) => value,
        Err(err) => {
            return unparseable(style, format!("evaluator reply is not JSON: {}", err), evaluation_time_ms)
        }
    };
    let Some(entries) = value.get("checks").and_then(Value::as_array) else {
        return unparseable(
            style,
            "evaluator reply has no checks array".to_string(),
            evaluation_time_ms,
        );
    };

    let mut reported: HashMap<&str, (CheckStatus, Option<String>)> = HashMap::new();
    for entry in entries {
        let Some(id) = entry.get("id").and_then(Value::as_str) else {
            continue;
        };
        let Some(status) = entry
            .get("status")
            .and_then(Value::as_str)
            .and_then(CheckStatus::parse_reported)
        else {
            continue;
        };
        let detail = entry
            .get("detail")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(str::to_string);
        reported.entry(id.trim()).or_insert((status, detail));
    }

    let checks = effective_checks(style)
        .into_iter()
        .map(|definition| match reported.remove(definition.id) {
            Some((status, detail)) => QaCheck::from_definition(definition, status, detail),
            None => QaCheck::skipped(definition),
        })
        .collect();
    QaReport::evaluated(style, checks, evaluation_time_ms)
}

fn unparseable(style: FigureStyle, reason: String, evaluation_time_ms: u64) -> QaReport {
    warn!(
        figure_style = %style,
        qa_status = "qa_unavailable",
        reason = %reason,
        "QA evaluator reply could not be parsed"
    );
    QaReport::unavailable(style, reason, evaluation_time_ms)
}

fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis() as u64
}
