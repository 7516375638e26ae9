//! Tool response envelope.

use crate::error::ApiError;
use crate::generation::OrchestrationOutcome;
use crate::persistence::SavedArtifact;
use crate::qa::QaReport;
use serde::Serialize;
use std::path::Path;

#[derive(Debug, Clone, Serialize)]
pub struct ToolResponse {
    pub ok: bool,
    pub summary: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub figure: Option<FigurePayload>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qa: Option<QaReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ToolError>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FigurePayload {
    pub path: String,
    pub mime_type: String,
    pub bytes: usize,
    pub model: String,
    pub prompt_used: String,
    pub attempts: u32,
    pub enrichment_applied: bool,
    /// RFC 3339, UTC
    pub generated_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qa_sidecar: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ToolError {
    pub kind: String,
    pub message: String,
}

impl ToolResponse {
    pub fn success(
        outcome: OrchestrationOutcome,
        saved: SavedArtifact,
        qa_sidecar: Option<&Path>,
    ) -> Self {
        let summary = success_summary(&saved, outcome.report.as_ref());
        let figure = FigurePayload {
            path: saved.path.display().to_string(),
            mime_type: saved.mime_type,
            bytes: saved.bytes,
            model: outcome.artifact.model,
            prompt_used: outcome.artifact.prompt,
            attempts: outcome.attempts,
            enrichment_applied: outcome.enrichment_applied,
            generated_at: outcome.artifact.generated_at.to_rfc3339(),
            qa_sidecar: qa_sidecar.map(|p| p.display().to_string()),
        };
        Self {
            ok: true,
            summary,
            figure: Some(figure),
            qa: outcome.report,
            error: None,
        }
    }

    pub fn failure(error: &ApiError) -> Self {
        Self {
            ok: false,
            summary: format!("Figure generation failed: {}", error),
            figure: None,
            qa: None,
            error: Some(ToolError {
                kind: error.kind().to_string(),
                message: error.to_string(),
            }),
        }
    }

    /// Compact JSON; falls back to a minimal envelope if encoding fails.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            format!(
                "{{\"ok\":false,\"summary\":\"response encoding failed\",\"error\":{{\"kind\":\"persistence\",\"message\":{:?}}}}}",
                e.to_string()
            )
        })
    }
}

fn success_summary(saved: &SavedArtifact, report: Option<&QaReport>) -> String {
    let base = format!("Saved figure to {}", saved.path.display());
    let Some(report) = report else {
        return base;
    };
    if !report.is_available() {
        return format!("{} (QA unavailable; figure was not reviewed)", base);
    }
    if report.passed() {
        format!(
            "{} (QA passed on attempt {}, score {:.2})",
            base,
            report.attempts,
            report.score()
        )
    } else {
        format!(
            "{} (QA failed after {} attempt(s): {} hard check(s) still failing)",
            base,
            report.attempts,
            report.hard_fail_count()
        )
    }
}
