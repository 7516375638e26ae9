//! QA report model.
//!
//! `hard_fail_count`, `passed` and `score` are always derived from `checks`;
//! nothing caches them, so a report can never disagree with its own checklist.

use super::checks::{effective_checks, QaCheckDefinition, Severity};
use crate::figure::FigureStyle;
use serde::ser::Serializer;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Pass,
    Fail,
    Warning,
    Skipped,
}

impl CheckStatus {
    /// Parse an evaluator status. `skipped` is never accepted from the evaluator.
    pub fn parse_reported(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pass" => Some(CheckStatus::Pass),
            "fail" => Some(CheckStatus::Fail),
            "warning" => Some(CheckStatus::Warning),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CheckStatus::Pass => "pass",
            CheckStatus::Fail => "fail",
            CheckStatus::Warning => "warning",
            CheckStatus::Skipped => "skipped",
        }
    }
}

/// Outcome of one check in one evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QaCheck {
    pub id: String,
    pub name: String,
    pub severity: Severity,
    pub status: CheckStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl QaCheck {
    pub fn from_definition(
        definition: &QaCheckDefinition,
        status: CheckStatus,
        detail: Option<String>,
    ) -> Self {
        Self {
            id: definition.id.to_string(),
            name: definition.name.to_string(),
            severity: definition.severity,
            status,
            detail,
        }
    }

    pub fn skipped(definition: &QaCheckDefinition) -> Self {
        Self::from_definition(definition, CheckStatus::Skipped, None)
    }

    pub fn is_hard_failure(&self) -> bool {
        self.severity == Severity::Hard && self.status == CheckStatus::Fail
    }
}

/// Whether the evaluator produced a usable checklist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QaAvailability {
    Evaluated,
    Unavailable { reason: String },
}

impl QaAvailability {
    pub fn as_str(&self) -> &'static str {
        match self {
            QaAvailability::Evaluated => "evaluated",
            QaAvailability::Unavailable { .. } => "qa_unavailable",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QaReport {
    pub checks: Vec<QaCheck>,
    /// 1-indexed attempt that produced the evaluated artifact.
    pub attempts: u32,
    pub figure_style: FigureStyle,
    pub evaluation_time_ms: u64,
    pub availability: QaAvailability,
}

impl QaReport {
    pub fn evaluated(figure_style: FigureStyle, checks: Vec<QaCheck>, evaluation_time_ms: u64) -> Self {
        Self {
            checks,
            attempts: 1,
            figure_style,
            evaluation_time_ms,
            availability: QaAvailability::Evaluated,
        }
    }

    /// Every effective check `skipped`, flagged `qa_unavailable`.
    pub fn unavailable(
        figure_style: FigureStyle,
        reason: impl Into<String>,
        evaluation_time_ms: u64,
    ) -> Self {
        let checks = effective_checks(figure_style)
            .into_iter()
            .map(QaCheck::skipped)
            .collect();
        Self {
            checks,
            attempts: 1,
            figure_style,
            evaluation_time_ms,
            availability: QaAvailability::Unavailable {
                reason: reason.into(),
            },
        }
    }

    pub fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts = attempts;
        self
    }

    pub fn hard_fail_count(&self) -> usize {
        self.checks.iter().filter(|c| c.is_hard_failure()).count()
    }

    pub fn passed(&self) -> bool {
        self.hard_fail_count() == 0
    }

    /// pass / (pass + fail + warning); skipped checks are excluded.
    pub fn score(&self) -> f64 {
        let mut passed = 0usize;
        let mut scored = 0usize;
        for check in &self.checks {
            match check.status {
                CheckStatus::Pass => {
                    passed += 1;
                    scored += 1;
                }
                CheckStatus::Fail | CheckStatus::Warning => scored += 1,
                CheckStatus::Skipped => {}
            }
        }
        if scored == 0 {
            0.0
        } else {
            passed as f64 / scored as f64
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self.availability, QaAvailability::Evaluated)
    }

    pub fn hard_failures(&self) -> impl Iterator<Item = &QaCheck> {
        self.checks.iter().filter(|c| c.is_hard_failure())
    }
}

#[derive(Serialize)]
struct QaReportView<'a> {
    passed: bool,
    score: f64,
    hard_fail_count: usize,
    qa_status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    qa_unavailable_reason: Option<&'a str>,
    attempts: u32,
    figure_style: FigureStyle,
    evaluation_time_ms: u64,
    checks: &'a [QaCheck],
}

impl Serialize for QaReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let reason = match &self.availability {
            QaAvailability::Evaluated => None,
            QaAvailability::Unavailable { reason } => Some(reason.as_str()),
        };
        QaReportView {
            passed: self.passed(),
            score: self.score(),
            hard_fail_count: self.hard_fail_count(),
            qa_status: self.availability.as_str(),
            qa_unavailable_reason: reason,
            attempts: self.attempts,
            figure_style: self.figure_style,
            evaluation_time_ms: self.evaluation_time_ms,
            checks: &self.checks,
        }
        .serialize(serializer)
    }
}
