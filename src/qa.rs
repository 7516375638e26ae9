//! Quality assurance for generated figures.
//!
//! A per-style checklist is evaluated by the text backend; failed hard checks
//! become a correction patch for the next generation attempt.

pub mod checks;
pub mod evaluator;
pub mod patch;
pub mod report;

use crate::error::BackendError;
use crate::figure::FigureStyle;
use crate::provider::GenerationResult;
use async_trait::async_trait;

pub use checks::{effective_checks, style_checks, QaCheckDefinition, Severity, COMMON_CHECKS};
pub use evaluator::QaEvaluator;
pub use patch::{build_attempt_prompt, build_retry_patch};
pub use report::{CheckStatus, QaAvailability, QaCheck, QaReport};

/// Evaluates one artifact. Errors are QA infrastructure failures; callers
/// absorb them into an unavailable report instead of failing the operation.
#[async_trait]
pub trait QualityGate: Send + Sync {
    async fn evaluate(
        &self,
        artifact: &GenerationResult,
        style: FigureStyle,
        original_prompt: &str,
    ) -> Result<QaReport, BackendError>;
}
