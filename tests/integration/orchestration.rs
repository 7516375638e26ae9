//! Orchestrator driven by the real evaluator and enricher

use super::support::{qa_reply, ScriptedImage, ScriptedText};
use figura::enrichment::PromptEnricher;
use figura::error::BackendError;
use figura::figure::FigureStyle;
use figura::generation::{FigureOrchestrator, OrchestrationRequest};
use figura::provider::{GenerationOptions, GenerationRequest};
use figura::qa::{QaEvaluator, QualityGate};
use std::sync::Arc;

fn request(prompt: &str, style: Option<FigureStyle>) -> OrchestrationRequest {
    OrchestrationRequest::new(GenerationRequest::new(prompt, None, GenerationOptions::default()))
        .with_style(style)
        .with_qa(true)
}

#[tokio::test]
async fn test_map_retry_patch_names_missing_scale_bar() {
    let image = ScriptedImage::always_png();
    let text = ScriptedText::new(vec![
        Ok(qa_reply(&[("scale_bar", "fail", "no scale bar"), ("north_arrow", "pass", "")])),
        Ok(qa_reply(&[("scale_bar", "pass", ""), ("north_arrow", "pass", "")])),
    ]);
    let gate: Arc<dyn QualityGate> = Arc::new(QaEvaluator::new(text.clone()));
    let orchestrator = FigureOrchestrator::new(image.clone(), 2).with_gate(Some(gate));

    let outcome = orchestrator
        .run(&request("Hiking trails around Mont Blanc", Some(FigureStyle::Map)))
        .await
        .unwrap();

    assert_eq!(outcome.attempts, 2);
    let report = outcome.report.unwrap();
    assert!(report.passed());
    assert_eq!(report.attempts, 2);
    let prompts = image.prompts();
    assert!(prompts[1].contains("scale bar"));
    assert!(prompts[1].contains("(reviewer: no scale bar)"));
    assert!(!prompts[1].contains("north arrow"));
}

#[tokio::test]
async fn test_soft_failures_never_trigger_retry() {
    let image = ScriptedImage::always_png();
    let text = ScriptedText::new(vec![Ok(qa_reply(&[
        ("layout_balance", "fail", "crowded left side"),
        ("flow_direction", "warning", "mixed directions"),
    ]))]);
    let gate: Arc<dyn QualityGate> = Arc::new(QaEvaluator::new(text.clone()));
    let orchestrator = FigureOrchestrator::new(image.clone(), 3).with_gate(Some(gate));

    let outcome = orchestrator
        .run(&request("Order processing flow", Some(FigureStyle::Diagram)))
        .await
        .unwrap();

    assert_eq!(outcome.attempts, 1);
    assert!(outcome.report.unwrap().passed());
    assert_eq!(image.prompts().len(), 1);
}

#[tokio::test]
async fn test_zero_retries_evaluates_exactly_once() {
    let image = ScriptedImage::always_png();
    let text = ScriptedText::new(vec![Ok(qa_reply(&[("spelling", "fail", "Teh")]))]);
    let gate: Arc<dyn QualityGate> = Arc::new(QaEvaluator::new(text.clone()));
    let orchestrator = FigureOrchestrator::new(image.clone(), 0).with_gate(Some(gate));

    let outcome = orchestrator
        .run(&request("Org chart", Some(FigureStyle::Diagram)))
        .await
        .unwrap();

    assert_eq!(outcome.attempts, 1);
    assert!(!outcome.report.unwrap().passed());
    assert_eq!(text.call_count(), 1);
}

#[tokio::test]
async fn test_retry_generation_failure_propagates() {
    let image = ScriptedImage::new(vec![
        Ok(super::support::PNG.to_vec()),
        Err(BackendError::BackendRejected("quota exceeded".to_string())),
    ]);
    let text = ScriptedText::new(vec![Ok(qa_reply(&[("axis_labels", "fail", "")]))]);
    let gate: Arc<dyn QualityGate> = Arc::new(QaEvaluator::new(text));
    let orchestrator = FigureOrchestrator::new(image, 2).with_gate(Some(gate));

    let err = orchestrator
        .run(&request("Inflation by year", Some(FigureStyle::Chart)))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), "backend_rejected");
}

#[tokio::test]
async fn test_enrichment_runs_once_across_retries() {
    let image = ScriptedImage::always_png();
    let text = ScriptedText::new(vec![
        Ok("Detailed line chart of inflation 2015-2024 with labelled axes".to_string()),
        Ok(qa_reply(&[("axis_labels", "fail", "x axis unlabeled")])),
        Ok(qa_reply(&[("axis_labels", "pass", "")])),
    ]);
    let enricher = Arc::new(PromptEnricher::new(text.clone()));
    let gate: Arc<dyn QualityGate> = Arc::new(QaEvaluator::new(text.clone()));
    let orchestrator = FigureOrchestrator::new(image.clone(), 2)
        .with_enricher(Some(enricher))
        .with_gate(Some(gate));

    let outcome = orchestrator
        .run(&request("inflation chart", Some(FigureStyle::Chart)).with_enrichment(true))
        .await
        .unwrap();

    assert!(outcome.enrichment_applied);
    assert_eq!(outcome.attempts, 2);
    assert_eq!(text.call_count(), 3);
    let prompts = image.prompts();
    assert_eq!(prompts[0], "Detailed line chart of inflation 2015-2024 with labelled axes");
    assert!(prompts[1].starts_with("Detailed line chart of inflation 2015-2024 with labelled axes\n\n"));
    // The evaluator grades against the caller's words, not the rewrite.
    let (qa_instruction, _) = &text.calls()[1];
    assert!(qa_instruction.contains("inflation chart"));
}
