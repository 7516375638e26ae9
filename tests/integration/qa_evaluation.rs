//! Evaluator instruction and reply handling

use super::support::{qa_reply, ScriptedText, PNG};
use chrono::Utc;
use figura::error::BackendError;
use figura::figure::FigureStyle;
use figura::provider::GenerationResult;
use figura::qa::evaluator::{evaluation_token_budget, parse_evaluation_reply};
use figura::qa::{effective_checks, CheckStatus, QaEvaluator};

fn artifact() -> GenerationResult {
    GenerationResult {
        bytes: PNG.to_vec(),
        mime_type: "image/png".to_string(),
        model: "scripted-image".to_string(),
        prompt: "ignored".to_string(),
        generated_at: Utc::now(),
    }
}

#[tokio::test]
async fn test_instruction_lists_every_effective_check() {
    let text = ScriptedText::new(vec![Ok(qa_reply(&[]))]);
    let evaluator = QaEvaluator::new(text.clone());

    evaluator
        .validate(&artifact(), FigureStyle::Map, "Ferry routes of the Aegean")
        .await;

    let calls = text.calls();
    let (instruction, options) = &calls[0];
    for check in effective_checks(FigureStyle::Map) {
        assert!(instruction.contains(check.id), "missing {}", check.id);
    }
    assert!(!instruction.contains("axis_labels"));
    assert_eq!(options.max_tokens, Some(evaluation_token_budget(9)));
    assert_eq!(options.input_image.as_ref().unwrap().bytes, PNG);
}

#[tokio::test]
async fn test_fenced_reply_is_parsed() {
    let reply = format!(
        "```json\n{}\n```",
        qa_reply(&[("label_coverage", "FAIL", "two boxes unlabeled")])
    );
    let evaluator = QaEvaluator::new(ScriptedText::new(vec![Ok(reply)]));

    let report = evaluator
        .validate(&artifact(), FigureStyle::Diagram, "Kubernetes control plane")
        .await;

    assert!(report.is_available());
    assert_eq!(report.hard_fail_count(), 1);
    let check = report.checks.iter().find(|c| c.id == "label_coverage").unwrap();
    assert_eq!(check.status, CheckStatus::Fail);
    assert_eq!(check.detail.as_deref(), Some("two boxes unlabeled"));
}

#[tokio::test]
async fn test_infrastructure_failure_yields_unavailable_report() {
    let evaluator = QaEvaluator::new(ScriptedText::new(vec![Err(
        BackendError::QaInfrastructure("evaluator model overloaded".to_string()),
    )]));

    let report = evaluator
        .validate(&artifact(), FigureStyle::Chart, "Energy mix")
        .await;

    assert!(!report.is_available());
    assert!(report.checks.iter().all(|c| c.status == CheckStatus::Skipped));
    assert_eq!(report.checks.len(), effective_checks(FigureStyle::Chart).len());
}

#[test]
fn test_unknown_ids_and_statuses_are_ignored() {
    let reply = qa_reply(&[
        ("made_up_check", "fail", "?"),
        ("spelling", "maybe", ""),
        ("text_legibility", "pass", ""),
    ]);
    let report = parse_evaluation_reply(&reply, FigureStyle::Chart, 12);

    assert_eq!(report.hard_fail_count(), 0);
    let spelling = report.checks.iter().find(|c| c.id == "spelling").unwrap();
    assert_eq!(spelling.status, CheckStatus::Skipped);
    assert!(report.checks.iter().all(|c| c.id != "made_up_check"));
    assert_eq!(report.evaluation_time_ms, 12);
}

#[test]
fn test_single_line_fenced_reply_is_evaluated() {
    let reply = format!("```json{}```", qa_reply(&[("spelling", "fail", "Pacfic")]));
    let report = parse_evaluation_reply(&reply, FigureStyle::Map, 5);

    assert!(report.is_available());
    assert_eq!(report.hard_fail_count(), 1);
}
