//! Invariants over QA reports and retry prompts

use figura::figure::FigureStyle;
use figura::qa::{
    build_attempt_prompt, build_retry_patch, effective_checks, CheckStatus, QaCheck, QaReport,
    Severity,
};
use proptest::prelude::*;
use std::collections::HashSet;

fn style_strategy() -> impl Strategy<Value = FigureStyle> {
    prop_oneof![
        Just(FigureStyle::Diagram),
        Just(FigureStyle::Map),
        Just(FigureStyle::Chart),
    ]
}

fn status_strategy() -> impl Strategy<Value = CheckStatus> {
    prop_oneof![
        Just(CheckStatus::Pass),
        Just(CheckStatus::Fail),
        Just(CheckStatus::Warning),
        Just(CheckStatus::Skipped),
    ]
}

/// A report over the style's effective checks with random statuses.
fn report_strategy() -> impl Strategy<Value = QaReport> {
    style_strategy().prop_flat_map(|style| {
        let count = effective_checks(style).len();
        prop::collection::vec((status_strategy(), proptest::option::of("[a-z ]{0,20}")), count)
            .prop_map(move |statuses| {
                let checks = effective_checks(style)
                    .into_iter()
                    .zip(statuses)
                    .map(|(definition, (status, detail))| {
                        QaCheck::from_definition(definition, status, detail)
                    })
                    .collect();
                QaReport::evaluated(style, checks, 0)
            })
    })
}

#[test]
fn test_passed_iff_no_hard_failures() {
    let mut runner = proptest::test_runner::TestRunner::default();
    runner
        .run(&report_strategy(), |report| {
            let hard_fails = report
                .checks
                .iter()
                .filter(|c| c.severity == Severity::Hard && c.status == CheckStatus::Fail)
                .count();
            prop_assert_eq!(report.hard_fail_count(), hard_fails);
            prop_assert_eq!(report.passed(), hard_fails == 0);
            Ok(())
        })
        .unwrap();
}

#[test]
fn test_score_ignores_skipped_checks() {
    let mut runner = proptest::test_runner::TestRunner::default();
    runner
        .run(&report_strategy(), |report| {
            let scored: Vec<&QaCheck> = report
                .checks
                .iter()
                .filter(|c| c.status != CheckStatus::Skipped)
                .collect();
            let score = report.score();
            prop_assert!((0.0..=1.0).contains(&score));
            if scored.is_empty() {
                prop_assert_eq!(score, 0.0);
            } else {
                let passes = scored.iter().filter(|c| c.status == CheckStatus::Pass).count();
                prop_assert!((score - passes as f64 / scored.len() as f64).abs() < 1e-9);
            }
            Ok(())
        })
        .unwrap();
}

#[test]
fn test_effective_check_ids_are_unique() {
    let mut runner = proptest::test_runner::TestRunner::default();
    runner
        .run(&style_strategy(), |style| {
            let checks = effective_checks(style);
            let ids: HashSet<&str> = checks.iter().map(|c| c.id).collect();
            prop_assert_eq!(ids.len(), checks.len());
            Ok(())
        })
        .unwrap();
}

#[test]
fn test_attempt_prompt_never_compounds_patches() {
    let mut runner = proptest::test_runner::TestRunner::default();
    runner
        .run(
            &("[A-Za-z ,.]{1,80}", report_strategy()),
            |(original, report)| {
                let prompt = build_attempt_prompt(&original, Some(&report));
                prop_assert!(prompt.starts_with(&original));
                prop_assert!(prompt.matches("MANDATORY CORRECTIONS").count() <= 1);
                let patch = build_retry_patch(&report.checks);
                prop_assert_eq!(patch.is_empty(), report.passed());
                if patch.is_empty() {
                    prop_assert_eq!(&prompt, &original);
                }
                Ok(())
            },
        )
        .unwrap();
}
