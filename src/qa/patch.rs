//! Retry prompt patches built from failed hard checks.

use super::report::{QaCheck, QaReport};

const PATCH_HEADER: &str = "MANDATORY CORRECTIONS (the previous attempt failed review; fix every item below):";
const PATCH_FOOTER: &str = "END OF CORRECTIONS";

fn remediation(check_id: &str) -> Option<&'static str> {
    let text = match check_id {
        "spelling" => {
            "Spell every word correctly; render each label letter by letter exactly as written in the request."
        }
        "text_legibility" => {
            "Make all text large, high-contrast and sharp; keep labels clear of overlapping lines and shapes."
        }
        "prompt_fidelity" => {
            "Include every element the request asks for and nothing that contradicts it."
        }
        "scale_bar" => "Add a clearly labelled scale bar with distance units.",
        "north_arrow" => "Add a north arrow or compass rose indicating map orientation.",
        "axis_labels" => "Label every axis with a descriptive title and units.",
        "data_consistency" => {
            "Make plotted values, scales and tick marks consistent with each other and with the numbers in the request."
        }
        "label_coverage" => "Give every node, box and component a visible text label.",
        "connector_clarity" => {
            "Draw every connector from one element to another with an arrowhead showing direction; no dangling lines."
        }
        _ => return None,
    };
    Some(text)
}

/// Prompt fragment asking for targeted fixes of failed hard checks.
///
/// Returns an empty string when no hard check failed.
pub fn build_retry_patch(checks: &[QaCheck]) -> String {
    let lines: Vec<String> = checks
        .iter()
        .filter(|c| c.is_hard_failure())
        .map(correction_line)
        .collect();
    if lines.is_empty() {
        return String::new();
    }

    let mut patch = String::from(PATCH_HEADER);
    for line in lines {
        patch.push_str("\n- ");
        patch.push_str(&line);
    }
    patch.push('\n');
    patch.push_str(PATCH_FOOTER);
    patch
}

fn correction_line(check: &QaCheck) -> String {
    let detail = check.detail.as_deref().map(str::trim).filter(|d| !d.is_empty());
    match (remediation(&check.id), detail) {
        (Some(fix), Some(detail)) => format!("{} (reviewer: {})", fix, detail),
        (Some(fix), None) => fix.to_string(),
        (None, Some(detail)) => format!("Fix required for {}: {}", check.name, detail),
        (None, None) => format!("Fix required for {}.", check.name),
    }
}

/// Prompt for the next attempt: the original prompt plus the patch derived
/// from the latest report only. Earlier patches never carry over.
pub fn build_attempt_prompt(original: &str, latest_report: Option<&QaReport>) -> String {
    let patch = latest_report
        .map(|report| build_retry_patch(&report.checks))
        .unwrap_or_default();
    if patch.is_empty() {
        original.to_string()
    } else {
        format!("{}\n\n{}", original, patch)
    }
}
