//! QA checklist presentation.

use crate::figure::FigureStyle;
use crate::qa::{effective_checks, QaCheck, QaReport};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{ContentArrangement, Table};
use owo_colors::OwoColorize;
use serde_json::json;

pub fn format_checks_text(style: FigureStyle) -> String {
    let checks = effective_checks(style);
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["#", "Id", "Name", "Severity", "Instruction"]);
    for (index, check) in checks.iter().enumerate() {
        table.add_row(vec![
            (index + 1).to_string(),
            check.id.to_string(),
            check.name.to_string(),
            check.severity.as_str().to_string(),
            check.instruction.to_string(),
        ]);
    }
    format!(
        "{} checklist ({} checks)\n{}",
        style.as_str().bold(),
        checks.len(),
        table
    )
}

pub fn format_checks_json(style: FigureStyle) -> String {
    let out = json!({
        "figure_style": style,
        "checks": effective_checks(style),
    });
    serde_json::to_string_pretty(&out).unwrap_or_else(|_| "{}".to_string())
}

/// Verdict line plus a per-check table.
pub fn format_report_text(report: &QaReport) -> String {
    let verdict = if !report.is_available() {
        format!("{}", "QA UNAVAILABLE".yellow().bold())
    } else if report.passed() {
        format!("{}", "QA PASSED".green().bold())
    } else {
        format!("{}", "QA FAILED".red().bold())
    };
    let mut out = format!(
        "{} (attempt {}, score {:.2}, hard failures {})\n",
        verdict,
        report.attempts,
        report.score(),
        report.hard_fail_count()
    );
    out.push_str(&report_table(&report.checks).to_string());
    out
}

fn report_table(checks: &[QaCheck]) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Check", "Severity", "Status", "Detail"]);
    for check in checks {
        table.add_row(vec![
            check.name.as_str(),
            check.severity.as_str(),
            check.status.as_str(),
            check.detail.as_deref().unwrap_or("-"),
        ]);
    }
    table
}
