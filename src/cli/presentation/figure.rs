//! Generate command presentation.

use super::checks::format_report_text;
use crate::tool::ToolResponse;

pub fn format_generate_text(response: &ToolResponse) -> String {
    let Some(figure) = &response.figure else {
        return response.summary.clone();
    };
    let mut out = format!("{}\n", response.summary);
    out.push_str(&format!("  Path:       {}\n", figure.path));
    out.push_str(&format!("  Type:       {} ({} bytes)\n", figure.mime_type, figure.bytes));
    out.push_str(&format!("  Model:      {}\n", figure.model));
    out.push_str(&format!("  Attempts:   {}\n", figure.attempts));
    out.push_str(&format!(
        "  Enrichment: {}\n",
        if figure.enrichment_applied { "applied" } else { "not applied" }
    ));
    if let Some(sidecar) = &figure.qa_sidecar {
        out.push_str(&format!("  QA report:  {}\n", sidecar));
    }
    if let Some(report) = &response.qa {
        out.push('\n');
        out.push_str(&format_report_text(report));
    }
    out
}

pub fn format_generate_json(response: &ToolResponse) -> String {
    serde_json::to_string_pretty(response).unwrap_or_else(|_| response.to_json())
}
