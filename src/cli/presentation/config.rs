//! Config validation presentation.

use crate::config::{ConfigValidationError, FiguraConfig};
use owo_colors::OwoColorize;
use serde_json::json;

pub fn format_config_validation_text(
    config: &FiguraConfig,
    result: &Result<(), Vec<ConfigValidationError>>,
) -> String {
    match result {
        Ok(()) => format!(
            "{}\n  Image model: {}\n  Text model:  {} ({})\n  QA:          {} (max retries {})\n  Enrichment:  {}\n  Output dir:  {}",
            "Configuration is valid".green().bold(),
            config.providers.image.model,
            config.providers.text.effective_model(),
            config.providers.text.provider_type.as_str(),
            if config.qa.enabled { "enabled" } else { "disabled" },
            config.qa.max_retries,
            if config.enrichment.enabled { "enabled" } else { "disabled" },
            config.output.dir.display(),
        ),
        Err(errors) => {
            let mut out = format!(
                "{} ({} problem(s)):",
                "Configuration is invalid".red().bold(),
                errors.len()
            );
            for error in errors {
                out.push_str(&format!("\n  - {}", error));
            }
            out
        }
    }
}

pub fn format_config_validation_json(result: &Result<(), Vec<ConfigValidationError>>) -> String {
    let errors: Vec<String> = match result {
        Ok(()) => Vec::new(),
        Err(errors) => errors.iter().map(|e| e.to_string()).collect(),
    };
    let out = json!({ "valid": errors.is_empty(), "errors": errors });
    serde_json::to_string_pretty(&out).unwrap_or_else(|_| "{}".to_string())
}
