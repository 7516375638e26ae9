//! CLI presentation: text and json formatters per command family.

mod checks;
mod config;
mod figure;

pub use checks::{format_checks_json, format_checks_text, format_report_text};
pub use config::{format_config_validation_json, format_config_validation_text};
pub use figure::{format_generate_json, format_generate_text};
