//! CLI domain: parse, route, output, and presentation only.
//! No figure orchestration here; the route table dispatches to the tool handler.

mod output;
mod parse;
mod presentation;
mod route;

pub use output::map_error;
pub use parse::{Cli, Commands, ConfigCommands, GenerateCommand};
pub use presentation::{
    format_checks_json, format_checks_text, format_config_validation_json,
    format_config_validation_text, format_generate_json, format_generate_text,
    format_report_text,
};
pub use route::{RunContext, RunOutput};
