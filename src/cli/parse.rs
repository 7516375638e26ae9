//! CLI parse: clap types for Figura. No behavior; definitions only.

use crate::figure::FigureStyle;
use crate::provider::{EditFidelity, Resolution};
use crate::tool::GenerateFigureArgs;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Figura CLI - quality-checked figure generation
#[derive(Parser)]
#[command(name = "figura")]
#[command(about = "Generate figures from natural-language requests with QA-driven regeneration")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace root directory
    #[arg(long, global = true, default_value = ".")]
    pub workspace: PathBuf,

    /// Configuration file applied on top of all other sources
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub verbose: bool,

    /// Disable logging entirely
    #[arg(long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long, global = true)]
    pub log_format: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate a figure
    Generate(GenerateCommand),
    /// Run one generate_figure tool call from JSON arguments and print the envelope
    Tool {
        /// File holding the JSON arguments (stdin when omitted)
        #[arg(long)]
        args: Option<PathBuf>,
    },
    /// Show the QA checklist for a figure style
    Checks {
        #[arg(long, value_enum)]
        figure_style: FigureStyle,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Configuration commands
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Load and validate the effective configuration
    Validate {
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
}

#[derive(Args, Debug, Clone)]
pub struct GenerateCommand {
    /// What to draw
    #[arg(long)]
    pub prompt: String,

    #[arg(long, value_enum)]
    pub figure_style: Option<FigureStyle>,

    /// e.g. 16:9
    #[arg(long)]
    pub aspect_ratio: Option<String>,

    #[arg(long, value_enum)]
    pub resolution: Option<Resolution>,

    /// Free-form visual style tag
    #[arg(long)]
    pub style: Option<String>,

    /// Enable search grounding
    #[arg(long)]
    pub grounding: bool,

    /// Image to edit: workspace-relative path or data: URL
    #[arg(long)]
    pub source_image: Option<String>,

    #[arg(long, value_enum)]
    pub edit_fidelity: Option<EditFidelity>,

    #[arg(long)]
    pub filename: Option<String>,

    /// Sub-directory under the output root
    #[arg(long)]
    pub output_dir: Option<String>,

    /// Force QA on for this call
    #[arg(long, conflicts_with = "no_qa")]
    pub qa: bool,

    /// Force QA off for this call
    #[arg(long)]
    pub no_qa: bool,

    /// Skip prompt enrichment
    #[arg(long)]
    pub no_enhance: bool,

    /// Output format (text or json)
    #[arg(long, default_value = "text")]
    pub format: String,
}

impl GenerateCommand {
    pub fn to_tool_args(&self) -> GenerateFigureArgs {
        let qa = match (self.qa, self.no_qa) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        };
        GenerateFigureArgs {
            prompt: self.prompt.clone(),
            figure_style: self.figure_style,
            aspect_ratio: self.aspect_ratio.clone(),
            resolution: self.resolution,
            style: self.style.clone(),
            grounding: self.grounding,
            source_image: self.source_image.clone(),
            edit_fidelity: self.edit_fidelity,
            filename: self.filename.clone(),
            output_dir: self.output_dir.clone(),
            qa,
            enhance_prompt: self.no_enhance.then_some(false),
        }
    }
}
