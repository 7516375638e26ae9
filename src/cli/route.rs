//! CLI route: single route table and run context. Dispatches to the tool and presentation.

use crate::cli::parse::{Commands, ConfigCommands, GenerateCommand};
use crate::cli::presentation::{
    format_checks_json, format_checks_text, format_config_validation_json,
    format_config_validation_text, format_generate_json, format_generate_text,
};
use crate::config::{ConfigLoader, FiguraConfig};
use crate::error::ApiError;
use crate::tool::{FigureTool, ToolResponse};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tokio::io::AsyncReadExt;
use tracing::{debug, info};

/// Result of one routed command: rendered output and whether it should exit non-zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutput {
    pub output: String,
    pub failed: bool,
}

impl RunOutput {
    fn ok(output: String) -> Self {
        Self {
            output,
            failed: false,
        }
    }
}

/// Runtime context for CLI execution: workspace root and the loaded configuration.
pub struct RunContext {
    workspace_root: PathBuf,
    config: FiguraConfig,
}

impl RunContext {
    /// Load configuration for `workspace_root`, applying `config_path` last when given.
    pub fn new(workspace_root: PathBuf, config_path: Option<PathBuf>) -> Result<Self, ApiError> {
        let config = ConfigLoader::load_with_override(&workspace_root, config_path.as_deref())?;
        Ok(Self::with_config(workspace_root, config))
    }

    pub fn with_config(workspace_root: PathBuf, config: FiguraConfig) -> Self {
        Self {
            workspace_root,
            config,
        }
    }

    pub fn workspace_root(&self) -> &Path {
        &self.workspace_root
    }

    pub fn config(&self) -> &FiguraConfig {
        &self.config
    }

    /// Execute a CLI command via the single route table.
    pub async fn execute(&self, command: &Commands) -> Result<RunOutput, ApiError> {
        let started = Instant::now();
        let result = match command {
            Commands::Generate(generate) => self.handle_generate(generate).await,
            Commands::Tool { args } => self.handle_tool(args.as_deref()).await,
            Commands::Checks {
                figure_style,
                format,
            } => Ok(RunOutput::ok(match format.as_str() {
                "json" => format_checks_json(*figure_style),
                _ => format_checks_text(*figure_style),
            })),
            Commands::Config { command } => Ok(self.handle_config(command)),
        };
        debug!(
            command = command_name(command),
            duration_ms = started.elapsed().as_millis() as u64,
            ok = result.as_ref().map(|r| !r.failed).unwrap_or(false),
            "Command finished"
        );
        result
    }

    async fn handle_generate(&self, command: &GenerateCommand) -> Result<RunOutput, ApiError> {
        self.config.ensure_valid()?;
        let tool = FigureTool::new(self.config.clone(), self.workspace_root.clone());
        let response = tool.execute(command.to_tool_args()).await?;
        let output = match command.format.as_str() {
            "json" => format_generate_json(&response),
            _ => format_generate_text(&response),
        };
        Ok(RunOutput {
            output,
            failed: !response.ok,
        })
    }

    /// Tool mode: the envelope is printed even when the call fails.
    async fn handle_tool(&self, args_path: Option<&Path>) -> Result<RunOutput, ApiError> {
        let raw = read_tool_args(args_path).await?;
        let response = match self.config.ensure_valid() {
            Ok(()) => {
                FigureTool::new(self.config.clone(), self.workspace_root.clone())
                    .call_json(&raw)
                    .await
            }
            Err(err) => ToolResponse::failure(&err),
        };
        info!(ok = response.ok, "Tool call finished");
        Ok(RunOutput {
            output: response.to_json(),
            failed: !response.ok,
        })
    }

    fn handle_config(&self, command: &ConfigCommands) -> RunOutput {
        match command {
            ConfigCommands::Validate { format } => {
                let result = self.config.validate();
                let failed = result.is_err();
                let output = match format.as_str() {
                    "json" => format_config_validation_json(&result),
                    _ => format_config_validation_text(&self.config, &result),
                };
                RunOutput { output, failed }
            }
        }
    }
}

async fn read_tool_args(path: Option<&Path>) -> Result<String, ApiError> {
    let raw = match path {
        Some(path) => tokio::fs::read_to_string(path).await.map_err(|e| {
            ApiError::ConfigError(format!("Failed to read {}: {}", path.display(), e))
        })?,
        None => {
            let mut buf = String::new();
            tokio::io::stdin()
                .read_to_string(&mut buf)
                .await
                .map_err(|e| ApiError::ConfigError(format!("Failed to read stdin: {}", e)))?;
            buf
        }
    };
    Ok(raw)
}

fn command_name(command: &Commands) -> &'static str {
    match command {
        Commands::Generate(_) => "generate",
        Commands::Tool { .. } => "tool",
        Commands::Checks { .. } => "checks",
        Commands::Config { .. } => "config.validate",
    }
}
