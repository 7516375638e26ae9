//! `generate_figure` tool arguments and their validation.

use crate::error::ValidationError;
use crate::figure::FigureStyle;
use crate::media::load_source_image;
use crate::persistence::sanitize_relative_dir;
use crate::provider::{
    AspectRatio, EditFidelity, GenerationOptions, GenerationRequest, Resolution,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

pub const MAX_PROMPT_CHARS: usize = 8000;
pub const MAX_STYLE_CHARS: usize = 200;

/// Raw tool-call arguments. Unknown fields are rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GenerateFigureArgs {
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub figure_style: Option<FigureStyle>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aspect_ratio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution: Option<Resolution>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    #[serde(default)]
    pub grounding: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edit_fidelity: Option<EditFidelity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qa: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enhance_prompt: Option<bool>,
}

/// Arguments after validation; safe to hand to the orchestrator.
#[derive(Debug, Clone)]
pub struct ValidatedRequest {
    pub generation: GenerationRequest,
    pub figure_style: Option<FigureStyle>,
    pub qa: Option<bool>,
    pub enhance_prompt: Option<bool>,
    pub filename: Option<String>,
    pub output_dir: Option<String>,
}

impl GenerateFigureArgs {
    pub fn from_json(raw: &str) -> Result<Self, ValidationError> {
        serde_json::from_str(raw).map_err(|e| ValidationError::InvalidArguments(e.to_string()))
    }

    pub fn from_value(value: serde_json::Value) -> Result<Self, ValidationError> {
        serde_json::from_value(value).map_err(|e| ValidationError::InvalidArguments(e.to_string()))
    }

    /// Validate arguments and load any source image relative to `workspace_root`.
    pub fn validate(self, workspace_root: &Path) -> Result<ValidatedRequest, ValidationError> {
        let prompt = self.prompt.trim().to_string();
        if prompt.is_empty() {
            return Err(ValidationError::EmptyPrompt);
        }
        let prompt_chars = prompt.chars().count();
        if prompt_chars > MAX_PROMPT_CHARS {
            return Err(ValidationError::PromptTooLong {
                max: MAX_PROMPT_CHARS,
                actual: prompt_chars,
            });
        }

        let aspect_ratio = match self.aspect_ratio.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(value) => Some(
                AspectRatio::parse(value)
                    .ok_or_else(|| ValidationError::UnsupportedAspectRatio(value.to_string()))?,
            ),
        };

        let style = non_empty(self.style);
        if let Some(style) = &style {
            if style.chars().count() > MAX_STYLE_CHARS {
                return Err(ValidationError::StyleTooLong {
                    max: MAX_STYLE_CHARS,
                });
            }
        }

        let source_image = match non_empty(self.source_image) {
            Some(spec) => Some(Arc::new(load_source_image(&spec, workspace_root)?)),
            None => None,
        };

        let output_dir = match non_empty(self.output_dir) {
            Some(dir) => {
                sanitize_relative_dir(&dir)
                    .map_err(|e| ValidationError::InvalidOutputPath(e.to_string()))?;
                Some(dir)
            }
            None => None,
        };

        let options = GenerationOptions {
            aspect_ratio,
            resolution: self.resolution,
            style,
            grounding: self.grounding,
            edit_fidelity: self.edit_fidelity.unwrap_or_default(),
        };

        Ok(ValidatedRequest {
            generation: GenerationRequest::new(prompt, source_image, options),
            figure_style: self.figure_style,
            qa: self.qa,
            enhance_prompt: self.enhance_prompt,
            filename: non_empty(self.filename),
            output_dir,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
