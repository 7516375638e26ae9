//! Tool-call surface: `generate_figure` arguments, handler, and response envelope.

pub mod args;
pub mod handler;
pub mod response;

pub use args::{GenerateFigureArgs, ValidatedRequest, MAX_PROMPT_CHARS, MAX_STYLE_CHARS};
pub use handler::{FigureTool, TOOL_NAME};
pub use response::{FigurePayload, ToolError, ToolResponse};
