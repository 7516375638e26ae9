//! Figure generation: request/outcome types and the generate/QA retry orchestrator.

pub mod orchestrator;
pub mod request;

pub use orchestrator::FigureOrchestrator;
pub use request::{qa_active, OrchestrationOutcome, OrchestrationRequest};
