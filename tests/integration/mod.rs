//! Integration tests for figure generation, QA and the tool surface

mod orchestration;
mod persistence;
mod qa_evaluation;
mod support;
mod tool_handler;
