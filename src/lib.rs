//! Figura: quality-checked figure generation
//!
//! Turns a natural-language figure request into an image through a pluggable
//! image backend, optionally rewriting the prompt first and grading the result
//! against a per-style QA checklist, regenerating with targeted corrections
//! when hard checks fail.

pub mod cli;
pub mod config;
pub mod enrichment;
pub mod error;
pub mod figure;
pub mod generation;
pub mod logging;
pub mod media;
pub mod persistence;
pub mod provider;
pub mod qa;
pub mod tool;
