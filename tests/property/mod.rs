//! Property-based tests for QA scoring and retry prompts

mod qa_invariants;
