//! End-to-end tool calls against scripted backends

use super::support::{build_tool, config_with_qa, qa_reply, ScriptedImage, ScriptedText, PNG};
use figura::error::{BackendError, PersistenceError};
use figura::persistence::{ArtifactStore, FilenameHint, FsArtifactStore, SavedArtifact};
use figura::provider::BackendHandles;
use figura::qa::QaReport;
use figura::tool::FigureTool;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

fn envelope(response: &figura::tool::ToolResponse) -> Value {
    serde_json::from_str(&response.to_json()).unwrap()
}

const CHART_FAIL: &[(&str, &str, &str)] = &[
    ("text_legibility", "pass", ""),
    ("spelling", "pass", ""),
    ("prompt_fidelity", "pass", ""),
    ("axis_labels", "fail", "y axis has no title"),
    ("data_consistency", "pass", ""),
];

const CHART_PASS: &[(&str, &str, &str)] = &[
    ("text_legibility", "pass", ""),
    ("spelling", "pass", ""),
    ("prompt_fidelity", "pass", ""),
    ("axis_labels", "pass", ""),
    ("data_consistency", "pass", ""),
    ("chart_title", "warning", "title is small"),
];

#[tokio::test]
async fn test_tool_call_saves_figure_and_reports_envelope() {
    let workspace = TempDir::new().unwrap();
    let image = ScriptedImage::always_png();
    let text = ScriptedText::new(Vec::new());
    let tool = build_tool(config_with_qa(false, 1), workspace.path(), image.clone(), text.clone());

    let response = tool
        .call_json(r#"{"prompt": "Quarterly revenue bar chart", "figure_style": "chart", "filename": "revenue"}"#)
        .await;

    assert!(response.ok, "{}", response.summary);
    let value = envelope(&response);
    let path = PathBuf::from(value["figure"]["path"].as_str().unwrap());
    assert!(path.starts_with(dunce::canonicalize(workspace.path()).unwrap().join("figures")));
    assert!(path.file_name().unwrap().to_str().unwrap().starts_with("revenue-"));
    assert_eq!(path.extension().unwrap(), "png");
    assert_eq!(std::fs::read(&path).unwrap(), PNG);
    assert_eq!(value["figure"]["mime_type"], "image/png");
    assert_eq!(value["figure"]["attempts"], 1);
    assert_eq!(value["figure"]["enrichment_applied"], false);
    assert!(value.get("qa").is_none());
    assert!(value.get("error").is_none());
    assert_eq!(image.prompts(), vec!["Quarterly revenue bar chart".to_string()]);
    assert_eq!(text.call_count(), 0);
}

#[tokio::test]
async fn test_content_blocked_maps_to_error_kind() {
    let workspace = TempDir::new().unwrap();
    let image = ScriptedImage::new(vec![Err(BackendError::ContentBlocked("SAFETY".to_string()))]);
    let text = ScriptedText::new(Vec::new());
    let tool = build_tool(config_with_qa(true, 2), workspace.path(), image.clone(), text.clone());

    let response = tool
        .call_json(r#"{"prompt": "A map of the harbour", "figure_style": "map"}"#)
        .await;

    assert!(!response.ok);
    let value = envelope(&response);
    assert_eq!(value["error"]["kind"], "content_blocked");
    assert!(value.get("figure").is_none());
    assert_eq!(image.prompts().len(), 1);
    assert_eq!(text.call_count(), 0);
    assert!(!workspace.path().join("figures").exists());
}

#[tokio::test]
async fn test_unknown_argument_is_a_validation_error() {
    let workspace = TempDir::new().unwrap();
    let image = ScriptedImage::always_png();
    let tool = build_tool(
        config_with_qa(false, 1),
        workspace.path(),
        image.clone(),
        ScriptedText::new(Vec::new()),
    );

    let response = tool.call_json(r#"{"prompt": "x", "colour": "red"}"#).await;

    assert!(!response.ok);
    assert_eq!(envelope(&response)["error"]["kind"], "validation");
    assert!(image.prompts().is_empty());
}

#[tokio::test]
async fn test_qa_fail_then_pass_through_evaluator() {
    let workspace = TempDir::new().unwrap();
    let image = ScriptedImage::always_png();
    let text = ScriptedText::new(vec![Ok(qa_reply(CHART_FAIL)), Ok(qa_reply(CHART_PASS))]);
    let tool = build_tool(config_with_qa(true, 1), workspace.path(), image.clone(), text.clone());

    let response = tool
        .call_json(r#"{"prompt": "Monthly rainfall in Lisbon", "figure_style": "chart"}"#)
        .await;

    assert!(response.ok, "{}", response.summary);
    let value = envelope(&response);
    assert_eq!(value["figure"]["attempts"], 2);
    assert_eq!(value["qa"]["passed"], true);
    assert_eq!(value["qa"]["attempts"], 2);
    assert_eq!(value["qa"]["qa_status"], "evaluated");

    let prompts = image.prompts();
    assert_eq!(prompts.len(), 2);
    assert_eq!(prompts[0], "Monthly rainfall in Lisbon");
    assert!(prompts[1].starts_with("Monthly rainfall in Lisbon\n\nMANDATORY CORRECTIONS"));
    assert!(prompts[1].contains("y axis has no title"));

    // The evaluator always judges against the caller's prompt, never the patched one.
    for (instruction, options) in text.calls() {
        assert!(instruction.contains("Monthly rainfall in Lisbon"));
        assert!(!instruction.contains("MANDATORY CORRECTIONS"));
        assert!(options.input_image.is_some());
    }
}

#[tokio::test]
async fn test_exhausted_budget_still_returns_last_figure() {
    let workspace = TempDir::new().unwrap();
    let image = ScriptedImage::always_png();
    let text = ScriptedText::new(vec![
        Ok(qa_reply(CHART_FAIL)),
        Ok(qa_reply(CHART_FAIL)),
        Ok(qa_reply(CHART_FAIL)),
    ]);
    let tool = build_tool(config_with_qa(true, 2), workspace.path(), image.clone(), text.clone());

    let response = tool
        .call_json(r#"{"prompt": "Sales by region", "figure_style": "chart"}"#)
        .await;

    assert!(response.ok);
    let value = envelope(&response);
    assert_eq!(value["figure"]["attempts"], 3);
    assert_eq!(value["qa"]["passed"], false);
    assert_eq!(value["qa"]["hard_fail_count"], 1);
    assert_eq!(image.prompts().len(), 3);
    assert_eq!(text.call_count(), 3);
    // Each retry carries only the latest patch.
    for prompt in &image.prompts()[1..] {
        assert_eq!(prompt.matches("MANDATORY CORRECTIONS").count(), 1);
    }
}

#[tokio::test]
async fn test_evaluator_outage_reports_unavailable_without_retry() {
    let workspace = TempDir::new().unwrap();
    let image = ScriptedImage::always_png();
    let text = ScriptedText::new(vec![Err(BackendError::Network("connection reset".to_string()))]);
    let tool = build_tool(config_with_qa(true, 3), workspace.path(), image.clone(), text);

    let response = tool
        .call_json(r#"{"prompt": "Service topology", "figure_style": "diagram"}"#)
        .await;

    assert!(response.ok);
    let value = envelope(&response);
    assert_eq!(value["qa"]["qa_status"], "qa_unavailable");
    assert_eq!(value["figure"]["attempts"], 1);
    assert_eq!(image.prompts().len(), 1);
    let checks = value["qa"]["checks"].as_array().unwrap();
    assert!(checks.iter().all(|c| c["status"] == "skipped"));
}

#[tokio::test]
async fn test_per_call_qa_overrides_global_setting() {
    let workspace = TempDir::new().unwrap();
    let image = ScriptedImage::always_png();
    let text = ScriptedText::new(vec![Ok(qa_reply(CHART_PASS))]);
    let tool = build_tool(config_with_qa(false, 1), workspace.path(), image, text.clone());

    let response = tool
        .call_json(r#"{"prompt": "Population pyramid", "figure_style": "chart", "qa": true}"#)
        .await;

    assert!(response.ok);
    assert_eq!(envelope(&response)["qa"]["passed"], true);
    assert_eq!(text.call_count(), 1);
}

#[tokio::test]
async fn test_qa_without_figure_style_is_skipped() {
    let workspace = TempDir::new().unwrap();
    let text = ScriptedText::new(Vec::new());
    let tool = build_tool(
        config_with_qa(true, 1),
        workspace.path(),
        ScriptedImage::always_png(),
        text.clone(),
    );

    let response = tool.call_json(r#"{"prompt": "A lighthouse", "qa": true}"#).await;

    assert!(response.ok);
    assert!(response.qa.is_none());
    assert_eq!(text.call_count(), 0);
}

#[tokio::test]
async fn test_enrichment_rewrites_prompt_before_generation() {
    let workspace = TempDir::new().unwrap();
    let image = ScriptedImage::always_png();
    let text = ScriptedText::new(vec![Ok(
        "```\nA labelled flow diagram of the CI pipeline: build, test, deploy.\n```".to_string(),
    )]);
    let mut config = config_with_qa(false, 1);
    config.enrichment.enabled = true;
    let tool = build_tool(config, workspace.path(), image.clone(), text);

    let response = tool
        .call_json(r#"{"prompt": "ci pipeline", "figure_style": "diagram"}"#)
        .await;

    assert!(response.ok);
    assert_eq!(envelope(&response)["figure"]["enrichment_applied"], true);
    assert_eq!(
        image.prompts(),
        vec!["A labelled flow diagram of the CI pipeline: build, test, deploy.".to_string()]
    );
}

#[tokio::test]
async fn test_sidecar_written_when_enabled() {
    let workspace = TempDir::new().unwrap();
    let mut config = config_with_qa(true, 0);
    config.output.write_qa_sidecar = true;
    let text = ScriptedText::new(vec![Ok(qa_reply(CHART_PASS))]);
    let tool = build_tool(config, workspace.path(), ScriptedImage::always_png(), text);

    let response = tool
        .call_json(r#"{"prompt": "GDP growth", "figure_style": "chart"}"#)
        .await;

    let figure = response.figure.as_ref().unwrap();
    let sidecar = PathBuf::from(figure.qa_sidecar.as_ref().unwrap());
    assert_eq!(sidecar, PathBuf::from(format!("{}.qa.json", figure.path)));
    let report: Value = serde_json::from_slice(&std::fs::read(&sidecar).unwrap()).unwrap();
    assert_eq!(report["figure_style"], "chart");
    assert_eq!(report["passed"], true);
}

/// Saves images normally but fails every sidecar write.
struct BrokenSidecarStore {
    inner: FsArtifactStore,
}

impl ArtifactStore for BrokenSidecarStore {
    fn save(&self, bytes: &[u8], hint: &FilenameHint) -> Result<SavedArtifact, PersistenceError> {
        self.inner.save(bytes, hint)
    }

    fn save_report(
        &self,
        _artifact: &SavedArtifact,
        _report: &QaReport,
    ) -> Result<Option<PathBuf>, PersistenceError> {
        Err(PersistenceError::Io(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "read-only output directory",
        )))
    }
}

#[tokio::test]
async fn test_sidecar_failure_still_returns_saved_figure() {
    let workspace = TempDir::new().unwrap();
    let mut config = config_with_qa(true, 0);
    config.output.write_qa_sidecar = true;
    let store = BrokenSidecarStore {
        inner: FsArtifactStore::new(config.output.resolve_root(workspace.path())),
    };
    let text = ScriptedText::new(vec![Ok(qa_reply(CHART_PASS))]);
    let tool = FigureTool::with_components(
        config,
        workspace.path().to_path_buf(),
        Arc::new(BackendHandles::with_backends(ScriptedImage::always_png(), Some(text))),
        Arc::new(store),
    );

    let response = tool
        .call_json(r#"{"prompt": "Wind speeds", "figure_style": "chart"}"#)
        .await;

    assert!(response.ok, "{}", response.summary);
    let figure = response.figure.as_ref().unwrap();
    assert!(PathBuf::from(&figure.path).is_file());
    assert!(figure.qa_sidecar.is_none());
    assert!(response.qa.as_ref().unwrap().passed());
}

#[tokio::test]
async fn test_source_image_outside_workspace_is_rejected() {
    let temp = TempDir::new().unwrap();
    let workspace = temp.path().join("ws");
    std::fs::create_dir_all(&workspace).unwrap();
    std::fs::write(temp.path().join("secret.png"), PNG).unwrap();
    let image = ScriptedImage::always_png();
    let tool = build_tool(config_with_qa(false, 1), &workspace, image.clone(), ScriptedText::new(Vec::new()));

    let response = tool
        .call_json(r#"{"prompt": "Recolour it", "source_image": "../secret.png"}"#)
        .await;

    assert!(!response.ok);
    assert_eq!(response.error.unwrap().kind, "validation");
    assert!(image.prompts().is_empty());
}
