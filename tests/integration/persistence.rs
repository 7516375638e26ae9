//! Artifact placement through the tool surface

use super::support::{build_tool, config_with_qa, ScriptedImage, ScriptedText};
use figura::error::BackendError;
use tempfile::TempDir;

#[tokio::test]
async fn test_output_dir_is_nested_under_output_root() {
    let workspace = TempDir::new().unwrap();
    let tool = build_tool(
        config_with_qa(false, 1),
        workspace.path(),
        ScriptedImage::always_png(),
        ScriptedText::new(Vec::new()),
    );

    let response = tool
        .call_json(r#"{"prompt": "Tide table", "output_dir": "reports/2026"}"#)
        .await;

    let figure = response.figure.expect("figure saved");
    let root = dunce::canonicalize(workspace.path().join("figures")).unwrap();
    assert!(std::path::Path::new(&figure.path).starts_with(root.join("reports").join("2026")));
}

#[tokio::test]
async fn test_output_dir_escape_is_rejected_before_generation() {
    let workspace = TempDir::new().unwrap();
    let image = ScriptedImage::always_png();
    let tool = build_tool(
        config_with_qa(false, 1),
        workspace.path(),
        image.clone(),
        ScriptedText::new(Vec::new()),
    );

    let response = tool
        .call_json(r#"{"prompt": "Tide table", "output_dir": "../../etc"}"#)
        .await;

    assert!(!response.ok);
    assert_eq!(response.error.unwrap().kind, "validation");
    assert!(image.prompts().is_empty());
}

#[tokio::test]
async fn test_backend_mime_used_when_bytes_unrecognized() {
    let workspace = TempDir::new().unwrap();
    let image = ScriptedImage::new(vec![Ok(b"not an image".to_vec())]);
    let tool = build_tool(
        config_with_qa(false, 1),
        workspace.path(),
        image,
        ScriptedText::new(Vec::new()),
    );

    let response = tool.call_json(r#"{"prompt": "Odd output"}"#).await;

    let figure = response.figure.expect("figure saved");
    // The backend claimed PNG; the claim is used when sniffing finds nothing.
    assert!(figure.path.ends_with(".png"));

    let empty = ScriptedImage::new(vec![Err(BackendError::EmptyResult("no image part".to_string()))]);
    let tool = build_tool(
        config_with_qa(false, 1),
        workspace.path(),
        empty,
        ScriptedText::new(Vec::new()),
    );
    let response = tool.call_json(r#"{"prompt": "Odd output"}"#).await;
    assert_eq!(response.error.unwrap().kind, "empty_result");
}
