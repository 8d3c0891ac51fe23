//! Tests for file-based configuration loading.

use super::*;
use serde_json::json;
use std::fs;

/// Verify a root document loads and resolves its sibling import.
#[tokio::test]
async fn test_load_resolves_relative_imports() {
    let dir = tempfile::tempdir().expect("temp dir should be created");
    fs::write(
        dir.path().join("context.yaml"),
        "variables:\n  NAME: root\nimport:\n  - path: common.json\n",
    )
    .expect("root fixture should be written");
    fs::write(
        dir.path().join("common.json"),
        r#"{"variables": {"NAME": "common", "EXTRA": "x"}}"#,
    )
    .expect("import fixture should be written");

    let loader = ConfigLoader::new();
    let merged = loader
        .load(&dir.path().join("context.yaml"))
        .await
        .expect("root document should load");

    assert_eq!(
        merged.get("variables"),
        Some(&json!({"NAME": "root", "EXTRA": "x"}))
    );
    assert!(!merged.contains_key("import"));
}

/// Verify a missing root document is a fetch error.
#[tokio::test]
async fn test_load_missing_file() {
    let dir = tempfile::tempdir().expect("temp dir should be created");

    let loader = ConfigLoader::new();
    let result = loader.load(&dir.path().join("absent.yaml")).await;

    assert!(matches!(result, Err(ResolutionError::Fetch { .. })));
}

/// Verify an unrecognized root extension is a parse error.
#[tokio::test]
async fn test_load_unsupported_extension() {
    let dir = tempfile::tempdir().expect("temp dir should be created");
    fs::write(dir.path().join("context.ini"), "[variables]\n").expect("fixture written");

    let loader = ConfigLoader::new();
    let result = loader.load(&dir.path().join("context.ini")).await;

    assert!(matches!(result, Err(ResolutionError::Parse { .. })));
}
