//! Tests for document format detection and parsing.

use super::*;
use serde_json::json;

// ============================================================================
// Format Detection Tests
// ============================================================================

/// Verify extension-based detection covers every supported format.
#[test]
fn test_from_path_known_extensions() {
    assert_eq!(
        DocumentFormat::from_path("a/b/config.json"),
        Some(DocumentFormat::Json)
    );
    assert_eq!(
        DocumentFormat::from_path("config.yaml"),
        Some(DocumentFormat::Yaml)
    );
    assert_eq!(
        DocumentFormat::from_path("config.yml"),
        Some(DocumentFormat::Yaml)
    );
    assert_eq!(
        DocumentFormat::from_path("config.toml"),
        Some(DocumentFormat::Toml)
    );
}

/// Verify detection is case insensitive and rejects unknown extensions.
#[test]
fn test_from_path_edge_cases() {
    assert_eq!(
        DocumentFormat::from_path("CONFIG.JSON"),
        Some(DocumentFormat::Json)
    );
    assert_eq!(DocumentFormat::from_path("config.txt"), None);
    assert_eq!(DocumentFormat::from_path("config"), None);
}

/// Verify Content-Type detection ignores parameters.
#[test]
fn test_from_content_type() {
    assert_eq!(
        DocumentFormat::from_content_type("application/json"),
        Some(DocumentFormat::Json)
    );
    assert_eq!(
        DocumentFormat::from_content_type("application/yaml; charset=utf-8"),
        Some(DocumentFormat::Yaml)
    );
    assert_eq!(
        DocumentFormat::from_content_type("application/x-yaml"),
        Some(DocumentFormat::Yaml)
    );
    assert_eq!(DocumentFormat::from_content_type("text/html"), None);
}

// ============================================================================
// Parsing Tests
// ============================================================================

/// Verify a JSON document parses into its section map.
#[test]
fn test_parse_json_document() {
    let bytes = br#"{"variables": {"NAME": "demo"}}"#;

    let sections =
        parse_document(bytes, DocumentFormat::Json, "test.json").expect("JSON should parse");

    assert_eq!(sections.get("variables"), Some(&json!({"NAME": "demo"})));
}

/// Verify a YAML document parses into the same structure as JSON.
#[test]
fn test_parse_yaml_document() {
    let bytes = b"variables:\n  NAME: demo\n";

    let sections =
        parse_document(bytes, DocumentFormat::Yaml, "test.yaml").expect("YAML should parse");

    assert_eq!(sections.get("variables"), Some(&json!({"NAME": "demo"})));
}

/// Verify a TOML document parses into the same structure as JSON.
#[test]
fn test_parse_toml_document() {
    let bytes = b"[variables]\nNAME = \"demo\"\n";

    let sections =
        parse_document(bytes, DocumentFormat::Toml, "test.toml").expect("TOML should parse");

    assert_eq!(sections.get("variables"), Some(&json!({"NAME": "demo"})));
}

/// Verify malformed bytes produce a parse error carrying the locator.
#[test]
fn test_parse_malformed_document() {
    let result = parse_document(b"{not json", DocumentFormat::Json, "broken.json");

    match result {
        Err(ResolutionError::Parse { locator, format, .. }) => {
            assert_eq!(locator, "broken.json");
            assert_eq!(format, "JSON");
        }
        other => panic!("Expected a parse error, got {:?}", other),
    }
}

/// Verify a non-map top level is rejected even when the bytes decode.
#[test]
fn test_parse_non_map_top_level() {
    let result = parse_document(b"[1, 2, 3]", DocumentFormat::Json, "list.json");

    assert!(
        matches!(result, Err(ResolutionError::Parse { .. })),
        "A list top level has no sections to merge and must be rejected"
    );
}
