//! Tests for the import resolution engine.
//!
//! Exercises the resolver against an in-memory source so the graph
//! shape, precedence, and caching behavior are tested without touching
//! the filesystem or network. End-to-end coverage against real files
//! and a mock HTTP server lives in the integration_tests crate.

use super::*;
use crate::fragment::Fragment;
use crate::source::{ImportSource, SectionPermit};
use async_trait::async_trait;
use serde_json::json;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

// ============================================================================
// Test Helpers
// ============================================================================

/// In-memory import source for graph-shape tests.
///
/// Serves canned documents keyed by locator and counts fetches so TTL
/// suppression is observable.
struct MemorySource {
    documents: HashMap<String, SectionMap>,
    permitted: SectionPermit,
    reusable: bool,
    fetch_count: Arc<Mutex<usize>>,
}

impl MemorySource {
    fn new() -> Self {
        Self {
            documents: HashMap::new(),
            permitted: SectionPermit::All,
            reusable: false,
            fetch_count: Arc::new(Mutex::new(0)),
        }
    }

    fn with_document(mut self, locator: &str, contents: serde_json::Value) -> Self {
        let serde_json::Value::Object(sections) = contents else {
            panic!("Test document must be a map");
        };
        self.documents.insert(locator.to_string(), sections);
        self
    }

    fn with_permitted(mut self, permitted: SectionPermit) -> Self {
        self.permitted = permitted;
        self
    }

    fn reusable(mut self) -> Self {
        self.reusable = true;
        self
    }

    fn fetch_counter(&self) -> Arc<Mutex<usize>> {
        Arc::clone(&self.fetch_count)
    }
}

#[async_trait]
impl ImportSource for MemorySource {
    fn supports(&self, directive: &ImportDirective, _base: &Path) -> bool {
        self.documents.contains_key(directive.display_locator())
    }

    fn canonicalize(&self, directive: &ImportDirective, _base: &Path) -> ResolutionResult<String> {
        Ok(directive.display_locator().to_string())
    }

    async fn fetch(&self, directive: &ImportDirective, base: &Path) -> ResolutionResult<Fragment> {
        *self.fetch_count.lock().unwrap() += 1;

        let identity = self.canonicalize(directive, base)?;
        let sections = self
            .documents
            .get(&identity)
            .cloned()
            .ok_or_else(|| ResolutionError::Fetch {
                locator: identity.clone(),
                reason: "document not found".to_string(),
                status: None,
            })?;
        Ok(Fragment::new(identity, sections))
    }

    fn allowed_sections(&self) -> SectionPermit {
        self.permitted.clone()
    }

    fn reusable_within_ttl(&self) -> bool {
        self.reusable
    }
}

/// Builds a section map from a JSON literal.
fn sections(value: serde_json::Value) -> SectionMap {
    match value {
        serde_json::Value::Object(map) => map,
        other => panic!("Test config must be a map, got {:?}", other),
    }
}

/// Builds a resolver around a single in-memory source.
fn resolver_with(source: MemorySource) -> ImportResolver {
    ImportResolver::new().with_sources(SourceRegistry::new().with_source(Arc::new(source)))
}

/// Resolves against an irrelevant base directory.
async fn resolve(resolver: &ImportResolver, root: SectionMap) -> ResolutionResult<SectionMap> {
    resolver.resolve(root, Path::new(".")).await
}

// ============================================================================
// No-op and Root Precedence Tests
// ============================================================================

/// Verify a config without imports resolves to itself.
#[tokio::test]
async fn test_config_without_imports_is_unchanged() {
    let resolver = ImportResolver::new();
    let root = sections(json!({
        "variables": {"NAME": "root"},
        "documents": [{"outputPath": "x.md"}],
        "custom": {"anything": true}
    }));

    let merged = resolve(&resolver, root.clone())
        .await
        .expect("import-free config should resolve");

    assert_eq!(merged, root);
}

/// Verify root values win per key while imported-only keys survive.
#[tokio::test]
async fn test_root_variables_take_precedence() {
    let source = MemorySource::new().with_document(
        "common.json",
        json!({"variables": {"NAME": "common", "EXTRA": "x"}}),
    );
    let resolver = resolver_with(source);
    let root = sections(json!({
        "variables": {"NAME": "root"},
        "import": [{"path": "common.json"}]
    }));

    let merged = resolve(&resolver, root).await.expect("resolution should succeed");

    assert_eq!(
        merged.get("variables"),
        Some(&json!({"NAME": "root", "EXTRA": "x"}))
    );
    assert!(
        !merged.contains_key("import"),
        "The merged map must never contain an import key"
    );
}

/// Verify fragment list sections append in declaration order.
#[tokio::test]
async fn test_list_sections_append_in_declaration_order() {
    let source = MemorySource::new()
        .with_document("a.json", json!({"prompts": [{"id": "a"}]}))
        .with_document("b.json", json!({"prompts": [{"id": "b"}]}));
    let resolver = resolver_with(source);
    let root = sections(json!({
        "import": [{"path": "a.json"}, {"path": "b.json"}]
    }));

    let merged = resolve(&resolver, root).await.expect("resolution should succeed");

    assert_eq!(
        merged.get("prompts"),
        Some(&json!([{"id": "a"}, {"id": "b"}]))
    );
}

/// Verify a fragment section with no registered strategy is dropped
/// while the root's own value for it survives.
#[tokio::test]
async fn test_unregistered_sections_drop_from_fragments_only() {
    let source = MemorySource::new().with_document(
        "common.json",
        json!({"banner": "from import", "variables": {"A": 1}}),
    );
    let resolver = resolver_with(source);

    let without_root_value = sections(json!({"import": [{"path": "common.json"}]}));
    let merged = resolve(&resolver, without_root_value)
        .await
        .expect("resolution should succeed");
    assert!(
        !merged.contains_key("banner"),
        "Fragment-only sections without a strategy must be dropped"
    );

    let with_root_value = sections(json!({
        "banner": "from root",
        "import": [{"path": "common.json"}]
    }));
    let merged = resolve(&resolver, with_root_value)
        .await
        .expect("resolution should succeed");
    assert_eq!(merged.get("banner"), Some(&json!("from root")));
}

// ============================================================================
// Graph Shape Tests
// ============================================================================

/// Verify transitive imports flatten bottom-up with each document's own
/// content winning over what it inherits.
#[tokio::test]
async fn test_transitive_resolution_order() {
    let source = MemorySource::new()
        .with_document(
            "b.json",
            json!({
                "variables": {"X": "b", "Y": "b"},
                "import": [{"path": "c.json"}]
            }),
        )
        .with_document("c.json", json!({"variables": {"X": "c", "Z": "c"}}));
    let resolver = resolver_with(source);
    let root = sections(json!({
        "variables": {"X": "a"},
        "import": [{"path": "b.json"}]
    }));

    let merged = resolve(&resolver, root).await.expect("resolution should succeed");

    assert_eq!(
        merged.get("variables"),
        Some(&json!({"X": "a", "Y": "b", "Z": "c"})),
        "C folds into B, B folds into the root, explicit values win at each level"
    );
}

/// Verify a two-node cycle fails with the full chain.
#[tokio::test]
async fn test_cycle_detection() {
    let source = MemorySource::new()
        .with_document("a.json", json!({"import": [{"path": "b.json"}]}))
        .with_document("b.json", json!({"import": [{"path": "a.json"}]}));
    let resolver = resolver_with(source);
    let root = sections(json!({"import": [{"path": "a.json"}]}));

    let result = resolve(&resolver, root).await;

    match result {
        Err(ResolutionError::ImportCycle { chain }) => {
            assert!(chain.contains(&"a.json".to_string()));
            assert!(chain.contains(&"b.json".to_string()));
            assert_eq!(chain.first(), chain.last(), "The chain must close on the repeated identity");
        }
        other => panic!("Expected an import cycle, got {:?}", other),
    }
}

/// Verify a self-import is the smallest detected cycle.
#[tokio::test]
async fn test_self_import_cycle() {
    let source = MemorySource::new()
        .with_document("a.json", json!({"import": [{"path": "a.json"}]}));
    let resolver = resolver_with(source);
    let root = sections(json!({"import": [{"path": "a.json"}]}));

    let result = resolve(&resolver, root).await;

    assert!(matches!(result, Err(ResolutionError::ImportCycle { .. })));
}

/// Verify the depth guard catches pathological nesting of distinct
/// identities, which cycle detection alone would not bound.
#[tokio::test]
async fn test_recursion_depth_guard() {
    let source = MemorySource::new()
        .with_document("d1.json", json!({"import": [{"path": "d2.json"}]}))
        .with_document("d2.json", json!({"import": [{"path": "d3.json"}]}))
        .with_document("d3.json", json!({"import": [{"path": "d4.json"}]}))
        .with_document("d4.json", json!({"variables": {"A": 1}}));
    let resolver = resolver_with(source).with_max_depth(2);
    let root = sections(json!({"import": [{"path": "d1.json"}]}));

    let result = resolve(&resolver, root).await;

    match result {
        Err(ResolutionError::RecursionLimit { limit, .. }) => assert_eq!(limit, 2),
        other => panic!("Expected a recursion limit error, got {:?}", other),
    }
}

/// Verify resolution is fail-fast: a missing transitive import aborts
/// the whole run.
#[tokio::test]
async fn test_missing_transitive_import_is_fatal() {
    let source = MemorySource::new()
        .with_document("a.json", json!({"import": [{"path": "gone.json"}]}));
    let resolver = resolver_with(source);
    let root = sections(json!({
        "variables": {"A": 1},
        "import": [{"path": "a.json"}]
    }));

    let result = resolve(&resolver, root).await;

    assert!(
        matches!(result, Err(ResolutionError::UnsupportedSource { .. })),
        "No partial merge may be returned when any node fails"
    );
}

// ============================================================================
// Directive Validation Tests
// ============================================================================

/// Verify a directive without a locator fails before any fetch.
#[tokio::test]
async fn test_invalid_directive_fails_before_fetch() {
    let source = MemorySource::new().with_document("a.json", json!({"variables": {}}));
    let counter = source.fetch_counter();
    let resolver = resolver_with(source);
    let root = sections(json!({
        "import": [{"path": "a.json"}, {"pathPrefix": "api"}]
    }));

    let result = resolve(&resolver, root).await;

    assert!(matches!(
        result,
        Err(ResolutionError::InvalidDirective { .. })
    ));
    assert_eq!(
        *counter.lock().unwrap(),
        0,
        "Directive validation must run before any fetch in the list"
    );
}

/// Verify a non-list import value is rejected.
#[tokio::test]
async fn test_import_must_be_a_list() {
    let resolver = ImportResolver::new();
    let root = sections(json!({"import": "common.json"}));

    let result = resolve(&resolver, root).await;

    assert!(matches!(
        result,
        Err(ResolutionError::InvalidDirective { .. })
    ));
}

// ============================================================================
// Filtering and Prefixing Tests
// ============================================================================

/// Verify the source's allowed-sections capability confines what a
/// fragment may contribute.
#[tokio::test]
async fn test_source_section_restriction() {
    let source = MemorySource::new()
        .with_document(
            "remote.json",
            json!({
                "prompts": [{"id": "greet"}],
                "documents": [{"outputPath": "evil.md"}]
            }),
        )
        .with_permitted(SectionPermit::only(["prompts"]));
    let resolver = resolver_with(source);
    let root = sections(json!({"import": [{"path": "remote.json"}]}));

    let merged = resolve(&resolver, root).await.expect("resolution should succeed");

    assert_eq!(merged.get("prompts"), Some(&json!([{"id": "greet"}])));
    assert!(
        !merged.contains_key("documents"),
        "Sections outside the source's permit must never reach the result"
    );
}

/// Verify the directive-level filter intersects with the source permit.
#[tokio::test]
async fn test_directive_section_filter() {
    let source = MemorySource::new().with_document(
        "common.json",
        json!({
            "variables": {"A": 1},
            "prompts": [{"id": "greet"}]
        }),
    );
    let resolver = resolver_with(source);
    let root = sections(json!({
        "import": [{"path": "common.json", "only": ["variables"]}]
    }));

    let merged = resolve(&resolver, root).await.expect("resolution should succeed");

    assert_eq!(merged.get("variables"), Some(&json!({"A": 1})));
    assert!(!merged.contains_key("prompts"));
}

/// Verify path prefixing applies to a fragment's documents.
#[tokio::test]
async fn test_path_prefix_applies_to_fragment() {
    let source = MemorySource::new().with_document(
        "api.json",
        json!({
            "documents": [
                {"outputPath": "docs/x.md"},
                {"outputPath": "/abs.md"}
            ]
        }),
    );
    let resolver = resolver_with(source);
    let root = sections(json!({
        "import": [{"path": "api.json", "pathPrefix": "api/v1"}]
    }));

    let merged = resolve(&resolver, root).await.expect("resolution should succeed");

    assert_eq!(
        merged.get("documents"),
        Some(&json!([
            {"outputPath": "api/v1/docs/x.md"},
            {"outputPath": "/abs.md"}
        ]))
    );
}

/// Verify nested prefixes compose outermost-first.
#[tokio::test]
async fn test_nested_path_prefixes_compose() {
    let source = MemorySource::new()
        .with_document(
            "b.json",
            json!({"import": [{"path": "c.json", "pathPrefix": "v1"}]}),
        )
        .with_document("c.json", json!({"documents": [{"outputPath": "docs/x.md"}]}));
    let resolver = resolver_with(source);
    let root = sections(json!({
        "import": [{"path": "b.json", "pathPrefix": "api"}]
    }));

    let merged = resolve(&resolver, root).await.expect("resolution should succeed");

    assert_eq!(
        merged.get("documents"),
        Some(&json!([{"outputPath": "api/v1/docs/x.md"}]))
    );
}

// ============================================================================
// TTL Reuse Tests
// ============================================================================

/// Verify a repeat import of the same identity within its TTL is a
/// no-op: one fetch, one merge.
#[tokio::test]
async fn test_ttl_suppresses_refetch_and_remerge() {
    let source = MemorySource::new()
        .with_document("shared.json", json!({"prompts": [{"id": "greet"}]}))
        .reusable();
    let counter = source.fetch_counter();
    let resolver = resolver_with(source);
    let root = sections(json!({
        "import": [
            {"path": "shared.json", "ttl": 300},
            {"path": "shared.json", "ttl": 300}
        ]
    }));

    let merged = resolve(&resolver, root).await.expect("resolution should succeed");

    assert_eq!(*counter.lock().unwrap(), 1, "The second import must not refetch");
    assert_eq!(
        merged.get("prompts"),
        Some(&json!([{"id": "greet"}])),
        "The second import must not merge a second copy"
    );
}

/// Verify a zero TTL forces a refetch and a re-merge.
#[tokio::test]
async fn test_zero_ttl_refetches() {
    let source = MemorySource::new()
        .with_document("shared.json", json!({"prompts": [{"id": "greet"}]}))
        .reusable();
    let counter = source.fetch_counter();
    let resolver = resolver_with(source);
    let root = sections(json!({
        "import": [
            {"path": "shared.json", "ttl": 0},
            {"path": "shared.json", "ttl": 0}
        ]
    }));

    let merged = resolve(&resolver, root).await.expect("resolution should succeed");

    assert_eq!(*counter.lock().unwrap(), 2);
    assert_eq!(
        merged.get("prompts"),
        Some(&json!([{"id": "greet"}, {"id": "greet"}])),
        "An expired TTL merges the fragment again"
    );
}

/// Verify non-reusable sources ignore the TTL window entirely.
#[tokio::test]
async fn test_non_reusable_source_always_fetches() {
    let source = MemorySource::new()
        .with_document("local.json", json!({"prompts": [{"id": "greet"}]}));
    let counter = source.fetch_counter();
    let resolver = resolver_with(source);
    let root = sections(json!({
        "import": [{"path": "local.json"}, {"path": "local.json"}]
    }));

    resolve(&resolver, root).await.expect("resolution should succeed");

    assert_eq!(
        *counter.lock().unwrap(),
        2,
        "Sources without a fetch cost re-read on every import"
    );
}
