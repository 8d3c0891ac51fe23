//! Relative path rewriting for relocated fragments.
//!
//! When a fragment is imported under a `pathPrefix`, the relative
//! filesystem paths embedded in its document substructures must be
//! rewritten so the fragment's outputs land under the importing
//! document's chosen subdirectory. Only known shapes are touched:
//! `documents[*].outputPath`, `documents[*].sources[*].sourcePaths`
//! (string or list of strings), and `documents[*].sources[*].composerPath`
//! for composer-typed source entries. Absolute paths are never
//! rewritten. Everything else in the fragment passes through untouched.

use serde_json::Value;

use crate::fragment::SectionMap;

#[cfg(test)]
#[path = "path_prefix_tests.rs"]
mod tests;

/// Source entry type whose `composerPath` participates in rewriting.
const COMPOSER_SOURCE_TYPE: &str = "composer";

/// Rewrites the known relative-path fields in `sections`, in place.
///
/// An empty prefix is a no-op. Value shapes that do not match the
/// expected substructures are left untouched rather than treated as
/// errors; structural validation is a downstream concern.
pub fn apply_prefix(sections: &mut SectionMap, prefix: &str) {
    if prefix.is_empty() {
        return;
    }

    let Some(documents) = sections.get_mut("documents").and_then(Value::as_array_mut) else {
        return;
    };

    for document in documents {
        let Some(document) = document.as_object_mut() else {
            continue;
        };

        rewrite_string_field(document, "outputPath", prefix);

        let Some(sources) = document.get_mut("sources").and_then(Value::as_array_mut) else {
            continue;
        };
        for source in sources {
            let Some(source) = source.as_object_mut() else {
                continue;
            };

            rewrite_source_paths(source, prefix);

            let is_composer = source
                .get("type")
                .and_then(Value::as_str)
                .map(|kind| kind == COMPOSER_SOURCE_TYPE)
                .unwrap_or(false);
            if is_composer {
                rewrite_string_field(source, "composerPath", prefix);
            }
        }
    }
}

/// Joins `prefix` in front of a relative path and normalizes the result.
///
/// Absolute paths (leading `/`) are returned unchanged. Normalization
/// collapses empty and `.` segments and resolves `..` against preceding
/// segments; leading `..` segments of a deliberately upward-escaping
/// prefix are kept as-is.
///
/// # Examples
///
/// ```
/// use config_resolver::path_prefix::prefix_path;
///
/// assert_eq!(prefix_path("api/v1", "docs/x.md"), "api/v1/docs/x.md");
/// assert_eq!(prefix_path("api/v1", "/abs.md"), "/abs.md");
/// assert_eq!(prefix_path("api", "../x.md"), "x.md");
/// assert_eq!(prefix_path("..", "docs/x.md"), "../docs/x.md");
/// ```
pub fn prefix_path(prefix: &str, path: &str) -> String {
    if path.starts_with('/') {
        return path.to_string();
    }
    normalize(&format!("{}/{}", prefix, path))
}

/// Segment-wise normalization over `/`.
///
/// Empty and `.` segments are dropped; `..` pops the previous segment
/// unless there is none left to pop or it is itself a kept `..`, in
/// which case the `..` is preserved. This can yield non-canonical
/// results for prefixes that deliberately escape upward; that behavior
/// is load-bearing and covered by tests.
fn normalize(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => match segments.last() {
                Some(&"..") | None => segments.push(".."),
                Some(_) => {
                    segments.pop();
                }
            },
            other => segments.push(other),
        }
    }
    segments.join("/")
}

/// Rewrites one string-valued field of a map, if present and relative.
fn rewrite_string_field(map: &mut serde_json::Map<String, Value>, field: &str, prefix: &str) {
    if let Some(Value::String(path)) = map.get_mut(field) {
        *path = prefix_path(prefix, path);
    }
}

/// Rewrites a `sourcePaths` value, which may be a single string or a
/// list of strings. Non-string list entries are skipped.
fn rewrite_source_paths(source: &mut serde_json::Map<String, Value>, prefix: &str) {
    match source.get_mut("sourcePaths") {
        Some(Value::String(path)) => {
            *path = prefix_path(prefix, path);
        }
        Some(Value::Array(paths)) => {
            for entry in paths {
                if let Value::String(path) = entry {
                    *path = prefix_path(prefix, path);
                }
            }
        }
        _ => {}
    }
}
