//! Parsed configuration fragments.
//!
//! A fragment is the parsed result of fetching one import directive: a
//! canonical identity (the graph node key for cycle detection and fetch
//! caching) plus the structural content of the document.

use serde_json::Value;

/// Structural content of a configuration document: its top-level
/// sections, keyed by name, with arbitrary JSON/YAML-shaped values.
pub type SectionMap = serde_json::Map<String, Value>;

/// The parsed result of fetching one import directive.
///
/// Fragments are transient: constructed fresh per fetch, flattened
/// (their own imports resolved) and folded into the parent accumulator,
/// then dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    /// Canonical form of the locator that produced this fragment. Two
    /// directives spelling the same resource differently (relative vs.
    /// absolute path, normalized URL) share one identity.
    pub identity: String,

    /// Parsed top-level sections of the document.
    pub sections: SectionMap,
}

impl Fragment {
    /// Creates a fragment from a canonical identity and parsed sections.
    pub fn new(identity: impl Into<String>, sections: SectionMap) -> Self {
        Self {
            identity: identity.into(),
            sections,
        }
    }
}
