//! Import directive type.
//!
//! An import directive is one entry of a configuration document's
//! top-level `import` list. It names the resource to pull in (a local
//! path or a remote URL), how long a previous fetch of the same resource
//! stays valid, and how the fetched fragment should be filtered and
//! relocated before it is merged.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::{ResolutionError, ResolutionResult};

#[cfg(test)]
#[path = "directive_tests.rs"]
mod tests;

/// Default fragment reuse window, in seconds, for sources with a fetch
/// cost.
pub const DEFAULT_TTL_SECONDS: u64 = 300;

/// One entry of a configuration document's `import` list.
///
/// Exactly one of `path` (local) or `url` (remote) must be set; which
/// registered source handles the directive is decided by the sources
/// themselves, not by the field name alone. All other fields are
/// optional refinements.
///
/// # Document format
///
/// ```yaml
/// import:
///   - path: shared/common.yaml
///     pathPrefix: api/v1
///   - url: https://config.example.com/prompts.yaml
///     only: [prompts]
///     ttl: 600
///     headers:
///       Authorization: Bearer abc123
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportDirective {
    /// Local filesystem locator, resolved relative to the importing
    /// document's own directory unless absolute.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// Remote locator; must be an absolute URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Subdirectory prepended to relative paths embedded in the
    /// fragment's document substructures. Absolute paths are left
    /// untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path_prefix: Option<String>,

    /// If present, only these top-level section names from the fragment
    /// are considered for merging. Intersected with the source's own
    /// allowed-sections capability.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub only: Option<Vec<String>>,

    /// Reuse window in seconds for sources with a fetch cost. Within one
    /// resolution, a repeat import of the same identity inside this
    /// window contributes nothing.
    #[serde(default = "default_ttl")]
    pub ttl: u64,

    /// Request headers for remote fetches. Opaque to the resolver,
    /// passed through to the source.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub headers: HashMap<String, String>,

    /// Any further source-specific data. The resolver never interprets
    /// these keys; sources may.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

fn default_ttl() -> u64 {
    DEFAULT_TTL_SECONDS
}

impl ImportDirective {
    /// Creates a directive for a local path with all refinements unset.
    pub fn local(path: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
            url: None,
            path_prefix: None,
            only: None,
            ttl: DEFAULT_TTL_SECONDS,
            headers: HashMap::new(),
            extra: serde_json::Map::new(),
        }
    }

    /// Creates a directive for a remote URL with all refinements unset.
    pub fn remote(url: impl Into<String>) -> Self {
        Self {
            path: None,
            url: Some(url.into()),
            path_prefix: None,
            only: None,
            ttl: DEFAULT_TTL_SECONDS,
            headers: HashMap::new(),
            extra: serde_json::Map::new(),
        }
    }

    /// Deserializes a directive from one entry of an `import` array.
    ///
    /// # Errors
    ///
    /// Returns `ResolutionError::InvalidDirective` when the entry is not
    /// a map, sets neither or both of `path` and `url`, or carries
    /// malformed field values. This runs before any fetch is attempted.
    pub fn from_value(value: Value) -> ResolutionResult<Self> {
        let directive: Self = serde_json::from_value(value).map_err(|err| {
            ResolutionError::InvalidDirective {
                reason: err.to_string(),
            }
        })?;
        directive.locator()?;
        Ok(directive)
    }

    /// Returns the directive's locator.
    ///
    /// # Errors
    ///
    /// Returns `ResolutionError::InvalidDirective` if neither or both of
    /// `path` and `url` are set.
    pub fn locator(&self) -> ResolutionResult<&str> {
        match (self.path.as_deref(), self.url.as_deref()) {
            (Some(path), None) => Ok(path),
            (None, Some(url)) => Ok(url),
            (None, None) => Err(ResolutionError::InvalidDirective {
                reason: "directive must set either `path` or `url`".to_string(),
            }),
            (Some(_), Some(_)) => Err(ResolutionError::InvalidDirective {
                reason: "directive must set only one of `path` and `url`".to_string(),
            }),
        }
    }

    /// Returns the locator for log and error messages without failing on
    /// malformed directives.
    pub fn display_locator(&self) -> &str {
        self.path
            .as_deref()
            .or(self.url.as_deref())
            .unwrap_or("<missing locator>")
    }

    /// Returns true when the directive's section filter, if any, admits
    /// the given section name.
    pub fn admits_section(&self, section: &str) -> bool {
        match &self.only {
            Some(names) => names.iter().any(|name| name == section),
            None => true,
        }
    }
}
