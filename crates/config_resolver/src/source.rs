//! Import source abstraction.
//!
//! An import source is a capability object that can fetch the bytes
//! behind an import directive and report which top-level sections it is
//! permitted to contribute. The resolver never knows about filesystems
//! or HTTP; it only talks to this trait.
//!
//! Sources are consulted in registration order and the first one whose
//! `supports()` claims a directive handles it. A directive no source
//! claims fails resolution with `ResolutionError::UnsupportedSource`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;

use crate::directive::ImportDirective;
use crate::errors::{ResolutionError, ResolutionResult};
use crate::fragment::Fragment;

#[cfg(test)]
#[path = "source_tests.rs"]
mod tests;

/// The set of top-level sections a source may contribute to a merge.
///
/// Restricting this is a security boundary: content fetched from a less
/// trusted source (e.g. a remote URL) is confined to a narrow slice of
/// the configuration no matter what the fetched document contains.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SectionPermit {
    /// The source may contribute any section.
    All,
    /// The source may contribute only the named sections.
    Only(Vec<String>),
}

impl SectionPermit {
    /// Builds a restricted permit from section names.
    pub fn only(sections: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self::Only(sections.into_iter().map(Into::into).collect())
    }

    /// Returns true when the permit admits the given section name.
    pub fn allows(&self, section: &str) -> bool {
        match self {
            Self::All => true,
            Self::Only(sections) => sections.iter().any(|name| name == section),
        }
    }
}

/// A capability object that fetches and scopes import directives.
///
/// Implementations must be thread-safe (`Send + Sync`); the resolver
/// holds them behind `Arc` and may be embedded in a concurrent server.
#[async_trait]
pub trait ImportSource: Send + Sync {
    /// Returns true when this source can handle the directive. `base`
    /// is the directory of the importing document, for sources that
    /// resolve relative locators.
    fn supports(&self, directive: &ImportDirective, base: &Path) -> bool;

    /// Canonical identity for the directive's locator: the graph node
    /// key for cycle detection and fetch-log bookkeeping. Two
    /// spellings of the same resource must canonicalize identically.
    fn canonicalize(&self, directive: &ImportDirective, base: &Path) -> ResolutionResult<String>;

    /// Fetches and parses the directive's document.
    ///
    /// # Errors
    ///
    /// `ResolutionError::Fetch` when the bytes cannot be obtained,
    /// `ResolutionError::Parse` when they cannot be decoded.
    async fn fetch(&self, directive: &ImportDirective, base: &Path) -> ResolutionResult<Fragment>;

    /// The sections this source is permitted to contribute, independent
    /// of any directive-level filter.
    fn allowed_sections(&self) -> SectionPermit;

    /// Whether a fetch of this source is costly enough that a repeat
    /// import of the same identity within the directive's TTL should be
    /// suppressed entirely (contributing nothing, not re-merging).
    fn reusable_within_ttl(&self) -> bool {
        false
    }

    /// The directory against which a fetched fragment's own relative
    /// imports resolve. Defaults to the importing document's base.
    fn resolution_base(&self, identity: &str, parent_base: &Path) -> PathBuf {
        let _ = identity;
        parent_base.to_path_buf()
    }
}

/// Ordered capability table of import sources.
///
/// # Examples
///
/// ```
/// use config_resolver::{ImportDirective, ImportSource, SourceRegistry};
///
/// let registry = SourceRegistry::built_ins();
/// let directive = ImportDirective::remote("https://example.com/prompts.yaml");
///
/// let source = registry
///     .find(&directive, std::path::Path::new("."))
///     .expect("remote directives are supported out of the box");
/// assert!(source.reusable_within_ttl());
/// ```
#[derive(Clone, Default)]
pub struct SourceRegistry {
    sources: Vec<Arc<dyn ImportSource>>,
}

impl SourceRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
        }
    }

    /// Creates a registry with the built-in sources registered: local
    /// filesystem first, then remote HTTP(S).
    pub fn built_ins() -> Self {
        Self::new()
            .with_source(Arc::new(crate::local_source::LocalSource::new()))
            .with_source(Arc::new(crate::remote_source::RemoteSource::new()))
    }

    /// Appends a source to the lookup order.
    pub fn register(&mut self, source: Arc<dyn ImportSource>) {
        self.sources.push(source);
    }

    /// Builder form of [`register`](Self::register).
    pub fn with_source(mut self, source: Arc<dyn ImportSource>) -> Self {
        self.register(source);
        self
    }

    /// Finds the first registered source that supports the directive.
    ///
    /// # Errors
    ///
    /// Returns `ResolutionError::UnsupportedSource` when no source
    /// claims the directive.
    pub fn find(
        &self,
        directive: &ImportDirective,
        base: &Path,
    ) -> ResolutionResult<Arc<dyn ImportSource>> {
        self.sources
            .iter()
            .find(|source| source.supports(directive, base))
            .cloned()
            .ok_or_else(|| ResolutionError::UnsupportedSource {
                locator: directive.display_locator().to_string(),
            })
    }
}

impl std::fmt::Debug for SourceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceRegistry")
            .field("sources", &self.sources.len())
            .finish()
    }
}
