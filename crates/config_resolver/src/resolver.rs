//! Import resolution engine.
//!
//! Walks a configuration's import graph depth-first and folds every
//! fetched fragment into one flattened configuration map. A fragment's
//! own imports are fully resolved before the fragment is merged into
//! its parent (resolution is bottom-up, merging top-down), and the
//! importing document's own sections always fold in last, so explicit
//! content wins over anything inherited transitively.
//!
//! Resolution is strictly sequential: directives are processed in
//! declaration order, each fetch completing before the next begins.
//! That keeps the cycle-detection stack and the fetch log trivially
//! consistent without locking. Every failure is fatal to the whole
//! resolution; there is no partial output mode.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, warn};

use crate::context::ResolutionContext;
use crate::directive::ImportDirective;
use crate::errors::{ResolutionError, ResolutionResult};
use crate::fragment::SectionMap;
use crate::merge::MergeStrategyRegistry;
use crate::path_prefix::apply_prefix;
use crate::source::{ImportSource, SourceRegistry};

#[cfg(test)]
#[path = "resolver_tests.rs"]
mod tests;

/// Top-level key holding a configuration document's import directives.
pub const IMPORT_KEY: &str = "import";

/// Default cap on import nesting depth.
pub const DEFAULT_MAX_DEPTH: usize = 32;

/// Resolves a configuration's import graph into one flattened map.
///
/// The resolver owns its collaborators: an ordered [`SourceRegistry`]
/// deciding who fetches what, and a [`MergeStrategyRegistry`] deciding
/// how sections combine. It is stateless across calls; every `resolve()`
/// constructs a fresh [`ResolutionContext`], so a resolver instance can
/// be shared freely.
///
/// # Examples
///
/// ```no_run
/// use config_resolver::ImportResolver;
/// use std::path::Path;
///
/// # async fn example(root: config_resolver::SectionMap) -> config_resolver::ResolutionResult<()> {
/// let resolver = ImportResolver::new();
/// let merged = resolver.resolve(root, Path::new("/etc/ctx")).await?;
/// assert!(!merged.contains_key("import"));
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ImportResolver {
    sources: SourceRegistry,
    strategies: MergeStrategyRegistry,
    max_depth: usize,
}

impl ImportResolver {
    /// Creates a resolver with the built-in sources (local, then
    /// remote), the built-in merge strategies, and the default depth
    /// cap.
    pub fn new() -> Self {
        Self {
            sources: SourceRegistry::built_ins(),
            strategies: MergeStrategyRegistry::built_ins(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Replaces the source registry.
    pub fn with_sources(mut self, sources: SourceRegistry) -> Self {
        self.sources = sources;
        self
    }

    /// Replaces the merge strategy registry.
    pub fn with_strategies(mut self, strategies: MergeStrategyRegistry) -> Self {
        self.strategies = strategies;
        self
    }

    /// Replaces the import nesting cap.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Resolves all imports of a root configuration document.
    ///
    /// `base_dir` is the directory of the root document; relative local
    /// imports resolve against it. The returned map carries no `import`
    /// key.
    ///
    /// # Errors
    ///
    /// Any [`ResolutionError`] aborts the whole resolution; no partial
    /// merge is returned.
    pub async fn resolve(
        &self,
        root: SectionMap,
        base_dir: &Path,
    ) -> ResolutionResult<SectionMap> {
        let mut context = ResolutionContext::new();
        self.resolve_sections(root, base_dir.to_path_buf(), &mut context)
            .await
    }

    /// Flattens one document: resolves its `import` list into an
    /// accumulator, then folds the document's own sections in last.
    ///
    /// Boxed because the future recurses through `apply_directive` for
    /// every nested fragment.
    fn resolve_sections<'a>(
        &'a self,
        mut sections: SectionMap,
        base_dir: PathBuf,
        context: &'a mut ResolutionContext,
    ) -> Pin<Box<dyn Future<Output = ResolutionResult<SectionMap>> + Send + 'a>> {
        Box::pin(async move {
            let mut accumulator = SectionMap::new();

            if let Some(import_value) = sections.remove(IMPORT_KEY) {
                for directive in parse_directives(import_value)? {
                    self.apply_directive(&directive, &base_dir, context, &mut accumulator)
                        .await?;
                }
            }

            // The document's own sections fold in last: explicit content
            // beats anything inherited through imports.
            for (key, value) in sections {
                let folded = self
                    .strategies
                    .fold_root_section(&key, value, accumulator.remove(&key));
                accumulator.insert(key, folded);
            }

            Ok(accumulator)
        })
    }

    /// Resolves one directive and folds its contribution into the
    /// accumulator.
    async fn apply_directive(
        &self,
        directive: &ImportDirective,
        base_dir: &Path,
        context: &mut ResolutionContext,
        accumulator: &mut SectionMap,
    ) -> ResolutionResult<()> {
        directive.locator()?;

        let source = self.sources.find(directive, base_dir)?;
        let identity = source.canonicalize(directive, base_dir)?;

        if context.is_active(&identity) {
            return Err(ResolutionError::ImportCycle {
                chain: context.cycle_chain(&identity),
            });
        }

        if source.reusable_within_ttl()
            && context.fetched_within(&identity, Duration::from_secs(directive.ttl))
        {
            debug!(
                "Skipping import fetched {}s ago or less: {}",
                directive.ttl, identity
            );
            return Ok(());
        }

        if context.depth() >= self.max_depth {
            return Err(ResolutionError::RecursionLimit {
                limit: self.max_depth,
                locator: identity,
            });
        }

        let fragment = source.fetch(directive, base_dir).await?;
        context.record_fetch(identity.clone());

        // Flatten the fragment's own imports before merging it upward.
        let nested_base = source.resolution_base(&identity, base_dir);
        context.push(identity.clone());
        let flattened = self
            .resolve_sections(fragment.sections, nested_base, context)
            .await;
        context.pop();
        let flattened = flattened?;

        let mut kept = self.filter_sections(directive, source.as_ref(), &identity, flattened);
        if let Some(prefix) = directive.path_prefix.as_deref() {
            apply_prefix(&mut kept, prefix);
        }

        for (key, value) in kept {
            match self
                .strategies
                .merge_fragment_section(&key, accumulator.remove(&key), value)
            {
                Some(merged) => {
                    accumulator.insert(key, merged);
                }
                None => {
                    debug!(
                        "Dropping section '{}' from {}: no merge strategy registered",
                        key, identity
                    );
                }
            }
        }

        Ok(())
    }

    /// Intersects a flattened fragment's sections with the directive's
    /// filter and the source's allowed-sections capability. Dropping a
    /// section here is normal operation, not an error.
    fn filter_sections(
        &self,
        directive: &ImportDirective,
        source: &dyn ImportSource,
        identity: &str,
        flattened: SectionMap,
    ) -> SectionMap {
        let permit = source.allowed_sections();
        let mut kept = SectionMap::new();

        for (key, value) in flattened {
            if !directive.admits_section(&key) {
                debug!(
                    "Dropping section '{}' from {}: excluded by directive filter",
                    key, identity
                );
                continue;
            }
            if !permit.allows(&key) {
                warn!(
                    "Dropping section '{}' from {}: not permitted for this source",
                    key, identity
                );
                continue;
            }
            kept.insert(key, value);
        }

        kept
    }
}

impl Default for ImportResolver {
    fn default() -> Self {
        Self::new()
    }
}

/// Parses a document's `import` value into directives.
///
/// # Errors
///
/// Returns `ResolutionError::InvalidDirective` when the value is not a
/// list or any entry is malformed. Runs before any fetch.
fn parse_directives(import_value: Value) -> ResolutionResult<Vec<ImportDirective>> {
    let Value::Array(entries) = import_value else {
        return Err(ResolutionError::InvalidDirective {
            reason: "`import` must be a list of directives".to_string(),
        });
    };
    entries
        .into_iter()
        .map(ImportDirective::from_value)
        .collect()
}
