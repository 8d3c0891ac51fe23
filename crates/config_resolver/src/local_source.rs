//! Local filesystem import source.
//!
//! Handles directives whose `path` resolves to an existing file, or to
//! a directory containing an index document. Relative paths resolve
//! against the importing document's own directory, so a fragment's own
//! imports are written relative to the fragment, not to whatever
//! document happened to sit at the root of the resolution.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use crate::directive::ImportDirective;
use crate::errors::{ResolutionError, ResolutionResult};
use crate::format::{parse_document, DocumentFormat};
use crate::fragment::Fragment;
use crate::source::{ImportSource, SectionPermit};

#[cfg(test)]
#[path = "local_source_tests.rs"]
mod tests;

/// Index documents looked up, in order, when a directive names a
/// directory instead of a file.
const DIRECTORY_INDEX_CANDIDATES: [&str; 3] = ["context.json", "context.yaml", "context.yml"];

/// Import source backed by the local filesystem.
///
/// Reads synchronously; a filesystem read is the cheap case and gains
/// nothing from buffered streaming. Local content is fully trusted, so
/// `allowed_sections()` is unrestricted, and local fetches are never
/// TTL-suppressed: importing the same file twice reads and merges it
/// twice.
#[derive(Debug, Clone, Default)]
pub struct LocalSource;

impl LocalSource {
    /// Creates a new local source.
    pub fn new() -> Self {
        Self
    }

    /// Resolves a directive to the file that would be read: the locator
    /// joined to `base` when relative, descending into a directory's
    /// index document when the locator names a directory. Returns
    /// `None` when nothing readable exists there.
    fn resolve_file(&self, directive: &ImportDirective, base: &Path) -> Option<PathBuf> {
        let locator = directive.path.as_deref()?;
        let candidate = {
            let path = Path::new(locator);
            if path.is_absolute() {
                path.to_path_buf()
            } else {
                base.join(path)
            }
        };

        if candidate.is_file() {
            return Some(candidate);
        }
        if candidate.is_dir() {
            for index in DIRECTORY_INDEX_CANDIDATES {
                let indexed = candidate.join(index);
                if indexed.is_file() {
                    return Some(indexed);
                }
            }
        }
        None
    }
}

#[async_trait]
impl ImportSource for LocalSource {
    fn supports(&self, directive: &ImportDirective, base: &Path) -> bool {
        self.resolve_file(directive, base).is_some()
    }

    fn canonicalize(&self, directive: &ImportDirective, base: &Path) -> ResolutionResult<String> {
        let locator = directive.display_locator();
        let file = self
            .resolve_file(directive, base)
            .ok_or_else(|| ResolutionError::Fetch {
                locator: locator.to_string(),
                reason: "file not found".to_string(),
                status: None,
            })?;
        let canonical = file.canonicalize().map_err(|err| ResolutionError::Fetch {
            locator: locator.to_string(),
            reason: err.to_string(),
            status: None,
        })?;
        Ok(canonical.to_string_lossy().into_owned())
    }

    async fn fetch(&self, directive: &ImportDirective, base: &Path) -> ResolutionResult<Fragment> {
        let identity = self.canonicalize(directive, base)?;
        debug!("Reading local import: {}", identity);

        let bytes = std::fs::read(&identity).map_err(|err| ResolutionError::Fetch {
            locator: identity.clone(),
            reason: err.to_string(),
            status: None,
        })?;
        let format =
            DocumentFormat::from_path(&identity).ok_or_else(|| ResolutionError::Parse {
                locator: identity.clone(),
                format: "unknown".to_string(),
                reason: "unsupported file extension".to_string(),
            })?;
        let sections = parse_document(&bytes, format, &identity)?;

        Ok(Fragment::new(identity, sections))
    }

    fn allowed_sections(&self) -> SectionPermit {
        SectionPermit::All
    }

    fn resolution_base(&self, identity: &str, parent_base: &Path) -> PathBuf {
        Path::new(identity)
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| parent_base.to_path_buf())
    }
}
