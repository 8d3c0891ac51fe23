//! File-based configuration loading.
//!
//! The loader is the entry point the rest of the pipeline uses: it
//! reads a root configuration document from disk, parses it, and hands
//! it to the [`ImportResolver`] with the document's own directory as
//! the resolution base. The result is a flattened, `import`-free
//! section map ready for the downstream section compilers.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::errors::{ResolutionError, ResolutionResult};
use crate::format::{parse_document, DocumentFormat};
use crate::fragment::SectionMap;
use crate::resolver::ImportResolver;

#[cfg(test)]
#[path = "loader_tests.rs"]
mod tests;

/// Loads root configuration documents and resolves their imports.
///
/// # Examples
///
/// ```no_run
/// use config_resolver::ConfigLoader;
/// use std::path::Path;
///
/// # async fn example() -> config_resolver::ResolutionResult<()> {
/// let loader = ConfigLoader::new();
/// let merged = loader.load(Path::new("context.yaml")).await?;
///
/// println!("Merged {} sections", merged.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct ConfigLoader {
    resolver: ImportResolver,
}

impl ConfigLoader {
    /// Creates a loader with a default [`ImportResolver`] (built-in
    /// sources and merge strategies).
    pub fn new() -> Self {
        Self {
            resolver: ImportResolver::new(),
        }
    }

    /// Creates a loader around a custom resolver.
    pub fn with_resolver(resolver: ImportResolver) -> Self {
        Self { resolver }
    }

    /// Reads, parses, and fully resolves a root configuration document.
    ///
    /// The document format is inferred from the file extension. Local
    /// imports inside the document resolve relative to the document's
    /// own directory.
    ///
    /// # Errors
    ///
    /// * `ResolutionError::Fetch` - the file cannot be read
    /// * `ResolutionError::Parse` - unknown extension or undecodable content
    /// * any error raised while resolving the document's imports
    pub async fn load(&self, path: &Path) -> ResolutionResult<SectionMap> {
        let locator = path.display().to_string();

        let bytes = std::fs::read(path).map_err(|err| ResolutionError::Fetch {
            locator: locator.clone(),
            reason: err.to_string(),
            status: None,
        })?;
        let format = DocumentFormat::from_path(&locator).ok_or_else(|| ResolutionError::Parse {
            locator: locator.clone(),
            format: "unknown".to_string(),
            reason: "unsupported file extension".to_string(),
        })?;
        let sections = parse_document(&bytes, format, &locator)?;

        let base_dir = path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));

        let merged = self.resolver.resolve(sections, &base_dir).await?;
        info!("Resolved configuration: {}", locator);
        Ok(merged)
    }
}
