//! Import resolution error types.
//!
//! Domain-specific errors for the import resolution and configuration
//! merge pipeline. Every variant is fatal to the resolution that raised
//! it: no partial merge result is ever returned.

use thiserror::Error;

#[cfg(test)]
#[path = "errors_tests.rs"]
mod tests;

/// Errors raised while resolving a configuration's import graph.
///
/// Each variant carries the context a caller needs to point the user at
/// the offending directive: the locator that failed and, for cycles, the
/// full chain of identities that led back to the repeated node.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ResolutionError {
    /// A locator's canonical identity reappeared on the active resolution
    /// stack. The chain lists every identity from the first occurrence to
    /// the repeat, in resolution order.
    #[error("Import cycle detected: {}", chain.join(" -> "))]
    ImportCycle { chain: Vec<String> },

    /// No registered import source claimed the directive's locator.
    #[error("No import source supports locator: {locator}")]
    UnsupportedSource { locator: String },

    /// The bytes for a directive could not be obtained. For remote
    /// locators the HTTP status is retained when one was received.
    #[error("Failed to fetch import '{locator}': {reason}")]
    Fetch {
        locator: String,
        reason: String,
        status: Option<u16>,
    },

    /// Fetched bytes could not be decoded under the detected format.
    #[error("Failed to parse import '{locator}' as {format}: {reason}")]
    Parse {
        locator: String,
        format: String,
        reason: String,
    },

    /// A directive is structurally invalid, e.g. missing its locator
    /// field. Detected before any fetch is attempted.
    #[error("Invalid import directive: {reason}")]
    InvalidDirective { reason: String },

    /// The import graph nested deeper than the configured cap. Cycle
    /// detection already bounds recursion logically; this guards against
    /// pathological fan-out of distinct identities.
    #[error("Import nesting exceeded the limit of {limit} at '{locator}'")]
    RecursionLimit { limit: usize, locator: String },
}

/// Result type alias for import resolution operations.
pub type ResolutionResult<T> = Result<T, ResolutionError>;
