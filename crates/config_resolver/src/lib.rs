//! Import resolution and configuration merging for ContextWeaver.
//!
//! A ContextWeaver configuration document describes the documents,
//! tools, prompts, variables, and settings of an LLM-context build. A
//! document may *import* fragments from other local files or remote
//! URLs, optionally relocating their embedded paths and restricting
//! which sections they may contribute; imports nest arbitrarily. This
//! crate turns a root document plus its import graph into one
//! flattened, self-consistent configuration map.
//!
//! The moving parts, leaves first:
//!
//! - [`ImportDirective`] - one entry of a document's `import` list
//! - [`DocumentFormat`] / [`format::parse_document`] - bytes to sections
//! - [`ImportSource`] - capability object that fetches directives
//!   ([`LocalSource`], [`RemoteSource`] built in)
//! - [`path_prefix`] - relative path rewriting for relocated fragments
//! - [`MergeStrategyRegistry`] - how sections combine
//! - [`ImportResolver`] - the depth-first walk tying it together
//! - [`ConfigLoader`] - file-based entry point for the pipeline
//!
//! Variable substitution (`${VAR}`) and section compilation happen
//! downstream and are out of scope here.

pub mod context;
pub mod directive;
pub mod errors;
pub mod format;
pub mod fragment;
pub mod loader;
pub mod local_source;
pub mod merge;
pub mod path_prefix;
pub mod remote_source;
pub mod resolver;
pub mod source;

// Re-export for convenient access
pub use context::ResolutionContext;
pub use directive::{ImportDirective, DEFAULT_TTL_SECONDS};
pub use errors::{ResolutionError, ResolutionResult};
pub use format::DocumentFormat;
pub use fragment::{Fragment, SectionMap};
pub use loader::ConfigLoader;
pub use local_source::LocalSource;
pub use merge::MergeStrategyRegistry;
pub use remote_source::RemoteSource;
pub use resolver::{ImportResolver, DEFAULT_MAX_DEPTH, IMPORT_KEY};
pub use source::{ImportSource, SectionPermit, SourceRegistry};
