//! Integration tests for the import resolution pipeline.
//!
//! These tests exercise the whole flow end-to-end: real configuration
//! trees written to temporary directories, real HTTP fetches against a
//! mock server, and the public `ConfigLoader`/`ImportResolver` API the
//! rest of the pipeline consumes. Unit coverage for individual modules
//! lives next to those modules in the config_resolver crate.

pub mod helpers;
