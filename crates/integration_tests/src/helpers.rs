//! Helper functions for integration tests.
//!
//! Builds on-disk configuration trees in temporary directories so the
//! tests drive the loader exactly the way the pipeline does: from a
//! root document path.

use std::fs;
use std::path::Path;
use std::sync::Once;

use tempfile::TempDir;
use tracing::debug;

static INIT_LOGGING: Once = Once::new();

/// Initializes test logging once per process, honoring `RUST_LOG`.
pub fn init_logging() {
    INIT_LOGGING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Writes a tree of (relative path, contents) files into a fresh
/// temporary directory and returns its guard.
pub fn config_tree(files: &[(&str, &str)]) -> TempDir {
    init_logging();

    let dir = tempfile::tempdir().expect("temp dir should be created");
    for (path, contents) in files {
        write_file(dir.path(), path, contents);
    }
    dir
}

/// Writes one file under `root`, creating parent directories as needed.
pub fn write_file(root: &Path, relative: &str, contents: &str) {
    let full = root.join(relative);
    if let Some(parent) = full.parent() {
        fs::create_dir_all(parent).expect("fixture dirs should be created");
    }
    fs::write(&full, contents).expect("fixture file should be written");
    debug!("Wrote test fixture: {}", full.display());
}
