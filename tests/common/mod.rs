//! Common test fixtures and helpers
//!
//! Usage in test files:
//! ```ignore
//! mod common;
//! use common::TestProject;
//! ```

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use codepulse::{Baseline, RunOptions, RunOutcome, RunReport};
use tempfile::TempDir;

/// Path of a file under `tests/fixtures`
pub fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

/// Scratch project with its own baseline file
///
/// The `TempDir` lives as long as the project so files stay on disk.
pub struct TestProject {
    _dir: TempDir,
    root: PathBuf,
}

impl TestProject {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let root = dir.path().to_path_buf();
        Self { _dir: dir, root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write (or overwrite) a source file, creating parent directories
    pub fn write(&self, name: &str, source: &str) -> PathBuf {
        let path = self.root.join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent dir");
        }
        std::fs::write(&path, source).expect("Failed to write source file");
        path
    }

    pub fn baseline_path(&self) -> PathBuf {
        self.root.join(".codepulse/function_hashes.json")
    }

    pub fn load_baseline(&self) -> Baseline {
        Baseline::load(self.baseline_path()).expect("Failed to load baseline")
    }

    /// One full run the way the binary does it: load, analyze, save on success
    pub fn run(&self, files: &[PathBuf], options: &RunOptions) -> RunOutcome {
        let outcome =
            codepulse::run(files, self.load_baseline(), options).expect("Run failed");
        if let RunOutcome::Completed(report) = &outcome {
            report.baseline.save().expect("Failed to save baseline");
        }
        outcome
    }

    /// Run and expect completion
    pub fn run_ok(&self, files: &[PathBuf]) -> RunReport {
        match self.run(files, &RunOptions::default()) {
            RunOutcome::Completed(report) => report,
            RunOutcome::Aborted(failure) => {
                panic!("Unexpected abort on {}", failure.path.display())
            }
        }
    }
}
