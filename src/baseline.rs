//! Persisted baseline of function digests
//!
//! The baseline file is a flat JSON object `{ "<key>": "<hex digest>" }`.
//! It is created on first save, updated in place by merges and never
//! pruned unless [`Baseline::reconcile`] is called explicitly.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::hash::Digest;

/// Errors from loading or saving the baseline
#[derive(Error, Debug)]
pub enum BaselineError {
    /// The baseline file exists but is not a JSON object of strings
    #[error("Baseline {path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Baseline IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to serialize baseline: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Function key → last known digest
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Baseline {
    path: PathBuf,
    entries: BTreeMap<String, Digest>,
}

impl Baseline {
    /// Empty baseline that will be saved to `path`
    pub fn empty(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            entries: BTreeMap::new(),
        }
    }

    /// Load the baseline at `path`.
    ///
    /// A missing file is the first-run state and yields an empty baseline.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, BaselineError> {
        let path = path.into();
        let _span = tracing::info_span!("baseline_load", path = %path.display()).entered();

        let content = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("No baseline yet, starting empty");
                return Ok(Self::empty(path));
            }
            Err(source) => return Err(BaselineError::Io { path, source }),
        };

        let entries: BTreeMap<String, Digest> = match serde_json::from_str(&content) {
            Ok(e) => e,
            Err(source) => return Err(BaselineError::Corrupt { path, source }),
        };
        tracing::debug!(entries = entries.len(), "Baseline loaded");
        Ok(Self { path, entries })
    }

    /// Build a baseline from existing entries (tests, tooling)
    pub fn from_entries<I, K>(path: impl Into<PathBuf>, entries: I) -> Self
    where
        I: IntoIterator<Item = (K, Digest)>,
        K: Into<String>,
    {
        Self {
            path: path.into(),
            entries: entries.into_iter().map(|(k, d)| (k.into(), d)).collect(),
        }
    }

    /// Fold fresh digests in.
    ///
    /// Unknown keys are inserted silently. Known keys whose digest differs
    /// are overwritten and returned, in input order. Equal digests are
    /// no-ops.
    pub fn merge<'a, I>(&mut self, digests: I) -> Vec<String>
    where
        I: IntoIterator<Item = (&'a str, &'a Digest)>,
    {
        let mut changed = Vec::new();
        for (key, digest) in digests {
            match self.entries.get_mut(key) {
                None => {
                    tracing::debug!(key, "New function recorded");
                    self.entries.insert(key.to_string(), digest.clone());
                }
                Some(existing) if existing != digest => {
                    tracing::debug!(key, "Function logic changed");
                    *existing = digest.clone();
                    changed.push(key.to_string());
                }
                Some(_) => {}
            }
        }
        changed
    }

    /// Drop every entry for which `keep` returns false.
    ///
    /// Returns the removed keys in sorted order.
    pub fn reconcile(&mut self, mut keep: impl FnMut(&str) -> bool) -> Vec<String> {
        let stale: Vec<String> = self
            .entries
            .keys()
            .filter(|k| !keep(k.as_str()))
            .cloned()
            .collect();
        for key in &stale {
            self.entries.remove(key);
            tracing::info!(key = %key, "Pruned stale baseline entry");
        }
        stale
    }

    /// Write the full mapping back to disk, creating parent directories
    pub fn save(&self) -> Result<(), BaselineError> {
        let json = serde_json::to_string_pretty(&self.entries)?;
        crate::persist::write_atomic(&self.path, json.as_bytes()).map_err(|source| {
            BaselineError::Io {
                path: self.path.clone(),
                source,
            }
        })?;
        tracing::info!(path = %self.path.display(), entries = self.entries.len(), "Baseline saved");
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&Digest> {
        self.entries.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Entries in key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Digest)> {
        self.entries.iter().map(|(k, d)| (k.as_str(), d))
    }
}
