//! Run-wide change detection against the baseline
//!
//! [`DiffEngine`] wraps [`Baseline::merge`] for every file of a run and
//! accumulates one [`ChangeSet`] of function names.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::baseline::Baseline;
use crate::hash::Digest;

/// How functions are keyed in the baseline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Identity {
    /// Bare function name. Same-named functions in different files share
    /// one baseline entry.
    #[default]
    Name,
    /// `<file>::<name>`
    File,
}

impl Identity {
    /// Baseline key for a function defined in `file`
    pub fn key(&self, file: &str, name: &str) -> String {
        match self {
            Identity::Name => name.to_string(),
            Identity::File => format!("{file}::{name}"),
        }
    }
}

impl std::fmt::Display for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Identity::Name => write!(f, "name"),
            Identity::File => write!(f, "file"),
        }
    }
}

impl std::str::FromStr for Identity {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "name" => Ok(Identity::Name),
            "file" => Ok(Identity::File),
            other => Err(format!(
                "Unknown identity mode: '{other}'. Valid options: name, file"
            )),
        }
    }
}

/// Ordered set of changed function names
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    names: Vec<String>,
    seen: HashSet<String>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a name. Returns false if it was already recorded.
    pub fn insert(&mut self, name: impl Into<String>) -> bool {
        let name = name.into();
        if self.seen.contains(&name) {
            return false;
        }
        self.seen.insert(name.clone());
        self.names.push(name);
        true
    }

    pub fn contains(&self, name: &str) -> bool {
        self.seen.contains(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for ChangeSet {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        let mut set = ChangeSet::new();
        for name in iter {
            set.insert(name);
        }
        set
    }
}

impl Serialize for ChangeSet {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.names.serialize(serializer)
    }
}

/// Digest of one function in one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionDigest {
    pub name: String,
    pub digest: Digest,
}

/// Compares per-file digests against the baseline, one file at a time
#[derive(Debug)]
pub struct DiffEngine {
    baseline: Baseline,
    identity: Identity,
    changes: ChangeSet,
    /// Keys compared this run
    live_keys: HashSet<String>,
    /// Files compared this run
    files: HashSet<String>,
}

impl DiffEngine {
    pub fn new(baseline: Baseline, identity: Identity) -> Self {
        Self {
            baseline,
            identity,
            changes: ChangeSet::new(),
            live_keys: HashSet::new(),
            files: HashSet::new(),
        }
    }

    /// Compare one file's digests. Returns the names newly added to the
    /// change set by this file.
    pub fn compare(&mut self, file: &str, digests: &[FunctionDigest]) -> Vec<String> {
        let keyed: Vec<(String, &FunctionDigest)> = digests
            .iter()
            .map(|d| (self.identity.key(file, &d.name), d))
            .collect();

        let changed_keys: HashSet<String> = self
            .baseline
            .merge(keyed.iter().map(|(k, d)| (k.as_str(), &d.digest)))
            .into_iter()
            .collect();

        let mut added = Vec::new();
        for (key, d) in &keyed {
            if changed_keys.contains(key) && self.changes.insert(d.name.clone()) {
                added.push(d.name.clone());
            }
        }
        self.live_keys.extend(keyed.into_iter().map(|(k, _)| k));
        self.files.insert(file.to_string());

        if !added.is_empty() {
            tracing::info!(file, changed = ?added, "Changed functions");
        }
        added
    }

    /// Remove baseline entries for functions that no longer exist.
    ///
    /// With [`Identity::File`] only entries of files compared in this run
    /// are candidates. With [`Identity::Name`] the file is unknown, so any
    /// key not seen this run is dropped; run over the whole project.
    pub fn reconcile(&mut self) -> Vec<String> {
        let live = &self.live_keys;
        let files = &self.files;
        match self.identity {
            Identity::Name => self.baseline.reconcile(|k| live.contains(k)),
            Identity::File => self.baseline.reconcile(|k| {
                let Some((file, _)) = k.rsplit_once("::") else {
                    return true;
                };
                !files.contains(file) || live.contains(k)
            }),
        }
    }

    pub fn changes(&self) -> &ChangeSet {
        &self.changes
    }

    pub fn into_parts(self) -> (Baseline, ChangeSet) {
        (self.baseline, self.changes)
    }
}
