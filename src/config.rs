//! Configuration file support for codepulse
//!
//! Config files are loaded in order (later overrides earlier):
//! 1. `~/.config/codepulse/config.toml` (user defaults)
//! 2. `.codepulse.toml` in project root (project overrides)
//!
//! CLI flags and environment variables override all config file values.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::diff::Identity;
use crate::parser::Parser;

/// Configuration options loaded from config files
///
/// # Example
///
/// ```toml
/// # ~/.config/codepulse/config.toml or .codepulse.toml
/// baseline = ".codepulse/function_hashes.json"
/// call_graph = ".codepulse/call_graph.json"
/// identity = "file"
/// diagnostic_calls = ["trace", "debug_print"]
/// keep_going = false
/// prune = false
/// max_file_size = 10485760
/// max_depth = 400
/// ```
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Baseline file (relative paths resolve against the project root)
    pub baseline: Option<PathBuf>,
    /// Call-relation artifact; only written when set
    pub call_graph: Option<PathBuf>,
    /// Baseline key mode
    pub identity: Option<Identity>,
    /// Extra diagnostic call names, appended to the built-in set
    pub diagnostic_calls: Vec<String>,
    /// Continue past unparsable files
    pub keep_going: Option<bool>,
    /// Reconcile the baseline against the functions seen this run
    pub prune: Option<bool>,
    /// Files larger than this many bytes are treated as unparsable
    pub max_file_size: Option<u64>,
    /// Files nested deeper than this are treated as unparsable
    pub max_depth: Option<usize>,
}

impl Config {
    /// Default baseline location under the project root
    pub const DEFAULT_BASELINE: &'static str = ".codepulse/function_hashes.json";

    /// Load configuration from user and project config files
    pub fn load(project_root: &Path) -> Self {
        let user_config = dirs::config_dir()
            .map(|d| d.join("codepulse/config.toml"))
            .and_then(|p| Self::load_file(&p))
            .unwrap_or_default();

        let project_config =
            Self::load_file(&project_root.join(".codepulse.toml")).unwrap_or_default();

        // Project overrides user
        let merged = user_config.override_with(project_config);
        tracing::debug!(
            baseline = ?merged.baseline,
            call_graph = ?merged.call_graph,
            identity = ?merged.identity,
            diagnostic_calls = merged.diagnostic_calls.len(),
            keep_going = ?merged.keep_going,
            prune = ?merged.prune,
            max_file_size = ?merged.max_file_size,
            max_depth = ?merged.max_depth,
            "Effective config after merge"
        );
        merged
    }

    /// Load configuration from a specific file
    pub fn load_file(path: &Path) -> Option<Self> {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!("Failed to read config {}: {}", path.display(), e);
                return None;
            }
        };

        match toml::from_str::<Self>(&content) {
            Ok(config) => {
                tracing::debug!(path = %path.display(), "Loaded config");
                Some(config)
            }
            Err(e) => {
                tracing::warn!("Failed to parse config {}: {}", path.display(), e);
                None
            }
        }
    }

    /// Layer another config on top (other overrides self where present)
    fn override_with(self, other: Self) -> Self {
        let mut diagnostic_calls = self.diagnostic_calls;
        for name in other.diagnostic_calls {
            if !diagnostic_calls.contains(&name) {
                diagnostic_calls.push(name);
            }
        }

        Config {
            baseline: other.baseline.or(self.baseline),
            call_graph: other.call_graph.or(self.call_graph),
            identity: other.identity.or(self.identity),
            diagnostic_calls,
            keep_going: other.keep_going.or(self.keep_going),
            prune: other.prune.or(self.prune),
            max_file_size: other.max_file_size.or(self.max_file_size),
            max_depth: other.max_depth.or(self.max_depth),
        }
    }

    /// Baseline path with default fallback, resolved against `root`
    pub fn baseline_or_default(&self, root: &Path) -> PathBuf {
        let path = self
            .baseline
            .clone()
            .unwrap_or_else(|| PathBuf::from(Self::DEFAULT_BASELINE));
        root.join(path)
    }

    /// Call-graph artifact path resolved against `root`, if configured
    pub fn call_graph_path(&self, root: &Path) -> Option<PathBuf> {
        self.call_graph.as_ref().map(|p| root.join(p))
    }

    pub fn keep_going_or_default(&self) -> bool {
        self.keep_going.unwrap_or(false)
    }

    pub fn prune_or_default(&self) -> bool {
        self.prune.unwrap_or(false)
    }

    /// Parser with the configured size and depth limits applied
    pub fn parser(&self) -> Parser {
        let mut parser = Parser::new();
        if let Some(size) = self.max_file_size {
            parser = parser.with_max_file_size(size);
        }
        if let Some(depth) = self.max_depth {
            parser = parser.with_max_depth(depth);
        }
        parser
    }
}
