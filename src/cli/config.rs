//! Configuration and project root detection
//!
//! Provides project root detection and config file application.

use std::path::{Path, PathBuf};

use codepulse::config::Config;

use super::Cli;

/// Find project root by looking for common markers.
pub(crate) fn find_project_root() -> PathBuf {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    root_from(&cwd).unwrap_or_else(|| {
        tracing::debug!("No project root found, using current directory");
        cwd
    })
}

/// Nearest ancestor of `start` (inclusive) holding a project marker
fn root_from(start: &Path) -> Option<PathBuf> {
    // Listed in priority order: if multiple exist, first match wins
    let markers = [
        ".codepulse.toml", // Explicit project config
        "pyproject.toml",  // Python (modern)
        "setup.py",        // Python (legacy)
        "setup.cfg",       // Python (legacy)
        ".git",            // Git repository root (fallback)
    ];

    start
        .ancestors()
        .find(|dir| markers.iter().any(|m| dir.join(m).exists()))
        .map(Path::to_path_buf)
}

/// Apply config file defaults to CLI options
/// CLI flags always override config values
pub(super) fn apply_config_defaults(cli: &mut Cli, config: &Config, root: &Path) {
    if cli.call_graph.is_none() {
        cli.call_graph = config.call_graph_path(root);
    }
    if cli.identity.is_none() {
        cli.identity = config.identity;
    }
    if !cli.keep_going && config.keep_going_or_default() {
        cli.keep_going = true;
    }
    if !cli.prune && config.prune_or_default() {
        cli.prune = true;
    }
}
