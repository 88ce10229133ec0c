//! Input file collection
//!
//! Expands the command-line paths into the list of source files to analyze.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use walkdir::WalkDir;

/// Expand files and directories into source files, in argument order.
///
/// Directories are walked recursively in file-name order. Paths that are
/// neither a supported file nor a directory are logged and skipped.
pub(crate) fn collect_input_files(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            walk_dir(path, &mut files)?;
        } else if path.is_file() && is_supported(path) {
            files.push(canonical(path)?);
        } else {
            tracing::warn!("Skipping invalid path: {}", path.display());
        }
    }
    Ok(files)
}

fn walk_dir(dir: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                tracing::warn!("Failed to read directory entry under {}: {}", dir.display(), e);
                continue;
            }
        };
        if entry.file_type().is_file() && is_supported(entry.path()) {
            files.push(canonical(entry.path())?);
        }
    }
    Ok(())
}

fn is_supported(path: &Path) -> bool {
    codepulse::language::Language::from_path(path).is_some()
}

fn canonical(path: &Path) -> Result<PathBuf> {
    dunce::canonicalize(path).with_context(|| format!("Failed to resolve {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_collect_walks_dirs_sorted_and_filters() {
        let dir = TempDir::new().unwrap();
        let pkg = dir.path().join("pkg");
        std::fs::create_dir_all(pkg.join("inner")).unwrap();
        std::fs::write(pkg.join("b.py"), "").unwrap();
        std::fs::write(pkg.join("a.py"), "").unwrap();
        std::fs::write(pkg.join("notes.txt"), "").unwrap();
        std::fs::write(pkg.join("inner/c.py"), "").unwrap();

        let files = collect_input_files(&[pkg.clone()]).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.py", "b.py", "c.py"]);
        assert!(files.iter().all(|p| p.is_absolute()));
    }

    #[test]
    fn test_collect_skips_invalid_paths() {
        let dir = TempDir::new().unwrap();
        let good = dir.path().join("m.py");
        let text = dir.path().join("readme.md");
        std::fs::write(&good, "").unwrap();
        std::fs::write(&text, "").unwrap();

        let files =
            collect_input_files(&[dir.path().join("missing.py"), text, good.clone()]).unwrap();
        assert_eq!(files, vec![dunce::canonicalize(&good).unwrap()]);
    }
}
