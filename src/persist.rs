//! Atomic file writes for persisted artifacts

use std::io::Write;
use std::path::Path;

/// Write `contents` to `path` via a sibling temp file and rename.
///
/// Creates missing parent directories. Readers never observe a half-written
/// file: either the old contents or the new.
pub(crate) fn write_atomic(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent)?;

    let mut tmp = tempfile::NamedTempFile::new_in(parent)?;
    tmp.write_all(contents)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
