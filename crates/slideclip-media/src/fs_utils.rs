//! Filesystem helpers for replace-on-success writes.
//!
//! Every output that may overwrite an existing file is first produced under a
//! temporary name in the same directory, then renamed over the target. A
//! rename within one directory never crosses filesystems, so the replacement
//! is atomic and a failed write leaves the previous file in place.

use std::io::Write;
use std::path::Path;

use tempfile::{Builder, NamedTempFile, TempPath};
use tokio::fs;

use crate::error::{MediaError, MediaResult};

fn parent_dir(target: &Path) -> &Path {
    match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

/// Reserve a temporary path next to `target`.
///
/// The temporary keeps the target's extension so FFmpeg can infer the output
/// format. It is deleted when dropped unless [`commit`] consumes it.
pub fn temp_sibling(target: &Path) -> MediaResult<TempPath> {
    let suffix = target
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{}", ext))
        .unwrap_or_default();

    let file = Builder::new()
        .prefix(".slideclip-")
        .suffix(&suffix)
        .tempfile_in(parent_dir(target))?;

    Ok(file.into_temp_path())
}

/// Atomically move a finished temporary over `target`.
pub fn commit(temp: TempPath, target: &Path) -> MediaResult<()> {
    temp.persist(target).map_err(|e| {
        tracing::error!(
            "Failed to replace {} with finished output: {}",
            target.display(),
            e.error
        );
        MediaError::from(e.error)
    })
}

/// Write `contents` to `target` atomically.
pub fn write_atomic(target: &Path, contents: &[u8]) -> MediaResult<()> {
    let mut file = NamedTempFile::new_in(parent_dir(target))?;
    file.write_all(contents)?;
    file.as_file().sync_all()?;
    file.persist(target).map_err(|e| MediaError::from(e.error))?;
    Ok(())
}

/// Create `dir` and its parents if missing.
pub async fn ensure_dir(dir: impl AsRef<Path>) -> MediaResult<()> {
    let dir = dir.as_ref();
    if !dir.exists() {
        fs::create_dir_all(dir).await?;
    }
    Ok(())
}
