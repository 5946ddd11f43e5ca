//! Final rename of a fully written temp file over the destination backup file.
//! `fs::rename` replaces an existing file on both Unix and Windows; on Unix the
//! directory is fsynced afterwards (best-effort).

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

pub(super) fn replace_with(tmp: &Path, dst: &Path) -> Result<()> {
    fs::rename(tmp, dst)
        .with_context(|| format!("rename '{}' -> '{}'", tmp.display(), dst.display()))?;

    #[cfg(unix)]
    {
        if let Some(parent) = dst.parent() {
            let _ = super::util::fsync_dir(parent);
        }
    }

    Ok(())
}
