//! Atomic 0600 write used for the config template.

use anyhow::{Context, Result};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::os::unix::fs::OpenOptionsExt;
use std::path::Path;

use super::temp::tmp_config_sibling_name;

/// Write `contents` to a 0600 temp sibling, fsync it, rename it over `path`
/// and fsync the parent directory. The temp file is removed on failure.
pub(super) fn atomic_write_0600(path: &Path, contents: &[u8]) -> Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "config path has no parent"))?;
    fs::create_dir_all(parent).with_context(|| format!("create parent '{}'", parent.display()))?;

    let tmp = tmp_config_sibling_name(path);
    let written = (|| -> Result<()> {
        let mut f = OpenOptions::new()
            .write(true)
            .create_new(true)
            .mode(0o600)
            .open(&tmp)
            .with_context(|| format!("create temp '{}'", tmp.display()))?;
        f.write_all(contents).context("write temp")?;
        f.sync_all().context("fsync temp")?;
        fs::rename(&tmp, path)
            .with_context(|| format!("rename '{}' -> '{}'", tmp.display(), path.display()))
    })();
    if written.is_err() {
        let _ = fs::remove_file(&tmp);
        return written;
    }

    let dir = File::open(parent).with_context(|| format!("open dir '{}'", parent.display()))?;
    dir.sync_all().context("fsync parent dir")?;
    Ok(())
}
