//! Backup file transfer between two servers.

use anyhow::{bail, Result};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

use super::copy::safe_copy_and_rename;
use super::helpers::io_error_with_help;
use super::io_copy::DurabilityMode;
use super::space::{ensure_space_for_copy, format_bytes};

/// Copies one file between two network paths.
pub trait FileTransfer {
    /// Copy `source` to `destination`, replacing an existing destination file.
    /// Returns the number of bytes copied.
    fn copy_file(&self, source: &str, destination: &str) -> Result<u64>;
}

/// Copies through the hosts' administrative shares (`\\HOST\C$\...`), which
/// requires an account with admin rights on both hosts.
#[derive(Debug, Clone, Copy)]
pub struct AdminShareTransfer {
    durability: DurabilityMode,
}

impl AdminShareTransfer {
    pub fn new(durability: DurabilityMode) -> Self {
        Self { durability }
    }
}

impl Default for AdminShareTransfer {
    fn default() -> Self {
        Self::new(DurabilityMode::Full)
    }
}

impl FileTransfer for AdminShareTransfer {
    fn copy_file(&self, source: &str, destination: &str) -> Result<u64> {
        let src = Path::new(source);
        let dest = Path::new(destination);

        let meta = fs::metadata(src).map_err(io_error_with_help("stat source file", src))?;
        if !meta.is_file() {
            bail!("source is not a regular file: {}", src.display());
        }
        let len = meta.len();

        let Some(dest_dir) = dest.parent().filter(|p| !p.as_os_str().is_empty()) else {
            bail!("destination has no directory component: {}", dest.display());
        };
        fs::metadata(dest_dir).map_err(io_error_with_help("open destination directory", dest_dir))?;
        ensure_space_for_copy(dest_dir, len)?;

        debug!(src = %src.display(), dest = %dest.display(), size = len, "Copying backup file");
        let bytes = safe_copy_and_rename(src, dest, len, self.durability)?;
        info!(dest = %dest.display(), size = %format_bytes(bytes), "Backup file copied");
        Ok(bytes)
    }
}
