//! Streaming copy of backup files.
//!
//! - The destination is created with `create_new` (never clobbers; callers copy to a temp name).
//! - 1 MiB buffers keep the syscall count low on network shares.
//! - `Full` durability fsyncs the written file before returning.
//!
//! The source is read once from start to EOF. A backup that is still being
//! written may be copied short; the caller compares against the source size.

use std::fs::{File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::Path;

const BUF_SIZE: usize = 1024 * 1024;

/// Durability mode controlling post-write flush behavior.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DurabilityMode {
    /// Flush to the OS (or the SMB redirector) only.
    Data,
    /// Force data and metadata to stable storage (`sync_all`).
    Full,
}

/// Copy `src` -> `dst`, returning the number of bytes written.
pub(super) fn copy_streaming(src: &Path, dst: &Path, mode: DurabilityMode) -> io::Result<u64> {
    let src_f = File::open(src)?;

    let mut opts = OpenOptions::new();
    opts.write(true).create_new(true);
    #[cfg(windows)]
    {
        use std::os::windows::fs::OpenOptionsExt;
        if mode == DurabilityMode::Full {
            const FILE_FLAG_WRITE_THROUGH: u32 = 0x8000_0000;
            opts.custom_flags(FILE_FLAG_WRITE_THROUGH);
        }
    }
    let dst_f = opts.open(dst)?;

    let mut reader = BufReader::with_capacity(BUF_SIZE, src_f);
    let mut writer = BufWriter::with_capacity(BUF_SIZE, dst_f);
    let bytes = io::copy(&mut reader, &mut writer)?;
    writer.flush()?;

    if mode == DurabilityMode::Full {
        writer.get_ref().sync_all()?;
    }
    Ok(bytes)
}
