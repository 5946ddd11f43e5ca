//! Safe copy of one backup file:
//! - streams into a hidden temp file in the destination directory,
//! - checks the byte count against the source size,
//! - renames the temp file over the destination (replacing an older copy).

use anyhow::{anyhow, bail, Context, Result};
use std::fs;
use std::path::Path;

use super::atomic::replace_with;
use super::helpers::io_error_with_help;
use super::io_copy::{copy_streaming, DurabilityMode};
use super::util;

/// Copy `src` to `dest` and return the number of bytes copied. An existing
/// `dest` is only replaced once the new copy is complete.
pub fn safe_copy_and_rename(
    src: &Path,
    dest: &Path,
    expected_len: u64,
    durability: DurabilityMode,
) -> Result<u64> {
    let dest_dir = dest
        .parent()
        .ok_or_else(|| anyhow!("destination has no parent: {}", dest.display()))?;

    let tmp_path = util::unique_temp_path(dest_dir);
    let bytes = match copy_streaming(src, &tmp_path, durability) {
        Ok(n) => n,
        Err(e) => {
            let _ = fs::remove_file(&tmp_path);
            return Err(io_error_with_help("copy to temporary file", &tmp_path)(e));
        }
    };

    if bytes != expected_len {
        let _ = fs::remove_file(&tmp_path);
        bail!(
            "short copy of '{}': copied {} of {} bytes",
            src.display(),
            bytes,
            expected_len
        );
    }

    if let Err(e) = replace_with(&tmp_path, dest) {
        let _ = fs::remove_file(&tmp_path);
        return Err(e).with_context(|| format!("finalize '{}'", dest.display()));
    }

    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn copies_and_leaves_no_temp() {
        let td = tempdir().unwrap();
        let src = td.path().join("a.bak");
        let out = td.path().join("out");
        fs::create_dir_all(&out).unwrap();
        fs::write(&src, b"0123456789").unwrap();

        let dest = out.join("a.bak");
        let n = safe_copy_and_rename(&src, &dest, 10, DurabilityMode::Full).unwrap();
        assert_eq!(n, 10);
        assert_eq!(fs::read(&dest).unwrap(), b"0123456789");
        let leftovers: Vec<_> = fs::read_dir(&out).unwrap().collect();
        assert_eq!(leftovers.len(), 1);
    }

    #[test]
    fn size_mismatch_is_an_error() {
        let td = tempdir().unwrap();
        let src = td.path().join("a.bak");
        fs::write(&src, b"abc").unwrap();
        let dest = td.path().join("b.bak");
        let err = safe_copy_and_rename(&src, &dest, 99, DurabilityMode::Data).unwrap_err();
        assert!(format!("{err}").contains("short copy"));
        assert!(!dest.exists());
    }

    #[test]
    fn missing_destination_dir_fails() {
        let td = tempdir().unwrap();
        let src = td.path().join("a.bak");
        fs::write(&src, b"abc").unwrap();
        let dest = td.path().join("missing").join("a.bak");
        let err = safe_copy_and_rename(&src, &dest, 3, DurabilityMode::Data).unwrap_err();
        assert!(format!("{err}").contains("copy to temporary file"));
    }
}
