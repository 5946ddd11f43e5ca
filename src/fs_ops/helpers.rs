//! I/O error context for backup file transfers.
//!
//! Wraps io::Error with the operation, the path and a hint about the usual
//! cause when copying through administrative shares (missing share, access
//! denied, disk full).
//!
//! Usage:
//!   fs::metadata(p).map_err(io_error_with_help("stat source file", p))?;

use anyhow::anyhow;
use std::io;
use std::path::Path;

fn hint_for(e: &io::Error) -> Option<&'static str> {
    if let Some(code) = e.raw_os_error() {
        #[cfg(unix)]
        {
            let hint = match code {
                libc::EACCES | libc::EPERM => Some("permission denied; check the share and file ACLs"),
                libc::ENOENT => Some("path not found; check the directory exists on the host"),
                libc::ENOSPC => Some("insufficient space on the destination volume"),
                libc::EROFS => Some("read-only filesystem"),
                libc::EHOSTDOWN | libc::EHOSTUNREACH => Some("host unreachable"),
                libc::ENAMETOOLONG => Some("path too long"),
                _ => None,
            };
            if hint.is_some() {
                return hint;
            }
        }
        #[cfg(windows)]
        {
            let hint = match code {
                5 => Some("access denied; the account needs admin rights on the target host"), // ERROR_ACCESS_DENIED
                2 | 3 => Some("path not found; check the directory exists on the host"), // FILE/PATH NOT FOUND
                32 => Some("sharing violation; the backup file is in use"), // ERROR_SHARING_VIOLATION
                53 => Some("network path not found; is the host reachable and file sharing enabled?"), // ERROR_BAD_NETPATH
                65 => Some("network access denied"), // ERROR_NETWORK_ACCESS_DENIED
                67 => Some("administrative share not found (e.g. C$ disabled)"), // ERROR_BAD_NET_NAME
                112 => Some("insufficient disk space"), // ERROR_DISK_FULL
                1326 => Some("logon failure on the remote host"), // ERROR_LOGON_FAILURE
                _ => None,
            };
            if hint.is_some() {
                return hint;
            }
        }
        let _ = code;
    }
    match e.kind() {
        io::ErrorKind::PermissionDenied => Some("permission denied; check the share and file ACLs"),
        io::ErrorKind::NotFound => Some("path not found; check the directory exists on the host"),
        io::ErrorKind::AlreadyExists => Some("already exists"),
        io::ErrorKind::TimedOut => Some("timed out talking to the remote host"),
        _ => None,
    }
}

/// Format "op 'path': error (hint) [os code: n]".
fn build_message(op: &str, path: &Path, e: &io::Error) -> String {
    let mut msg = format!("{} '{}': {}", op, path.display(), e);
    if let Some(hint) = hint_for(e) {
        msg.push_str(&format!(" ({hint})"));
    }
    if let Some(code) = e.raw_os_error() {
        msg.push_str(&format!(" [os code: {code}]"));
    }
    msg
}

/// Closure for `.map_err(...)` converting io::Error -> anyhow::Error with context.
pub fn io_error_with_help<'a>(
    op: &'a str,
    path: &'a Path,
) -> impl FnOnce(io::Error) -> anyhow::Error + 'a {
    move |e: io::Error| anyhow!(build_message(op, path, &e))
}
