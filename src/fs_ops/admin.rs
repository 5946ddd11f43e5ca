//! Administrative network paths.
//! `C:\Backups\x.bak` on host `SQL02` becomes `\\SQL02\C$\Backups\x.bak`, which
//! reaches the file through the host's administrative drive share.

/// Build the administrative path for a server-local path on `host`.
/// Paths that are already UNC are returned unchanged.
pub fn admin_path(host: &str, local_path: &str) -> String {
    if local_path.starts_with(r"\\") {
        return local_path.to_string();
    }
    let normalized = local_path.replace('/', "\\");
    let shared = normalized.replacen(':', "$", 1);
    let rest = shared.trim_start_matches('\\');
    let host = host.trim_start_matches('\\');
    if rest.is_empty() {
        format!(r"\\{host}")
    } else {
        format!(r"\\{host}\{rest}")
    }
}

/// Whether two administrative paths name the same file. Windows paths are
/// case-insensitive and either separator may appear.
pub fn same_location(a: &str, b: &str) -> bool {
    let norm = |p: &str| p.replace('/', "\\").to_lowercase();
    norm(a) == norm(b)
}
