//! Default config/log locations and symlink checks.
//!
//! `BACKUP_DEVICE_COPY_CONFIG` wins over the OS config dir. A relative value is
//! resolved against the current directory; a directory value means
//! `<dir>/config.xml`.

use anyhow::{anyhow, Result};
use dirs::{config_dir, data_dir};
use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub const CONFIG_ENV: &str = "BACKUP_DEVICE_COPY_CONFIG";

const APP_DIR: &str = "backup_device_copy";
const CONFIG_FILE: &str = "config.xml";
const LOG_FILE: &str = "backup_device_copy.log";

/// Config path named by `BACKUP_DEVICE_COPY_CONFIG`, if set and non-empty.
pub fn config_path_from_env() -> Option<PathBuf> {
    let raw = env::var_os(CONFIG_ENV)?;
    if raw.is_empty() {
        return None;
    }
    let mut p = PathBuf::from(raw);
    if p.is_relative()
        && let Ok(cwd) = env::current_dir()
    {
        p = dunce::simplified(&cwd.join(p)).to_path_buf();
    }
    if p.is_dir() {
        p.push(CONFIG_FILE);
    }
    Some(p)
}

/// Config path in effect: the env override, else the OS config dir.
pub fn default_config_path() -> Result<PathBuf> {
    if let Some(p) = config_path_from_env() {
        return Ok(p);
    }
    if let Some(base) = config_dir() {
        return Ok(base.join(APP_DIR).join(CONFIG_FILE));
    }
    env::var_os("HOME")
        .map(|h| PathBuf::from(h).join(".config").join(APP_DIR).join(CONFIG_FILE))
        .ok_or_else(|| anyhow!("cannot determine a config directory (no config dir and HOME unset)"))
}

/// Default log path: next to an explicit config, else in the OS data dir.
pub fn default_log_path() -> Result<PathBuf> {
    if let Some(cfg) = config_path_from_env()
        && let Some(parent) = cfg.parent()
    {
        return Ok(parent.join(LOG_FILE));
    }
    if let Some(base) = data_dir() {
        return Ok(base.join(APP_DIR).join(LOG_FILE));
    }
    env::var_os("HOME")
        .map(|h| {
            PathBuf::from(h)
                .join(".local")
                .join("share")
                .join(APP_DIR)
                .join(LOG_FILE)
        })
        .ok_or_else(|| anyhow!("cannot determine a data directory (no data dir and HOME unset)"))
}

/// True if any existing ancestor of `path` is a symlink.
pub fn path_has_symlink_ancestor(path: &Path) -> io::Result<bool> {
    let mut p = path.parent();
    while let Some(anc) = p {
        if anc.exists() && fs::symlink_metadata(anc)?.file_type().is_symlink() {
            return Ok(true);
        }
        p = anc.parent();
    }
    Ok(false)
}
