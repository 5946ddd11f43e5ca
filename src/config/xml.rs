//! XML configuration support.
//! - Loads settings from config.xml (quick_xml + serde).
//! - Writes a secure template on first run at the default location.
//!
//! Unknown elements and unparsable values are configuration errors; the run
//! does not start with a half-understood config.

use quick_xml::de::from_str as from_xml_str;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::paths::{
    config_path_from_env, default_config_path, default_log_path, path_has_symlink_ancestor,
};
use super::types::{Config, LogLevel};
use super::{LOGIN_TIMEOUT_DEFAULT, SQLCMD_DEFAULT};
use crate::errors::MigrateError;
use crate::platform::{set_dir_mode_0700, set_file_mode_0600, write_config_secure_new_0600};

/// Mirrors config.xml. Values are read as text and trimmed before parsing.
#[derive(Debug, Deserialize)]
#[serde(rename = "config")]
#[serde(deny_unknown_fields)]
struct XmlConfig {
    sqlcmd_path: Option<String>,
    login_timeout_seconds: Option<String>,
    log_level: Option<String>,
    log_file: Option<String>,
    rollback_on_copy_failure: Option<String>,
}

/// Outcome of looking for the config file.
#[derive(Debug)]
pub enum LoadResult {
    Loaded { config: Config, path: PathBuf },
    /// No file at the default location; a template was written there.
    CreatedTemplate(PathBuf),
    /// No file and no template written (e.g. symlinked ancestor).
    Defaults,
}

fn non_empty(v: Option<&str>) -> Option<&str> {
    v.map(str::trim).filter(|s| !s.is_empty())
}

fn parse_bool(field: &str, v: &str) -> Result<bool, MigrateError> {
    match v.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(MigrateError::Config(format!("{field}: expected true/false, got '{v}'"))),
    }
}

fn xml_to_config(parsed: XmlConfig) -> Result<Config, MigrateError> {
    let mut cfg = Config::default();

    if let Some(s) = non_empty(parsed.sqlcmd_path.as_deref()) {
        cfg.sqlcmd_path = PathBuf::from(s);
    }
    if let Some(s) = non_empty(parsed.login_timeout_seconds.as_deref()) {
        cfg.login_timeout_secs = s.parse::<u32>().map_err(|_| {
            MigrateError::Config(format!("login_timeout_seconds: not a number: '{s}'"))
        })?;
    }
    if let Some(s) = non_empty(parsed.log_level.as_deref()) {
        cfg.log_level = s.parse::<LogLevel>().map_err(MigrateError::Config)?;
    }
    if let Some(s) = non_empty(parsed.log_file.as_deref()) {
        cfg.log_file = Some(PathBuf::from(s));
    }
    if let Some(s) = non_empty(parsed.rollback_on_copy_failure.as_deref()) {
        cfg.rollback_on_copy_failure = parse_bool("rollback_on_copy_failure", s)?;
    }
    Ok(cfg)
}

/// Load a Config from a specific XML file.
pub fn load_config_from_xml_path(path: &Path) -> Result<Config, MigrateError> {
    let contents = fs::read_to_string(path)
        .map_err(|e| MigrateError::Config(format!("read config xml '{}': {e}", path.display())))?;
    let parsed: XmlConfig = from_xml_str(&contents)
        .map_err(|e| MigrateError::Config(format!("parse config xml '{}': {e}", path.display())))?;
    xml_to_config(parsed)
}

/// Find and load the config file.
///
/// An explicit `BACKUP_DEVICE_COPY_CONFIG` that points nowhere is an error.
/// A missing default file gets a template and the run continues with defaults.
pub fn load_or_init() -> Result<LoadResult, MigrateError> {
    let explicit = config_path_from_env().is_some();
    let path = default_config_path().map_err(|e| MigrateError::Config(format!("{e:#}")))?;

    if path.exists() {
        let config = load_config_from_xml_path(&path)?;
        return Ok(LoadResult::Loaded { config, path });
    }
    if explicit {
        return Err(MigrateError::Config(format!(
            "config file '{}' (from {}) does not exist",
            path.display(),
            super::CONFIG_ENV
        )));
    }
    match create_template_config(&path) {
        Ok(()) => Ok(LoadResult::CreatedTemplate(path)),
        Err(e) => {
            debug!(path = %path.display(), error = ?e, "Template config not written");
            Ok(LoadResult::Defaults)
        }
    }
}

/// Write the default template (0600, atomic). Refuses symlinked ancestors.
pub fn create_template_config(path: &Path) -> anyhow::Result<()> {
    if path_has_symlink_ancestor(path)? {
        anyhow::bail!(
            "Refusing to create config: ancestor of {} is a symlink",
            path.display()
        );
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
        let _ = set_dir_mode_0700(parent);
    }

    let suggested_log = default_log_path()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|_| "/path/to/backup_device_copy.log".into());

    let content = format!(
        "<!--\n  backup_device_copy configuration (XML)\n\n    sqlcmd_path              -> sqlcmd client used to reach both servers\n    login_timeout_seconds    -> sqlcmd login timeout (1-65534)\n    log_level                -> quiet | normal | info | debug\n    log_file                 -> path to log file (optional; stdout still used)\n    rollback_on_copy_failure -> drop a just-created device when its file copy fails\n\n  CLI flags override these values. Passwords are never read from this file;\n  use BACKUP_DEVICE_COPY_SOURCE_PASSWORD / BACKUP_DEVICE_COPY_DESTINATION_PASSWORD.\n-->\n<config>\n  <sqlcmd_path>{SQLCMD_DEFAULT}</sqlcmd_path>\n  <login_timeout_seconds>{LOGIN_TIMEOUT_DEFAULT}</login_timeout_seconds>\n  <log_level>normal</log_level>\n  <log_file>{suggested_log}</log_file>\n  <rollback_on_copy_failure>false</rollback_on_copy_failure>\n</config>\n"
    );

    write_config_secure_new_0600(path, content.as_bytes())?;
    let _ = set_file_mode_0600(path);
    info!("Created template config at {}", path.display());
    Ok(())
}
