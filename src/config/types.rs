//! Core configuration types.
//! - Config holds runtime settings with defaults.
//! - LogLevel represents verbosity with simple parsing helpers.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use super::paths;
use super::{LOGIN_TIMEOUT_DEFAULT, SQLCMD_DEFAULT};

/// Program-defined verbosity levels exposed to users/config.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LogLevel {
    /// Warnings and errors only
    Quiet,
    /// Step narration (default)
    #[default]
    Normal,
    /// Adds per-state detail
    Info,
    /// Everything, including sqlcmd invocations
    Debug,
}

impl LogLevel {
    /// Parse common names (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "quiet" | "warn" | "error" | "none" => Some(LogLevel::Quiet),
            "normal" => Some(LogLevel::Normal),
            "info" | "verbose" | "detailed" => Some(LogLevel::Info),
            "debug" | "trace" => Some(LogLevel::Debug),
            _ => None,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LogLevel::Quiet => "quiet",
            LogLevel::Normal => "normal",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
        };
        f.write_str(s)
    }
}

impl FromStr for LogLevel {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("invalid log level: '{s}'"))
    }
}

/// Runtime configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// sqlcmd client used to reach both servers
    pub sqlcmd_path: PathBuf,
    /// Passed to sqlcmd as `-l`
    pub login_timeout_secs: u32,
    pub log_level: LogLevel,
    pub log_file: Option<PathBuf>,
    /// Drop a just-created destination device when its file copy fails
    pub rollback_on_copy_failure: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sqlcmd_path: PathBuf::from(SQLCMD_DEFAULT),
            login_timeout_secs: LOGIN_TIMEOUT_DEFAULT,
            log_level: LogLevel::Normal,
            log_file: paths::default_log_path().ok(),
            rollback_on_copy_failure: false,
        }
    }
}
