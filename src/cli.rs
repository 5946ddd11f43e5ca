//! CLI definition and parsing.
//!
//! Notes:
//! - --debug is a shorthand for --log-level debug; --quiet for --log-level quiet.
//! - Passwords are never taken on the command line; a `--*-user` login reads
//!   its password from the environment.

use clap::{Parser, ValueHint};
use std::env;
use std::path::PathBuf;

use crate::config::types::{Config, LogLevel};
use crate::server::Credential;

pub const SOURCE_PASSWORD_ENV: &str = "BACKUP_DEVICE_COPY_SOURCE_PASSWORD";
pub const DESTINATION_PASSWORD_ENV: &str = "BACKUP_DEVICE_COPY_DESTINATION_PASSWORD";

/// Copy backup devices (and their backup files) from one SQL Server to another.
/// CLI flags override config values (loaded from XML if present).
#[derive(Parser, Debug, Clone)]
#[command(
    author,
    version,
    about = "Copy SQL Server backup devices and their backup files between servers"
)]
pub struct Args {
    /// Source server (HOST or HOST\INSTANCE).
    #[arg(long, value_name = "SERVER", required_unless_present = "print_config")]
    pub source: Option<String>,

    /// SQL login for the source; password from BACKUP_DEVICE_COPY_SOURCE_PASSWORD.
    /// Integrated authentication when omitted.
    #[arg(long, value_name = "LOGIN")]
    pub source_user: Option<String>,

    /// Destination server (HOST or HOST\INSTANCE).
    #[arg(long, value_name = "SERVER", required_unless_present = "print_config")]
    pub destination: Option<String>,

    /// SQL login for the destination; password from BACKUP_DEVICE_COPY_DESTINATION_PASSWORD.
    #[arg(long, value_name = "LOGIN")]
    pub destination_user: Option<String>,

    /// Only copy these devices (repeatable or comma separated). Default: all.
    #[arg(long = "device", value_name = "NAME", value_delimiter = ',')]
    pub devices: Vec<String>,

    /// Drop and recreate devices that already exist at the destination.
    #[arg(long)]
    pub force: bool,

    /// Show what would be done without changing either server.
    #[arg(long, visible_alias = "whatif")]
    pub dry_run: bool,

    /// Ask before each drop, create and copy.
    #[arg(long)]
    pub confirm: bool,

    /// Only print warnings and errors (shorthand for --log-level quiet).
    #[arg(short = 'q', long, conflicts_with = "debug")]
    pub quiet: bool,

    /// Enable debug logging (shorthand for --log-level debug).
    #[arg(short = 'd', long)]
    pub debug: bool,

    /// Set log level: quiet, normal, info, debug.
    #[arg(long, value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Emit logs in structured JSON.
    #[arg(long)]
    pub json: bool,

    /// Print the config file location in use and exit.
    #[arg(long)]
    pub print_config: bool,

    /// sqlcmd client to use (overrides config).
    #[arg(long, value_name = "PATH", value_hint = ValueHint::ExecutablePath)]
    pub sqlcmd: Option<PathBuf>,

    /// Drop a just-created destination device when its file copy fails.
    #[arg(long)]
    pub rollback_on_copy_failure: bool,
}

impl Args {
    /// Precedence: --debug > --quiet > --log-level value > None (config default).
    pub fn effective_log_level(&self) -> Option<LogLevel> {
        if self.debug {
            return Some(LogLevel::Debug);
        }
        if self.quiet {
            return Some(LogLevel::Quiet);
        }
        self.log_level.as_deref().and_then(LogLevel::parse)
    }

    /// Apply CLI overrides to a loaded Config (in-place). No-ops for unset flags.
    pub fn apply_overrides(&self, cfg: &mut Config) {
        if let Some(level) = self.effective_log_level() {
            cfg.log_level = level;
        }
        if let Some(p) = &self.sqlcmd {
            cfg.sqlcmd_path = p.clone();
        }
        if self.rollback_on_copy_failure {
            cfg.rollback_on_copy_failure = true;
        }
    }

    pub fn source_credential(&self) -> Option<Credential> {
        credential(self.source_user.as_deref(), SOURCE_PASSWORD_ENV)
    }

    pub fn destination_credential(&self) -> Option<Credential> {
        credential(self.destination_user.as_deref(), DESTINATION_PASSWORD_ENV)
    }
}

fn credential(user: Option<&str>, password_env: &str) -> Option<Credential> {
    let user = user.map(str::trim).filter(|u| !u.is_empty())?;
    let password = env::var(password_env).unwrap_or_default();
    Some(Credential::new(user, password))
}

pub fn parse() -> Args {
    Args::parse()
}
