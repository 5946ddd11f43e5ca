//! Config validation. Every failure is a `MigrateError::Config`.

use tracing::debug;

use crate::errors::MigrateError;

use super::paths::path_has_symlink_ancestor;
use super::types::Config;
use super::LOGIN_TIMEOUT_MAX;

impl Config {
    pub fn validate(&self) -> Result<(), MigrateError> {
        if self.sqlcmd_path.as_os_str().is_empty() {
            return Err(MigrateError::Config("sqlcmd_path must not be empty".into()));
        }
        if !(1..=LOGIN_TIMEOUT_MAX).contains(&self.login_timeout_secs) {
            return Err(MigrateError::Config(format!(
                "login_timeout_seconds must be between 1 and {LOGIN_TIMEOUT_MAX}, got {}",
                self.login_timeout_secs
            )));
        }
        if let Some(log) = &self.log_file {
            match path_has_symlink_ancestor(log) {
                Ok(false) => {}
                Ok(true) => {
                    return Err(MigrateError::Config(format!(
                        "log_file '{}' has a symlinked ancestor",
                        log.display()
                    )));
                }
                Err(e) => {
                    return Err(MigrateError::Config(format!(
                        "cannot check log_file '{}': {e}",
                        log.display()
                    )));
                }
            }
        }
        debug!(
            sqlcmd = %self.sqlcmd_path.display(),
            login_timeout = self.login_timeout_secs,
            "Config validated"
        );
        Ok(())
    }
}
