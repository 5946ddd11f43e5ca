//! Destination directory selection.
//!
//! The source device's directory is reused when it exists on the destination
//! server; otherwise the destination's default backup directory is used. A
//! failed probe counts as "does not exist", so resolution itself never fails.

use tracing::{debug, warn};

use crate::errors::chain_message;
use crate::server::ServerHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathKind {
    Direct,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathResolution {
    pub kind: PathKind,
    /// Server-local directory the backup file will live in.
    pub directory: String,
}

impl PathResolution {
    /// Replacement directory for the creation script, set only on fallback.
    pub fn replacement_directory(&self) -> Option<&str> {
        match self.kind {
            PathKind::Direct => None,
            PathKind::Fallback => Some(&self.directory),
        }
    }
}

pub fn resolve_destination(destination: &dyn ServerHandle, candidate_dir: &str) -> PathResolution {
    if !candidate_dir.is_empty() {
        match destination.path_exists(candidate_dir) {
            Ok(true) => {
                debug!(directory = %candidate_dir, "Source directory exists at destination");
                return PathResolution {
                    kind: PathKind::Direct,
                    directory: candidate_dir.to_string(),
                };
            }
            Ok(false) => {}
            Err(e) => warn!(
                directory = %candidate_dir,
                error = %chain_message(&e),
                "Could not probe destination directory; using default backup directory"
            ),
        }
    }

    let fallback = destination.default_backup_directory();
    debug!(
        directory = %candidate_dir,
        fallback = %fallback,
        "Directory missing at destination; using default backup directory"
    );
    PathResolution {
        kind: PathKind::Fallback,
        directory: fallback.to_string(),
    }
}
