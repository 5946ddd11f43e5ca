//! Server collaborators.
//! The migration steps only see the `ServerHandle` trait; `sqlcmd` provides the
//! production implementation that talks to SQL Server through the sqlcmd client.

pub mod sqlcmd;

use anyhow::Result;

use crate::errors::MigrateError;
use crate::migrate::script::DeviceScript;
use crate::model::{BackupDevice, DeviceCatalog, ServerIdentity};

pub use sqlcmd::{SqlcmdConnector, SqlcmdServer};

/// SQL login used instead of integrated authentication.
#[derive(Clone)]
pub struct Credential {
    pub user: String,
    pub password: String,
}

impl Credential {
    pub fn new(user: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            password: password.into(),
        }
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Connected server. All calls block until the server answers.
pub trait ServerHandle {
    fn identity(&self) -> &ServerIdentity;

    /// Device catalog snapshot; only changes on `refresh_device_catalog`.
    fn devices(&self) -> &DeviceCatalog;

    /// Server-local default backup directory.
    fn default_backup_directory(&self) -> &str;

    /// Creation script for a device of this server.
    fn script_device(&self, device: &BackupDevice) -> Result<DeviceScript>;

    fn execute_non_query(&mut self, sql: &str) -> Result<()>;

    fn refresh_device_catalog(&mut self) -> Result<()>;

    /// Whether a server-local directory exists, as seen by the server itself.
    fn path_exists(&self, path: &str) -> Result<bool>;

    fn disconnect(&mut self);
}

/// Opens `ServerHandle`s. Connection failures are fatal for a run.
pub trait Connector {
    type Handle: ServerHandle;

    fn connect(
        &self,
        server: &str,
        credential: Option<&Credential>,
    ) -> std::result::Result<Self::Handle, MigrateError>;
}

/// Connect the source, then the destination. The source handle is
/// disconnected again when the destination cannot be reached.
pub fn connect_both<C: Connector>(
    connector: &C,
    source: (&str, Option<&Credential>),
    destination: (&str, Option<&Credential>),
) -> std::result::Result<(C::Handle, C::Handle), MigrateError> {
    let mut src = connector.connect(source.0, source.1)?;
    match connector.connect(destination.0, destination.1) {
        Ok(dst) => Ok((src, dst)),
        Err(e) => {
            src.disconnect();
            Err(e)
        }
    }
}
