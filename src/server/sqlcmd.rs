//! SQL Server access through the `sqlcmd` command-line client.
//!
//! Every call spawns one `sqlcmd` process and waits for it. Result rows are
//! read from stdout with headers off (`-h -1`), trimmed columns (`-W`) and a
//! unit-separator column delimiter; error messages go to stderr (`-r1`) and a
//! failing batch sets a nonzero exit code (`-b`).

use anyhow::{anyhow, Context, Result};
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, trace};

use super::{Connector, Credential, ServerHandle};
use crate::errors::MigrateError;
use crate::migrate::script::{quote_literal, DeviceScript, DeviceType};
use crate::model::{BackupDevice, DeviceCatalog, ServerIdentity};

const COLUMN_SEPARATOR: char = '\u{1f}';
const PASSWORD_ENV: &str = "SQLCMDPASSWORD";

const IDENTITY_QUERY: &str = "SET NOCOUNT ON; \
    SELECT CAST(@@SERVERNAME AS nvarchar(256)), \
    CAST(SERVERPROPERTY('ComputerNamePhysicalNetBIOS') AS nvarchar(256));";

const DEFAULT_BACKUP_DIR_QUERY: &str = "SET NOCOUNT ON; \
    DECLARE @dir nvarchar(4000); \
    BEGIN TRY \
      EXEC master.dbo.xp_instance_regread N'HKEY_LOCAL_MACHINE', \
        N'Software\\Microsoft\\MSSQLServer\\MSSQLServer', N'BackupDirectory', @dir OUTPUT; \
    END TRY BEGIN CATCH SET @dir = NULL; END CATCH; \
    SELECT COALESCE(CAST(SERVERPROPERTY('InstanceDefaultBackupPath') AS nvarchar(4000)), @dir);";

const CATALOG_QUERY: &str = "SET NOCOUNT ON; \
    SELECT name, physical_name FROM sys.backup_devices ORDER BY name;";

/// Creates `SqlcmdServer` handles.
#[derive(Debug, Clone)]
pub struct SqlcmdConnector {
    program: PathBuf,
    login_timeout_secs: u32,
}

impl SqlcmdConnector {
    pub fn new(program: impl Into<PathBuf>, login_timeout_secs: u32) -> Self {
        Self {
            program: program.into(),
            login_timeout_secs,
        }
    }
}

impl Connector for SqlcmdConnector {
    type Handle = SqlcmdServer;

    fn connect(
        &self,
        server: &str,
        credential: Option<&Credential>,
    ) -> std::result::Result<SqlcmdServer, MigrateError> {
        let session = Session {
            program: self.program.clone(),
            server: server.to_string(),
            credential: credential.cloned(),
            login_timeout_secs: self.login_timeout_secs,
        };
        let connection_error = |e: anyhow::Error| MigrateError::Connection {
            server: server.to_string(),
            reason: format!("{e:#}"),
        };

        let identity = session.identity().map_err(connection_error)?;
        let default_backup_directory = session
            .default_backup_directory()
            .map_err(connection_error)?;
        let catalog = session.catalog().map_err(connection_error)?;

        debug!(
            server = %identity.domain_qualified_name,
            host = %identity.net_bios_host,
            devices = catalog.len(),
            default_backup_directory = %default_backup_directory,
            "Connected"
        );

        Ok(SqlcmdServer {
            session,
            identity,
            catalog,
            default_backup_directory,
        })
    }
}

/// One server reached through sqlcmd.
#[derive(Debug)]
pub struct SqlcmdServer {
    session: Session,
    identity: ServerIdentity,
    catalog: DeviceCatalog,
    default_backup_directory: String,
}

impl ServerHandle for SqlcmdServer {
    fn identity(&self) -> &ServerIdentity {
        &self.identity
    }

    fn devices(&self) -> &DeviceCatalog {
        &self.catalog
    }

    fn default_backup_directory(&self) -> &str {
        &self.default_backup_directory
    }

    fn script_device(&self, device: &BackupDevice) -> Result<DeviceScript> {
        let sql = format!(
            "SET NOCOUNT ON; SELECT type_desc, physical_name FROM sys.backup_devices WHERE name = N'{}';",
            quote_literal(&device.name)
        );
        let rows = self.session.query(&sql)?;
        let row = rows
            .first()
            .ok_or_else(|| anyhow!("device no longer exists on {}", self.identity))?;
        let type_desc = column(row, 0)?;
        let device_type = DeviceType::parse(type_desc)
            .ok_or_else(|| anyhow!("unsupported device type '{type_desc}'"))?;
        let physical = column(row, 1)?;
        Ok(DeviceScript::new(
            self.identity.domain_qualified_name.clone(),
            device.name.clone(),
            device_type,
            physical,
        ))
    }

    fn execute_non_query(&mut self, sql: &str) -> Result<()> {
        self.session.execute(sql)
    }

    fn refresh_device_catalog(&mut self) -> Result<()> {
        self.catalog = self.session.catalog()?;
        trace!(server = %self.identity, devices = self.catalog.len(), "Device catalog refreshed");
        Ok(())
    }

    fn path_exists(&self, path: &str) -> Result<bool> {
        let sql = format!(
            "SET NOCOUNT ON; \
             DECLARE @r TABLE (file_exists int, is_directory int, parent_exists int); \
             INSERT INTO @r EXEC master.dbo.xp_fileexist N'{}'; \
             SELECT is_directory FROM @r;",
            quote_literal(path)
        );
        let rows = self.session.query(&sql)?;
        Ok(rows
            .first()
            .and_then(|r| r.first())
            .is_some_and(|v| v.trim() == "1"))
    }

    fn disconnect(&mut self) {
        // sqlcmd holds no connection between calls.
        debug!(server = %self.identity, "Disconnected");
    }
}

#[derive(Debug, Clone)]
struct Session {
    program: PathBuf,
    server: String,
    credential: Option<Credential>,
    login_timeout_secs: u32,
}

impl Session {
    fn identity(&self) -> Result<ServerIdentity> {
        let rows = self.query(IDENTITY_QUERY).context("read server identity")?;
        let row = rows
            .first()
            .ok_or_else(|| anyhow!("server returned no identity row"))?;
        let name = non_null(row.first().map(String::as_str))
            .map(str::to_string)
            .unwrap_or_else(|| self.server.clone());
        let host = non_null(row.get(1).map(String::as_str))
            .map(str::to_string)
            .unwrap_or_else(|| host_from_server_name(&name));
        Ok(ServerIdentity::new(name, host))
    }

    fn default_backup_directory(&self) -> Result<String> {
        let rows = self
            .query(DEFAULT_BACKUP_DIR_QUERY)
            .context("read default backup directory")?;
        rows.first()
            .and_then(|r| non_null(r.first().map(String::as_str)))
            .map(str::to_string)
            .ok_or_else(|| anyhow!("server reports no default backup directory"))
    }

    fn catalog(&self) -> Result<DeviceCatalog> {
        let rows = self.query(CATALOG_QUERY).context("read backup device catalog")?;
        rows.iter()
            .map(|r| -> Result<BackupDevice> {
                Ok(BackupDevice::new(column(r, 0)?, column(r, 1)?))
            })
            .collect()
    }

    fn query(&self, sql: &str) -> Result<Vec<Vec<String>>> {
        let stdout = self.run(sql)?;
        Ok(parse_rows(&stdout))
    }

    fn execute(&self, sql: &str) -> Result<()> {
        self.run(sql).map(|_| ())
    }

    fn run(&self, sql: &str) -> Result<String> {
        let args = build_args(
            &self.server,
            self.credential.as_ref().map(|c| c.user.as_str()),
            self.login_timeout_secs,
            sql,
        );
        let mut cmd = Command::new(&self.program);
        cmd.args(&args);
        if let Some(c) = &self.credential {
            cmd.env(PASSWORD_ENV, &c.password);
        }
        trace!(server = %self.server, sql, "Running sqlcmd");

        let output = cmd
            .output()
            .with_context(|| format!("start sqlcmd '{}'", display_program(&self.program)))?;
        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let detail = first_non_empty(&[stderr.trim(), stdout.trim()])
                .unwrap_or("no error output");
            return Err(MigrateError::Query {
                server: self.server.clone(),
                reason: format!("sqlcmd exited with {}: {}", output.status, detail),
            }
            .into());
        }
        Ok(stdout)
    }
}

/// Command-line arguments for one sqlcmd batch. The password, when any, travels
/// in the environment rather than on the command line.
pub(crate) fn build_args(
    server: &str,
    user: Option<&str>,
    login_timeout_secs: u32,
    sql: &str,
) -> Vec<String> {
    let mut args = vec!["-S".to_string(), server.to_string()];
    match user {
        Some(u) => {
            args.push("-U".into());
            args.push(u.to_string());
        }
        None => args.push("-E".into()),
    }
    args.extend(
        [
            "-d",
            "master",
            "-b",
            "-r1",
            "-h",
            "-1",
            "-W",
            "-l",
        ]
        .map(String::from),
    );
    args.push(login_timeout_secs.to_string());
    args.push("-s".into());
    args.push(COLUMN_SEPARATOR.to_string());
    args.push("-Q".into());
    args.push(sql.to_string());
    args
}

/// Split sqlcmd output into rows of trimmed columns, skipping blank lines.
pub(crate) fn parse_rows(stdout: &str) -> Vec<Vec<String>> {
    stdout
        .lines()
        .map(|l| l.trim_end_matches('\r'))
        .filter(|l| !l.trim().is_empty())
        .map(|l| {
            l.split(COLUMN_SEPARATOR)
                .map(|c| c.trim().to_string())
                .collect()
        })
        .collect()
}

fn column(row: &[String], idx: usize) -> Result<&str> {
    non_null(row.get(idx).map(String::as_str))
        .ok_or_else(|| anyhow!("missing column {idx} in sqlcmd output row {row:?}"))
}

fn non_null(v: Option<&str>) -> Option<&str> {
    v.filter(|s| !s.is_empty() && !s.eq_ignore_ascii_case("NULL"))
}

/// "HOST\INSTANCE" or "HOST,1433" -> "HOST".
fn host_from_server_name(name: &str) -> String {
    name.split(['\\', ','])
        .next()
        .unwrap_or(name)
        .trim()
        .to_string()
}

fn first_non_empty<'a>(candidates: &[&'a str]) -> Option<&'a str> {
    candidates.iter().copied().find(|s| !s.is_empty())
}

fn display_program(p: &Path) -> String {
    p.display().to_string()
}
