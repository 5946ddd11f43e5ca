//! Device creation scripts.
//!
//! A script is kept as a template with explicit fields (server, device name,
//! type, directory, file name) and only rendered to SQL when it is executed.
//! Retargeting a script to another server or directory replaces fields; the
//! rendered text is never searched or patched.

use std::fmt;

use tracing::debug;

use crate::model::{join_location, split_location, ServerIdentity};

/// Media type of a backup device, as understood by `sp_addumpdevice`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceType {
    Disk,
    Tape,
}

impl DeviceType {
    /// Parse `sys.backup_devices.type_desc` (or the `@devtype` spelling).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "disk" => Some(DeviceType::Disk),
            "tape" => Some(DeviceType::Tape),
            _ => None,
        }
    }

    pub fn as_sql(self) -> &'static str {
        match self {
            DeviceType::Disk => "disk",
            DeviceType::Tape => "tape",
        }
    }
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// Creation script template for one backup device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceScript {
    /// Server the script targets (domain qualified name).
    pub server: String,
    pub device_name: String,
    pub device_type: DeviceType,
    pub directory: String,
    pub file_name: String,
}

impl DeviceScript {
    /// Build a script from a device's physical location.
    pub fn new(
        server: impl Into<String>,
        device_name: impl Into<String>,
        device_type: DeviceType,
        physical_location: &str,
    ) -> Self {
        let (directory, file_name) = split_location(physical_location);
        Self {
            server: server.into(),
            device_name: device_name.into(),
            device_type,
            directory: directory.to_string(),
            file_name: file_name.to_string(),
        }
    }

    pub fn physical_location(&self) -> String {
        join_location(&self.directory, &self.file_name)
    }

    /// SQL text executed on the target server.
    pub fn render(&self) -> String {
        format!(
            "/****** Object:  BackupDevice [{name}]    Server: [{server}] ******/\n\
             EXEC master.dbo.sp_addumpdevice  @devtype = N'{devtype}', @logicalname = N'{logical}', @physicalname = N'{physical}'\n",
            name = quote_ident(&self.device_name),
            server = quote_ident(&self.server),
            devtype = self.device_type.as_sql(),
            logical = quote_literal(&self.device_name),
            physical = quote_literal(&self.physical_location()),
        )
    }
}

/// Retarget a source device script to the destination server and, on a
/// directory fallback, to the replacement directory.
///
/// Both substitutions are independent: the server identity is always the
/// destination's, and the directory is the replacement whenever one is given.
pub fn rewrite_script(
    script: &DeviceScript,
    source: &ServerIdentity,
    destination: &ServerIdentity,
    replacement_directory: Option<&str>,
) -> DeviceScript {
    if !script.server.eq_ignore_ascii_case(&source.domain_qualified_name) {
        debug!(
            device = %script.device_name,
            scripted_for = %script.server,
            expected = %source.domain_qualified_name,
            "Script server differs from source identity; retargeting anyway"
        );
    }
    let mut out = script.clone();
    out.server = destination.domain_qualified_name.clone();
    if let Some(dir) = replacement_directory {
        out.directory = dir.to_string();
    }
    out
}

/// SQL that removes a backup device from the server catalog (the file is left alone).
pub fn drop_device_sql(device_name: &str) -> String {
    format!(
        "EXEC master.dbo.sp_dropdevice @logicalname = N'{}'\n",
        quote_literal(device_name)
    )
}

/// Escape a value for use inside an N'...' literal.
pub(crate) fn quote_literal(s: &str) -> String {
    s.replace('\'', "''")
}

/// Escape a value for use inside [...] brackets.
fn quote_ident(s: &str) -> String {
    s.replace(']', "]]")
}
