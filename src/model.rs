//! Data model shared by the migration steps.
//! - BackupDevice / DeviceCatalog: a server's device list, snapshotted per run.
//! - ServerIdentity: how a server is named in scripts and administrative paths.
//! - MigrationSpec: immutable run input.
//! - DeviceState / FinalState / DeviceOutcome / RunSummary: per-device results.

use std::collections::BTreeSet;
use std::fmt;

/// A named backup device bound to a physical backup file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupDevice {
    pub name: String,
    pub physical_location: String,
}

impl BackupDevice {
    pub fn new(name: impl Into<String>, physical_location: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            physical_location: physical_location.into(),
        }
    }

    /// Directory component of the physical location (empty when there is none).
    pub fn directory(&self) -> &str {
        split_location(&self.physical_location).0
    }
}

/// Split a server-local path on its last separator. Server paths are usually
/// Windows paths, so this does not go through `std::path`.
pub fn split_location(location: &str) -> (&str, &str) {
    match location.rfind(['\\', '/']) {
        Some(idx) => {
            let dir = &location[..idx];
            // Keep the separator for drive or filesystem roots ("C:\", "/").
            let dir = if dir.is_empty() || dir.ends_with(':') {
                &location[..=idx]
            } else {
                dir
            };
            (dir, &location[idx + 1..])
        }
        None => ("", location),
    }
}

/// Join a server-local directory and file name, keeping the directory's separator style.
pub fn join_location(directory: &str, file_name: &str) -> String {
    if directory.is_empty() {
        return file_name.to_string();
    }
    let sep = if directory.contains('\\') || !directory.contains('/') {
        '\\'
    } else {
        '/'
    };
    let trimmed = directory.trim_end_matches(['\\', '/']);
    format!("{trimmed}{sep}{file_name}")
}

/// Case-insensitive comparison used for every device name (catalog lookups,
/// the device filter, summaries). Folds full Unicode, not just ASCII.
pub fn names_match(a: &str, b: &str) -> bool {
    a == b || fold_name(a) == fold_name(b)
}

fn fold_name(name: &str) -> String {
    name.to_lowercase()
}

/// Device list of one server. Names are unique and compared with `names_match`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceCatalog {
    devices: Vec<BackupDevice>,
}

impl DeviceCatalog {
    pub fn new(devices: Vec<BackupDevice>) -> Self {
        Self { devices }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn get(&self, name: &str) -> Option<&BackupDevice> {
        self.devices.iter().find(|d| names_match(&d.name, name))
    }

    pub fn iter(&self) -> impl Iterator<Item = &BackupDevice> {
        self.devices.iter()
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}

impl FromIterator<BackupDevice> for DeviceCatalog {
    fn from_iter<I: IntoIterator<Item = BackupDevice>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Name a server is known by (`HOST\INSTANCE`) plus its NetBIOS host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerIdentity {
    pub domain_qualified_name: String,
    pub net_bios_host: String,
}

impl ServerIdentity {
    pub fn new(domain_qualified_name: impl Into<String>, net_bios_host: impl Into<String>) -> Self {
        Self {
            domain_qualified_name: domain_qualified_name.into(),
            net_bios_host: net_bios_host.into(),
        }
    }
}

impl fmt::Display for ServerIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.domain_qualified_name)
    }
}

/// Immutable description of one run.
#[derive(Debug, Clone)]
pub struct MigrationSpec {
    pub source: ServerIdentity,
    pub destination: ServerIdentity,
    /// Folded device names; empty means every device.
    device_filter: BTreeSet<String>,
    pub force: bool,
    pub simulate: bool,
}

impl MigrationSpec {
    pub fn new(
        source: ServerIdentity,
        destination: ServerIdentity,
        device_filter: impl IntoIterator<Item = impl AsRef<str>>,
        force: bool,
        simulate: bool,
    ) -> Self {
        let device_filter = device_filter
            .into_iter()
            .map(|n| fold_name(n.as_ref().trim()))
            .filter(|n| !n.is_empty())
            .collect();
        Self {
            source,
            destination,
            device_filter,
            force,
            simulate,
        }
    }

    /// True when the device should be processed at all.
    pub fn includes(&self, device_name: &str) -> bool {
        self.device_filter.is_empty() || self.device_filter.contains(&fold_name(device_name))
    }

    pub fn has_filter(&self) -> bool {
        !self.device_filter.is_empty()
    }
}

/// Intermediate and terminal states a device passes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceState {
    Discovered,
    Skipped,
    DroppedOk,
    Scripted,
    DirectOk,
    FallbackApplied,
    Registered,
    Copied,
    Failed,
}

impl DeviceState {
    pub fn as_str(self) -> &'static str {
        match self {
            DeviceState::Discovered => "discovered",
            DeviceState::Skipped => "skipped",
            DeviceState::DroppedOk => "dropped",
            DeviceState::Scripted => "scripted",
            DeviceState::DirectOk => "direct",
            DeviceState::FallbackApplied => "fallback",
            DeviceState::Registered => "registered",
            DeviceState::Copied => "copied",
            DeviceState::Failed => "failed",
        }
    }
}

impl fmt::Display for DeviceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reported end state of a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinalState {
    Skipped,
    Dropped,
    Created,
    Copied,
    Failed,
}

impl fmt::Display for FinalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FinalState::Skipped => "skipped",
            FinalState::Dropped => "dropped",
            FinalState::Created => "created",
            FinalState::Copied => "copied",
            FinalState::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Result of processing one device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceOutcome {
    pub device_name: String,
    pub final_state: FinalState,
    pub error_detail: Option<String>,
    /// Every state entered, in order, starting with `Discovered`.
    pub trace: Vec<DeviceState>,
}

/// Aggregated outcomes of one run, in source-enumeration order.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub outcomes: Vec<DeviceOutcome>,
    /// Set when a shutdown request stopped the run before all devices were processed.
    pub interrupted: bool,
}

impl RunSummary {
    pub fn count(&self, state: FinalState) -> usize {
        self.outcomes.iter().filter(|o| o.final_state == state).count()
    }

    pub fn outcome(&self, device_name: &str) -> Option<&DeviceOutcome> {
        self.outcomes
            .iter()
            .find(|o| names_match(&o.device_name, device_name))
    }

    /// One-line status used as the final message of a run.
    pub fn status_line(&self) -> String {
        let head = if self.interrupted {
            "Backup device copy interrupted"
        } else {
            "Backup device copy finished"
        };
        format!(
            "{head}: {} processed, {} copied, {} created, {} dropped, {} skipped, {} failed",
            self.outcomes.len(),
            self.count(FinalState::Copied),
            self.count(FinalState::Created),
            self.count(FinalState::Dropped),
            self.count(FinalState::Skipped),
            self.count(FinalState::Failed),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_windows_location() {
        assert_eq!(
            split_location(r"C:\Backups\backup01.bak"),
            (r"C:\Backups", "backup01.bak")
        );
        assert_eq!(split_location(r"C:\backup01.bak"), (r"C:\", "backup01.bak"));
        assert_eq!(split_location("backup01.bak"), ("", "backup01.bak"));
    }

    #[test]
    fn split_posix_location() {
        assert_eq!(
            split_location("/var/opt/mssql/backup/b.bak"),
            ("/var/opt/mssql/backup", "b.bak")
        );
        assert_eq!(split_location("/b.bak"), ("/", "b.bak"));
    }

    #[test]
    fn join_keeps_separator_style() {
        assert_eq!(join_location(r"D:\MSSQL\Backup", "x.bak"), r"D:\MSSQL\Backup\x.bak");
        assert_eq!(join_location(r"D:\MSSQL\Backup\", "x.bak"), r"D:\MSSQL\Backup\x.bak");
        assert_eq!(join_location("/var/backup", "x.bak"), "/var/backup/x.bak");
        assert_eq!(join_location("", "x.bak"), "x.bak");
    }

    #[test]
    fn catalog_lookup_ignores_case() {
        let cat: DeviceCatalog = vec![BackupDevice::new("Backup01", r"C:\b\1.bak")]
            .into_iter()
            .collect();
        assert!(cat.contains("backup01"));
        assert!(cat.contains("BACKUP01"));
        assert!(!cat.contains("backup02"));
    }

    #[test]
    fn catalog_and_filter_fold_non_ascii_names_alike() {
        let cat: DeviceCatalog = vec![BackupDevice::new("übackup", r"C:\b\u.bak")]
            .into_iter()
            .collect();
        assert!(cat.contains("Übackup"));

        let id = ServerIdentity::new("a", "a");
        let spec = MigrationSpec::new(id.clone(), id, ["ÜBACKUP"], false, false);
        assert!(spec.includes("übackup"));
        assert!(names_match("Übackup", "übackup"));
        assert!(!names_match("übackup", "ubackup"));
    }

    #[test]
    fn empty_filter_includes_everything() {
        let id = ServerIdentity::new("a", "a");
        let spec = MigrationSpec::new(id.clone(), id, Vec::<String>::new(), false, false);
        assert!(spec.includes("anything"));
        assert!(!spec.has_filter());
    }

    #[test]
    fn filter_matches_case_insensitively() {
        let id = ServerIdentity::new("a", "a");
        let spec = MigrationSpec::new(id.clone(), id, ["Backup02", " "], false, false);
        assert!(spec.includes("backup02"));
        assert!(!spec.includes("backup01"));
    }
}
