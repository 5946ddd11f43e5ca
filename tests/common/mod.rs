//! Shared in-memory doubles for integration tests.
#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::rc::Rc;

use anyhow::{anyhow, bail, Result};
use backup_device_copy::migrate::{DeviceScript, DeviceType};
use backup_device_copy::model::names_match;
use backup_device_copy::{
    BackupDevice, Connector, Credential, DeviceCatalog, FileTransfer, MigrateError, MigrationSpec,
    ServerHandle, ServerIdentity,
};

/// A server whose catalog snapshot only changes on refresh, like the real
/// one. `sp_addumpdevice` / `sp_dropdevice` apply to the live list and every
/// executed batch is recorded.
pub struct FakeServer {
    identity: ServerIdentity,
    live: Vec<BackupDevice>,
    snapshot: DeviceCatalog,
    default_dir: String,
    existing_dirs: HashSet<String>,
    fail_execute: Option<(String, String)>,
    fail_refresh: bool,
    fail_probe: bool,
    fail_script: HashSet<String>,
    disconnects: Rc<Cell<usize>>,
    pub executed: Vec<String>,
    pub refreshes: usize,
}

impl FakeServer {
    pub fn new(host: &str) -> Self {
        Self {
            identity: ServerIdentity::new(format!(r"{host}\PROD"), host),
            live: Vec::new(),
            snapshot: DeviceCatalog::default(),
            default_dir: r"D:\MSSQL\Backup".to_string(),
            existing_dirs: HashSet::new(),
            fail_execute: None,
            fail_refresh: false,
            fail_probe: false,
            fail_script: HashSet::new(),
            disconnects: Rc::new(Cell::new(0)),
            executed: Vec::new(),
            refreshes: 0,
        }
    }

    /// Physical names under `\\.\` script as tape devices.
    pub fn device(mut self, name: &str, physical: &str) -> Self {
        self.live.push(BackupDevice::new(name, physical));
        self.snapshot = self.live.iter().cloned().collect();
        self
    }

    pub fn dir(mut self, dir: &str) -> Self {
        self.existing_dirs.insert(dir.to_string());
        self
    }

    pub fn default_dir(mut self, dir: &str) -> Self {
        self.default_dir = dir.to_string();
        self
    }

    /// Batches containing `needle` fail with `message`.
    pub fn fail_execute(mut self, needle: &str, message: &str) -> Self {
        self.fail_execute = Some((needle.to_string(), message.to_string()));
        self
    }

    pub fn fail_refresh(mut self) -> Self {
        self.fail_refresh = true;
        self
    }

    pub fn fail_probe(mut self) -> Self {
        self.fail_probe = true;
        self
    }

    pub fn fail_script(mut self, device: &str) -> Self {
        self.fail_script.insert(device.to_string());
        self
    }

    fn count_disconnects_in(mut self, counter: Rc<Cell<usize>>) -> Self {
        self.disconnects = counter;
        self
    }

    pub fn drops(&self) -> Vec<&String> {
        self.executed.iter().filter(|s| s.contains("sp_dropdevice")).collect()
    }

    pub fn creates(&self) -> Vec<&String> {
        self.executed.iter().filter(|s| s.contains("sp_addumpdevice")).collect()
    }

    pub fn live_device(&self, name: &str) -> Option<&BackupDevice> {
        self.live.iter().find(|d| names_match(&d.name, name))
    }

    pub fn disconnects(&self) -> usize {
        self.disconnects.get()
    }
}

fn literal_after<'a>(sql: &'a str, marker: &str) -> Result<&'a str> {
    let start = sql.find(marker).ok_or_else(|| anyhow!("missing {marker}"))? + marker.len();
    let len = sql[start..].find('\'').ok_or_else(|| anyhow!("unterminated literal"))?;
    Ok(&sql[start..start + len])
}

impl ServerHandle for FakeServer {
    fn identity(&self) -> &ServerIdentity {
        &self.identity
    }

    fn devices(&self) -> &DeviceCatalog {
        &self.snapshot
    }

    fn default_backup_directory(&self) -> &str {
        &self.default_dir
    }

    fn script_device(&self, device: &BackupDevice) -> Result<DeviceScript> {
        if self.fail_script.contains(&device.name) {
            bail!("scripting refused");
        }
        let device_type = if device.physical_location.starts_with(r"\\.\") {
            DeviceType::Tape
        } else {
            DeviceType::Disk
        };
        Ok(DeviceScript::new(
            self.identity.domain_qualified_name.clone(),
            device.name.clone(),
            device_type,
            &device.physical_location,
        ))
    }

    fn execute_non_query(&mut self, sql: &str) -> Result<()> {
        self.executed.push(sql.to_string());
        if let Some((needle, message)) = &self.fail_execute
            && sql.contains(needle.as_str())
        {
            bail!("{message}");
        }
        let name = literal_after(sql, "@logicalname = N'")?.to_string();
        if sql.contains("sp_dropdevice") {
            self.live.retain(|d| !names_match(&d.name, &name));
            return Ok(());
        }
        let physical = literal_after(sql, "@physicalname = N'")?.to_string();
        self.live.push(BackupDevice::new(name, physical));
        Ok(())
    }

    fn refresh_device_catalog(&mut self) -> Result<()> {
        self.refreshes += 1;
        if self.fail_refresh {
            bail!("refresh failed");
        }
        self.snapshot = self.live.iter().cloned().collect();
        Ok(())
    }

    fn path_exists(&self, path: &str) -> Result<bool> {
        if self.fail_probe {
            bail!("xp_fileexist denied");
        }
        Ok(self.existing_dirs.contains(path))
    }

    fn disconnect(&mut self) {
        self.disconnects.set(self.disconnects.get() + 1);
    }
}

/// Hands out empty `FakeServer`s for known hosts and counts disconnects
/// across every handle it created.
pub struct FakeConnector {
    reachable: Vec<String>,
    pub disconnects: Rc<Cell<usize>>,
}

impl FakeConnector {
    pub fn reaching(hosts: &[&str]) -> Self {
        Self {
            reachable: hosts.iter().map(|h| h.to_string()).collect(),
            disconnects: Rc::new(Cell::new(0)),
        }
    }
}

impl Connector for FakeConnector {
    type Handle = FakeServer;

    fn connect(
        &self,
        server: &str,
        _credential: Option<&Credential>,
    ) -> std::result::Result<FakeServer, MigrateError> {
        if self.reachable.iter().any(|h| h == server) {
            Ok(FakeServer::new(server).count_disconnects_in(Rc::clone(&self.disconnects)))
        } else {
            Err(MigrateError::Connection {
                server: server.to_string(),
                reason: "Login timeout expired".into(),
            })
        }
    }
}

/// Records every copy; never touches the filesystem.
#[derive(Default)]
pub struct RecordingTransfer {
    copies: RefCell<Vec<(String, String)>>,
    fail_on: Option<String>,
}

impl RecordingTransfer {
    /// Copies whose destination contains `needle` fail.
    pub fn failing_on(needle: &str) -> Self {
        Self {
            fail_on: Some(needle.to_string()),
            ..Default::default()
        }
    }

    pub fn copies(&self) -> Vec<(String, String)> {
        self.copies.borrow().clone()
    }
}

impl FileTransfer for RecordingTransfer {
    fn copy_file(&self, source: &str, destination: &str) -> Result<u64> {
        self.copies
            .borrow_mut()
            .push((source.to_string(), destination.to_string()));
        match &self.fail_on {
            Some(needle) if destination.contains(needle.as_str()) => {
                bail!("The network path was not found")
            }
            _ => Ok(1024),
        }
    }
}

/// Spec for a run between two fakes.
pub fn spec_for(
    source: &FakeServer,
    destination: &FakeServer,
    filter: &[&str],
    force: bool,
    simulate: bool,
) -> MigrationSpec {
    MigrationSpec::new(
        source.identity().clone(),
        destination.identity().clone(),
        filter.iter().copied(),
        force,
        simulate,
    )
}
