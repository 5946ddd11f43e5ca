//! Per-device migration sequence.
//!
//! Devices are processed one at a time in source order:
//! conflict check, optional drop, scripting, directory resolution,
//! registration, file copy. A failing step fails only its device; the run
//! always continues with the next one and ends with a `RunSummary`.

use tracing::{debug, error, info, warn};

use crate::errors::{chain_message, MigrateError};
use crate::fs_ops::{admin_path, same_location, FileTransfer};
use crate::migrate::confirm::{AutoConfirm, Confirm};
use crate::migrate::conflict::{resolve_conflict, ConflictDecision};
use crate::migrate::path::{resolve_destination, PathKind};
use crate::migrate::registrar::register;
use crate::migrate::script::{drop_device_sql, rewrite_script, DeviceType};
use crate::model::{
    BackupDevice, DeviceOutcome, DeviceState, FinalState, MigrationSpec, RunSummary,
};
use crate::server::ServerHandle;
use crate::shutdown;

/// Whether mutating steps touch the destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    Live,
    /// Mutating steps are logged and skipped but still advance the state.
    Simulate,
}

impl ExecutionMode {
    pub fn from_simulate(simulate: bool) -> Self {
        if simulate {
            ExecutionMode::Simulate
        } else {
            ExecutionMode::Live
        }
    }
}

/// Result of passing a mutating step through the execution gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Gate {
    Run,
    Simulated,
    Declined,
}

pub struct Orchestrator<'a> {
    spec: &'a MigrationSpec,
    source: &'a dyn ServerHandle,
    destination: &'a mut dyn ServerHandle,
    transfer: &'a dyn FileTransfer,
    confirm: Option<&'a mut dyn Confirm>,
    mode: ExecutionMode,
    rollback_on_copy_failure: bool,
}

/// Per-device progress.
struct Progress {
    outcome: DeviceOutcome,
}

impl Progress {
    fn new(device_name: &str) -> Self {
        Self {
            outcome: DeviceOutcome {
                device_name: device_name.to_string(),
                final_state: FinalState::Skipped,
                error_detail: None,
                trace: vec![DeviceState::Discovered],
            },
        }
    }

    fn enter(&mut self, state: DeviceState) {
        debug!(device = %self.outcome.device_name, state = %state, "Device state");
        self.outcome.trace.push(state);
    }

    /// End the device before registration; anything already dropped stays dropped.
    fn stop_early(mut self, dropped: bool) -> DeviceOutcome {
        self.enter(DeviceState::Skipped);
        self.finish(if dropped { FinalState::Dropped } else { FinalState::Skipped })
    }

    fn finish(mut self, state: FinalState) -> DeviceOutcome {
        self.outcome.final_state = state;
        self.outcome
    }

    fn fail(mut self, err: MigrateError) -> DeviceOutcome {
        error!(
            device = %self.outcome.device_name,
            code = err.code(),
            error = %err,
            "Backup device migration failed"
        );
        self.enter(DeviceState::Failed);
        self.outcome.final_state = FinalState::Failed;
        self.outcome.error_detail = Some(err.to_string());
        self.outcome
    }
}

impl<'a> Orchestrator<'a> {
    pub fn new(
        spec: &'a MigrationSpec,
        source: &'a dyn ServerHandle,
        destination: &'a mut dyn ServerHandle,
        transfer: &'a dyn FileTransfer,
    ) -> Self {
        Self {
            spec,
            source,
            destination,
            transfer,
            confirm: None,
            mode: ExecutionMode::from_simulate(spec.simulate),
            rollback_on_copy_failure: false,
        }
    }

    /// Ask before each mutating step. Ignored in simulation.
    pub fn with_confirm(mut self, confirm: &'a mut dyn Confirm) -> Self {
        self.confirm = Some(confirm);
        self
    }

    /// Drop a just-created destination device when its file copy fails.
    pub fn rollback_on_copy_failure(mut self, enabled: bool) -> Self {
        self.rollback_on_copy_failure = enabled;
        self
    }

    pub fn run(&mut self) -> RunSummary {
        let source = self.source;
        let mut summary = RunSummary::default();

        info!(
            source = %source.identity(),
            destination = %self.destination.identity(),
            devices = source.devices().len(),
            mode = ?self.mode,
            "Starting backup device copy"
        );
        if source.devices().is_empty() {
            info!(source = %source.identity(), "No backup devices found on source");
        }
        self.warn_unknown_filter_names();

        for device in source.devices().iter() {
            if !self.spec.includes(&device.name) {
                continue;
            }
            if shutdown::is_requested() {
                warn!(device = %device.name, "Shutdown requested; stopping before next device");
                summary.interrupted = true;
                break;
            }
            let outcome = self.process_device(device);
            info!(
                device = %outcome.device_name,
                state = %outcome.final_state,
                "Backup device processed"
            );
            summary.outcomes.push(outcome);
        }
        summary
    }

    fn warn_unknown_filter_names(&self) {
        if !self.spec.has_filter() {
            return;
        }
        let matched = self
            .source
            .devices()
            .iter()
            .filter(|d| self.spec.includes(&d.name))
            .count();
        if matched == 0 {
            warn!(source = %self.source.identity(), "No source backup device matches the device filter");
        }
    }

    fn process_device(&mut self, device: &BackupDevice) -> DeviceOutcome {
        let source = self.source;
        let mut progress = Progress::new(&device.name);
        let dest_name = self.destination.identity().domain_qualified_name.clone();
        info!(device = %device.name, physical_location = %device.physical_location, "Processing backup device");

        // 1. Name conflict.
        let mut dropped = false;
        match resolve_conflict(&device.name, self.destination.devices(), self.spec.force) {
            ConflictDecision::Proceed => {}
            ConflictDecision::SkipExists => {
                warn!(
                    device = %device.name,
                    "backup device {} exists at destination. Use --force to drop and recreate it.",
                    device.name
                );
                progress.enter(DeviceState::Skipped);
                return progress.finish(FinalState::Skipped);
            }
            ConflictDecision::DropThenProceed => {
                match self.gate(&format!("Drop backup device {} on {}", device.name, dest_name)) {
                    Gate::Declined => {
                        progress.enter(DeviceState::Skipped);
                        return progress.finish(FinalState::Skipped);
                    }
                    Gate::Simulated => {}
                    Gate::Run => {
                        if let Err(e) = self.destination.execute_non_query(&drop_device_sql(&device.name)) {
                            return progress.fail(MigrateError::Drop {
                                device: device.name.clone(),
                                reason: chain_message(&e),
                            });
                        }
                        info!(device = %device.name, "Dropped existing backup device at destination");
                        if let Err(e) = self.destination.refresh_device_catalog() {
                            warn!(device = %device.name, error = %chain_message(&e), "Device catalog refresh failed after drop");
                        }
                    }
                }
                dropped = true;
                progress.enter(DeviceState::DroppedOk);
            }
        }

        // 2. Creation script from the source.
        let script = match source.script_device(device) {
            Ok(s) => s,
            Err(e) => {
                return progress.fail(MigrateError::Scripting {
                    device: device.name.clone(),
                    reason: chain_message(&e),
                });
            }
        };
        progress.enter(DeviceState::Scripted);
        if script.device_type != DeviceType::Disk {
            warn!(
                device = %device.name,
                device_type = %script.device_type,
                physical_location = %device.physical_location,
                "Only disk backup devices can be copied; skipping"
            );
            return progress.stop_early(dropped);
        }

        // 3. Destination directory.
        let resolution = resolve_destination(&*self.destination, device.directory());
        match resolution.kind {
            PathKind::Direct => progress.enter(DeviceState::DirectOk),
            PathKind::Fallback => {
                info!(
                    device = %device.name,
                    directory = %resolution.directory,
                    "Using destination default backup directory"
                );
                progress.enter(DeviceState::FallbackApplied);
            }
        }
        let script = rewrite_script(
            &script,
            source.identity(),
            self.destination.identity(),
            resolution.replacement_directory(),
        );

        // 4. Registration.
        match self.gate(&format!("Create backup device {} on {}", device.name, dest_name)) {
            Gate::Declined => return progress.stop_early(dropped),
            Gate::Simulated => {}
            Gate::Run => {
                if let Err(e) = register(&mut *self.destination, &script) {
                    return progress.fail(e);
                }
            }
        }
        progress.enter(DeviceState::Registered);

        // 5. Physical file.
        let src_path = admin_path(&source.identity().net_bios_host, &device.physical_location);
        let dst_path = admin_path(
            &self.destination.identity().net_bios_host,
            &script.physical_location(),
        );
        if same_location(&src_path, &dst_path) {
            info!(device = %device.name, path = %dst_path, "Backup file is already in place; nothing to copy");
            progress.enter(DeviceState::Copied);
            return progress.finish(FinalState::Copied);
        }
        match self.gate(&format!("Copy {src_path} to {dst_path}")) {
            Gate::Declined => return progress.finish(FinalState::Created),
            Gate::Simulated => {}
            Gate::Run => {
                if let Err(e) = self.transfer.copy_file(&src_path, &dst_path) {
                    let mut reason = chain_message(&e);
                    if self.rollback_on_copy_failure {
                        reason.push_str(&self.roll_back(&device.name));
                    }
                    return progress.fail(MigrateError::Copy {
                        source_path: src_path,
                        dest_path: dst_path,
                        reason,
                    });
                }
            }
        }
        progress.enter(DeviceState::Copied);
        progress.finish(FinalState::Copied)
    }

    /// Drop the device registered for a failed copy. Returns a note for the error detail.
    fn roll_back(&mut self, device_name: &str) -> String {
        match self.destination.execute_non_query(&drop_device_sql(device_name)) {
            Ok(()) => {
                if let Err(e) = self.destination.refresh_device_catalog() {
                    warn!(device = %device_name, error = %chain_message(&e), "Device catalog refresh failed after rollback");
                }
                info!(device = %device_name, "Rolled back backup device registration");
                "; registration rolled back".to_string()
            }
            Err(e) => {
                let msg = chain_message(&e);
                warn!(device = %device_name, error = %msg, "Rollback of backup device registration failed");
                format!("; rollback failed: {msg}")
            }
        }
    }

    /// Single decision point for every mutating step.
    fn gate(&mut self, action: &str) -> Gate {
        if self.mode == ExecutionMode::Simulate {
            info!("What if: {action}");
            return Gate::Simulated;
        }
        let approved = match self.confirm.as_deref_mut() {
            Some(c) => c.confirm(action),
            None => AutoConfirm.confirm(action),
        };
        if approved {
            Gate::Run
        } else {
            info!("Declined: {action}");
            Gate::Declined
        }
    }
}
