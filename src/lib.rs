//! Core library for `backup_device_copy`.
//!
//! Copies SQL Server backup devices, and the backup files behind them, from a
//! source server to a destination server. The binary wires the pieces up;
//! everything here is usable (and tested) without a real server.
//!
//! Layout:
//! - `model`: devices, catalogs, run spec and per-device outcomes
//! - `server`: the `ServerHandle` trait and the sqlcmd backend
//! - `migrate`: conflict, script, path, registration and the orchestrator
//! - `fs_ops`: administrative paths and backup file transfer
//! - `config`, `cli`, `output`, `platform`, `shutdown`: ambient plumbing

pub mod cli;
pub mod config;
pub mod errors;
pub mod fs_ops;
pub mod migrate;
pub mod model;
pub mod output;
pub mod platform;
pub mod server;
pub mod shutdown;

pub use config::{default_config_path, default_log_path, path_has_symlink_ancestor, Config, LogLevel};
pub use errors::MigrateError;
pub use fs_ops::{admin_path, AdminShareTransfer, FileTransfer};
pub use migrate::{ExecutionMode, Orchestrator};
pub use model::{
    BackupDevice, DeviceCatalog, DeviceOutcome, DeviceState, FinalState, MigrationSpec,
    RunSummary, ServerIdentity,
};
pub use server::{connect_both, Connector, Credential, ServerHandle};
