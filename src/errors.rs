//! Typed error definitions for backup_device_copy.
//! Provides the well-known failure modes of a migration run for better logs and tests.
//!
//! `Connection` and `Config` abort the run before any device is processed and
//! `Interrupted` ends it early. The per-step variants are isolated to one device.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MigrateError {
    #[error("Failed to connect to {server}: {reason}")]
    Connection { server: String, reason: String },

    #[error("Query against {server} failed: {reason}")]
    Query { server: String, reason: String },

    #[error("Failed to script backup device {device}: {reason}")]
    Scripting { device: String, reason: String },

    #[error("Failed to drop backup device {device} at destination: {reason}")]
    Drop { device: String, reason: String },

    #[error("Failed to register backup device {device} at destination: {reason}")]
    Registration { device: String, reason: String },

    #[error("Failed to copy backup file {source_path} -> {dest_path}: {reason}")]
    Copy {
        source_path: String,
        dest_path: String,
        reason: String,
    },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Operation interrupted by user")]
    Interrupted,
}

impl MigrateError {
    /// Stable short code for structured logs.
    pub fn code(&self) -> &'static str {
        match self {
            MigrateError::Connection { .. } => "connection_error",
            MigrateError::Query { .. } => "query_error",
            MigrateError::Scripting { .. } => "scripting_error",
            MigrateError::Drop { .. } => "drop_error",
            MigrateError::Registration { .. } => "registration_error",
            MigrateError::Copy { .. } => "copy_error",
            MigrateError::Config(_) => "config_error",
            MigrateError::Interrupted => "interrupted",
        }
    }
}

/// Render an error chain on one line ("outer: inner: root").
pub(crate) fn chain_message(e: &anyhow::Error) -> String {
    format!("{e:#}")
}
