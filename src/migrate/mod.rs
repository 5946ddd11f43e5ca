//! Migration steps and the orchestrator that sequences them per device.

pub mod confirm;
pub mod conflict;
pub mod orchestrator;
pub mod path;
pub mod registrar;
pub mod script;

pub use confirm::{AutoConfirm, Confirm, PromptConfirm};
pub use conflict::{resolve_conflict, ConflictDecision};
pub use orchestrator::{ExecutionMode, Orchestrator};
pub use path::{resolve_destination, PathKind, PathResolution};
pub use registrar::register;
pub use script::{drop_device_sql, rewrite_script, DeviceScript, DeviceType};
