//! Name conflicts between a source device and the destination catalog.

use crate::model::DeviceCatalog;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictDecision {
    /// Not present at the destination.
    Proceed,
    /// Present and not forced: leave the destination untouched.
    SkipExists,
    /// Present and forced: drop the destination device first.
    DropThenProceed,
}

pub fn resolve_conflict(device_name: &str, destination: &DeviceCatalog, force: bool) -> ConflictDecision {
    match (destination.contains(device_name), force) {
        (false, _) => ConflictDecision::Proceed,
        (true, false) => ConflictDecision::SkipExists,
        (true, true) => ConflictDecision::DropThenProceed,
    }
}
