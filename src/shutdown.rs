//! Process-wide shutdown flag set by the ctrlc handler (SIGINT/SIGTERM).
//!
//! The orchestrator checks it before each device, so the device in progress
//! always finishes and the run stops cleanly in between.
//!
//! Relaxed atomics are sufficient for a one-way "stop" flag.
use std::sync::atomic::{AtomicBool, Ordering};

static SHUTDOWN: AtomicBool = AtomicBool::new(false);

/// Request a cooperative shutdown (idempotent).
#[inline]
pub fn request() {
    SHUTDOWN.store(true, Ordering::Relaxed);
}

#[inline]
pub fn is_requested() -> bool {
    SHUTDOWN.load(Ordering::Relaxed)
}

#[cfg(test)]
#[inline]
pub fn reset() {
    SHUTDOWN.store(false, Ordering::Relaxed);
}
