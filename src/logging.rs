//! Tracing initialization.
//! Builds a subscriber with EnvFilter, compact or JSON output, and optional file logging.
//!
//! - Verbosity comes from LogLevel only (no RUST_LOG override).
//! - File logging goes through tracing_appender::non_blocking and is refused
//!   when any ancestor of the log path is a symlink.

use anyhow::Result;
use backup_device_copy::output as out;
use backup_device_copy::platform::open_log_file_secure_append;
use backup_device_copy::{default_log_path, path_has_symlink_ancestor, LogLevel};
use chrono::Local;
use std::fmt as stdfmt;
use std::path::Path;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt as tsfmt;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::layer::{Layered, SubscriberExt};
use tracing_subscriber::registry;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{Layer, Registry};

type Filtered = Layered<EnvFilter, Registry>;
type BoxedLayer = Box<dyn Layer<Filtered> + Send + Sync>;

/// DD/MM/YY HH:MM:SS in local time.
struct LocalHumanTime;
impl FormatTime for LocalHumanTime {
    fn format_time(&self, w: &mut tsfmt::format::Writer<'_>) -> stdfmt::Result {
        write!(w, "{}", Local::now().format("%d/%m/%y %H:%M:%S"))
    }
}

/// Quiet keeps warnings and errors; each step up adds one level.
fn level_directive(lvl: &LogLevel) -> &'static str {
    match lvl {
        LogLevel::Quiet => "warn",
        LogLevel::Normal => "info",
        LogLevel::Info => "debug",
        LogLevel::Debug => "trace",
    }
}

fn console_layer(json: bool) -> BoxedLayer {
    if json {
        tsfmt::layer()
            .event_format(tsfmt::format().json())
            .with_timer(LocalHumanTime)
            .with_target(true)
            .boxed()
    } else {
        tsfmt::layer()
            .with_timer(LocalHumanTime)
            .with_target(false)
            .compact()
            .boxed()
    }
}

fn file_layer(json: bool, writer: NonBlocking) -> BoxedLayer {
    if json {
        tsfmt::layer()
            .event_format(tsfmt::format().json())
            .with_timer(LocalHumanTime)
            .with_target(true)
            .with_writer(writer)
            .boxed()
    } else {
        tsfmt::layer()
            .with_timer(LocalHumanTime)
            .with_target(true)
            .with_ansi(false)
            .compact()
            .with_writer(writer)
            .boxed()
    }
}

/// Open a non-blocking file writer, or explain on stderr why not.
fn open_non_blocking_writer(path: &Path) -> Option<(NonBlocking, WorkerGuard)> {
    match path_has_symlink_ancestor(path) {
        Ok(true) => {
            eprintln!(
                "Refusing to enable file logging: ancestor of {} is a symlink; proceeding without file logging.",
                path.display()
            );
            return None;
        }
        Err(e) => {
            eprintln!(
                "Error checking log path {} for symlinks: {}; proceeding without file logging.",
                path.display(),
                e
            );
            return None;
        }
        Ok(false) => {}
    }

    match open_log_file_secure_append(path) {
        Ok(file) => Some(tracing_appender::non_blocking(file)),
        Err(e) => {
            eprintln!("Failed to open log file {}: {}", path.display(), e);
            None
        }
    }
}

fn warn_file_logging_disabled(path: &Path) {
    out::print_warn(&format!(
        "Requested file logging to '{}' was not enabled. Check that the parent directory is writable and that no ancestor is a symlink. Logs will continue to stdout.",
        path.display()
    ));
    if let Ok(def) = default_log_path()
        && def != path
    {
        out::print_info(&format!("You can try the default log path instead: {}", def.display()));
    }
}

/// Install the global subscriber. Returns the file writer's guard, which must
/// be held (and dropped on exit or Ctrl-C) to flush the log file.
pub fn init_tracing(
    lvl: &LogLevel,
    log_file: Option<&Path>,
    json: bool,
) -> Result<Option<WorkerGuard>> {
    let mut guard = None;
    let mut layers = console_layer(json);

    if let Some(path) = log_file {
        match open_non_blocking_writer(path) {
            Some((writer, g)) => {
                layers = layers.and_then(file_layer(json, writer)).boxed();
                guard = Some(g);
            }
            None => warn_file_logging_disabled(path),
        }
    }

    registry()
        .with(EnvFilter::new(level_directive(lvl)))
        .with(layers)
        .try_init()?;
    Ok(guard)
}
