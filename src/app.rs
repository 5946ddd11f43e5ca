//! Application entry: config, logging, signal handling, connections, and the
//! migration run itself.

use anyhow::{Context, Result};
use std::sync::{Arc, Mutex};
use tracing::{debug, error, info};

use backup_device_copy::cli::Args;
use backup_device_copy::config::{load_or_init, LoadResult, CONFIG_ENV};
use backup_device_copy::fs_ops::AdminShareTransfer;
use backup_device_copy::migrate::{Orchestrator, PromptConfirm};
use backup_device_copy::output as out;
use backup_device_copy::server::{connect_both, Connector, ServerHandle, SqlcmdConnector};
use backup_device_copy::{
    default_config_path, shutdown, Config, FinalState, LogLevel, MigrateError, MigrationSpec,
    RunSummary,
};

use crate::logging::init_tracing;

/// Run the CLI application. Per-device failures do not make this fail; an
/// interrupted run does.
pub fn run(args: Args) -> Result<()> {
    if args.print_config {
        print_config_location();
        return Ok(());
    }

    let mut cfg = Config::default();
    match load_or_init() {
        Ok(LoadResult::Loaded { config, path }) => {
            cfg = config;
            debug!(path = %path.display(), "Loaded config");
        }
        Ok(LoadResult::CreatedTemplate(path)) => {
            out::print_success(&format!(
                "A template backup_device_copy config was written to: {}",
                path.display()
            ));
            out::print_info("Continuing with default settings. Edit the file to change sqlcmd_path, login_timeout_seconds, log_level or log_file.");
        }
        Ok(LoadResult::Defaults) => {}
        Err(e) => return Err(fatal_before_logging(e)),
    }

    if let Some(raw) = args.log_level.as_deref()
        && LogLevel::parse(raw).is_none()
    {
        out::print_warn(&format!("Ignoring unknown --log-level '{raw}'"));
    }
    args.apply_overrides(&mut cfg);
    if let Err(e) = cfg.validate() {
        return Err(fatal_before_logging(e));
    }

    let guard_opt = init_tracing(&cfg.log_level, cfg.log_file.as_deref(), args.json).map_err(|e| {
        out::print_error(&format!("Failed to initialize logging: {e}"));
        e
    })?;

    // Dropped on Ctrl-C so the file log is flushed even if the process is killed afterwards.
    let guard_slot = Arc::new(Mutex::new(guard_opt));
    {
        let guard_slot = Arc::clone(&guard_slot);
        ctrlc::set_handler(move || {
            shutdown::request();
            out::print_warn("Received interrupt; finishing the current device, then stopping...");
            if let Ok(mut g) = guard_slot.lock() {
                let _ = g.take();
            }
        })
        .context("failed to install signal handler")?;
    }

    debug!(?args, "Starting backup_device_copy");
    let connector = SqlcmdConnector::new(cfg.sqlcmd_path.clone(), cfg.login_timeout_secs);
    let result = migrate(&args, &cfg, &connector).and_then(|summary| {
        report(&summary, args.dry_run);
        if summary.interrupted {
            Err(fatal(MigrateError::Interrupted))
        } else {
            Ok(())
        }
    });

    if let Ok(mut g) = guard_slot.lock() {
        let _ = g.take();
    }
    result
}

fn print_config_location() {
    if let Ok(cfg_env) = std::env::var(CONFIG_ENV) {
        out::print_info(&format!("Using {CONFIG_ENV} (explicit):\n  {cfg_env}\n"));
        out::print_info(&format!("To override, unset {CONFIG_ENV} or set it to another file."));
        return;
    }
    match default_config_path() {
        Ok(p) => {
            out::print_info(&format!("Default backup_device_copy config path:\n  {}\n", p.display()));
            if p.exists() {
                out::print_info("A config file already exists at that location.");
            } else {
                out::print_info("No config file exists there yet. Run once to create a template.");
            }
        }
        Err(e) => out::print_error(&format!("Could not determine a default config path: {e}")),
    }
}

fn fatal_before_logging(e: MigrateError) -> anyhow::Error {
    out::print_error(&e.to_string());
    e.into()
}

fn fatal(e: MigrateError) -> anyhow::Error {
    error!(code = e.code(), error = %e, "Run aborted");
    e.into()
}

/// Connect both servers and run the orchestrator.
fn migrate<C: Connector>(args: &Args, cfg: &Config, connector: &C) -> Result<RunSummary> {
    let source_name = args
        .source
        .as_deref()
        .ok_or_else(|| fatal(MigrateError::Config("--source is required".into())))?;
    let destination_name = args
        .destination
        .as_deref()
        .ok_or_else(|| fatal(MigrateError::Config("--destination is required".into())))?;

    let source_credential = args.source_credential();
    let destination_credential = args.destination_credential();
    let (mut source, mut destination) = connect_both(
        connector,
        (source_name, source_credential.as_ref()),
        (destination_name, destination_credential.as_ref()),
    )
    .map_err(fatal)?;

    let spec = MigrationSpec::new(
        source.identity().clone(),
        destination.identity().clone(),
        &args.devices,
        args.force,
        args.dry_run,
    );
    let transfer = AdminShareTransfer::default();
    let mut prompt = PromptConfirm::stdio();

    let summary = {
        let mut orchestrator = Orchestrator::new(&spec, &source, &mut destination, &transfer)
            .rollback_on_copy_failure(cfg.rollback_on_copy_failure);
        if args.confirm {
            orchestrator = orchestrator.with_confirm(&mut prompt);
        }
        orchestrator.run()
    };

    source.disconnect();
    destination.disconnect();
    Ok(summary)
}

fn report(summary: &RunSummary, dry_run: bool) {
    for outcome in &summary.outcomes {
        out::print_outcome(outcome);
    }
    if dry_run {
        out::print_info("Dry run: no changes were made to either server.");
    }

    let line = summary.status_line();
    info!(
        processed = summary.outcomes.len(),
        copied = summary.count(FinalState::Copied),
        failed = summary.count(FinalState::Failed),
        interrupted = summary.interrupted,
        "{line}"
    );
    if summary.interrupted || summary.count(FinalState::Failed) > 0 {
        out::print_warn(&line);
    } else {
        out::print_success(&line);
    }
}
