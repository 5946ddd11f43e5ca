use backup_device_copy::cli::{Args, DESTINATION_PASSWORD_ENV, SOURCE_PASSWORD_ENV};
use backup_device_copy::config::types::{Config, LogLevel};
use clap::Parser;
use serial_test::serial;
use std::path::PathBuf;

fn parse(extra: &[&str]) -> Args {
    let mut argv = vec!["backup_device_copy", "--source", "SQL01", "--destination", r"SQL02\PROD"];
    argv.extend_from_slice(extra);
    Args::parse_from(argv)
}

#[test]
fn source_and_destination_are_required() {
    assert!(Args::try_parse_from(["backup_device_copy", "--source", "a"]).is_err());
    assert!(Args::try_parse_from(["backup_device_copy", "--destination", "b"]).is_err());
    let args = parse(&[]);
    assert_eq!(args.source.as_deref(), Some("SQL01"));
    assert_eq!(args.destination.as_deref(), Some(r"SQL02\PROD"));
}

#[test]
fn print_config_needs_no_servers() {
    let args = Args::try_parse_from(["backup_device_copy", "--print-config"]).unwrap();
    assert!(args.print_config);
    assert!(args.source.is_none());
}

#[test]
fn devices_are_repeatable_and_comma_separated() {
    let args = parse(&["--device", "backup01,backup02", "--device", "backup03"]);
    assert_eq!(args.devices, vec!["backup01", "backup02", "backup03"]);
}

#[test]
fn whatif_is_an_alias_for_dry_run() {
    assert!(parse(&["--whatif"]).dry_run);
    assert!(parse(&["--dry-run"]).dry_run);
    assert!(!parse(&[]).dry_run);
}

#[test]
fn effective_log_level_precedence() {
    assert_eq!(parse(&["--debug", "--log-level", "quiet"]).effective_log_level(), Some(LogLevel::Debug));
    assert_eq!(parse(&["--quiet", "--log-level", "info"]).effective_log_level(), Some(LogLevel::Quiet));
    assert_eq!(parse(&["--log-level", "info"]).effective_log_level(), Some(LogLevel::Info));
    assert_eq!(parse(&["--log-level", "bogus"]).effective_log_level(), None);
    assert!(Args::try_parse_from([
        "backup_device_copy", "--source", "a", "--destination", "b", "--quiet", "--debug"
    ])
    .is_err());
}

#[test]
fn apply_overrides_sets_config() {
    let args = parse(&["--sqlcmd", "/opt/mssql-tools18/bin/sqlcmd", "--rollback-on-copy-failure", "-q"]);
    let mut cfg = Config::default();
    args.apply_overrides(&mut cfg);
    assert_eq!(cfg.sqlcmd_path, PathBuf::from("/opt/mssql-tools18/bin/sqlcmd"));
    assert!(cfg.rollback_on_copy_failure);
    assert_eq!(cfg.log_level, LogLevel::Quiet);
}

#[test]
fn apply_overrides_leaves_unset_values_alone() {
    let args = parse(&[]);
    let mut cfg = Config {
        login_timeout_secs: 60,
        rollback_on_copy_failure: true,
        log_level: LogLevel::Info,
        ..Config::default()
    };
    args.apply_overrides(&mut cfg);
    assert_eq!(cfg.login_timeout_secs, 60);
    assert!(cfg.rollback_on_copy_failure);
    assert_eq!(cfg.log_level, LogLevel::Info);
}

#[test]
#[serial(env)]
fn credentials_read_passwords_from_env() {
    unsafe {
        std::env::set_var(SOURCE_PASSWORD_ENV, "s3cret");
        std::env::remove_var(DESTINATION_PASSWORD_ENV);
    }
    let args = parse(&["--source-user", "migrator", "--destination-user", "sa"]);
    let src = args.source_credential().unwrap();
    let dst = args.destination_credential().unwrap();
    unsafe { std::env::remove_var(SOURCE_PASSWORD_ENV) };

    assert_eq!(src.user, "migrator");
    assert_eq!(src.password, "s3cret");
    assert_eq!(dst.user, "sa");
    assert_eq!(dst.password, "");
}

#[test]
fn no_user_means_integrated_auth() {
    let args = parse(&[]);
    assert!(args.source_credential().is_none());
    assert!(args.destination_credential().is_none());
}
