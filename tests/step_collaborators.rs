mod common;

use backup_device_copy::migrate::{register, resolve_destination, DeviceScript, DeviceType, PathKind};
use backup_device_copy::{connect_both, ServerHandle};
use common::{FakeConnector, FakeServer};

fn script() -> DeviceScript {
    DeviceScript::new(r"SQL02\PROD", "backup01", DeviceType::Disk, r"C:\Backups\backup01.bak")
}

#[test]
fn existing_directory_is_used_directly() {
    let dst = FakeServer::new("SQL02").dir(r"C:\Backups");
    let r = resolve_destination(&dst, r"C:\Backups");
    assert_eq!(r.kind, PathKind::Direct);
    assert_eq!(r.directory, r"C:\Backups");
    assert_eq!(r.replacement_directory(), None);
}

#[test]
fn missing_directory_falls_back_to_default() {
    let dst = FakeServer::new("SQL02");
    let r = resolve_destination(&dst, r"C:\Backups");
    assert_eq!(r.kind, PathKind::Fallback);
    assert_eq!(r.replacement_directory(), Some(r"D:\MSSQL\Backup"));
}

#[test]
fn probe_error_counts_as_missing() {
    let dst = FakeServer::new("SQL02").dir(r"C:\Backups").fail_probe();
    assert_eq!(resolve_destination(&dst, r"C:\Backups").kind, PathKind::Fallback);
}

#[test]
fn empty_candidate_falls_back() {
    let dst = FakeServer::new("SQL02").dir("");
    assert_eq!(resolve_destination(&dst, "").kind, PathKind::Fallback);
}

#[test]
fn registers_and_refreshes() {
    let mut dst = FakeServer::new("SQL02");
    register(&mut dst, &script()).unwrap();
    assert!(dst.devices().contains("backup01"));
    assert_eq!(dst.refreshes, 1);
}

#[test]
fn refresh_failure_after_create_is_not_an_error() {
    let mut dst = FakeServer::new("SQL02").fail_refresh();
    register(&mut dst, &script()).unwrap();
    // Created, but the snapshot is stale until the next refresh.
    assert!(!dst.devices().contains("backup01"));
    assert!(dst.live_device("backup01").is_some());
}

#[test]
fn execute_failure_is_a_registration_error() {
    let mut dst = FakeServer::new("SQL02").fail_execute("sp_addumpdevice", "Msg 15061");
    let err = register(&mut dst, &script()).unwrap_err();
    assert_eq!(err.code(), "registration_error");
    assert!(err.to_string().contains("backup01"));
    assert!(err.to_string().contains("15061"));
}

#[test]
fn connect_both_returns_both_handles() {
    let connector = FakeConnector::reaching(&["SQL01", "SQL02"]);
    let (src, dst) = connect_both(&connector, ("SQL01", None), ("SQL02", None)).unwrap();
    assert_eq!(src.identity().net_bios_host, "SQL01");
    assert_eq!(dst.identity().net_bios_host, "SQL02");
    assert_eq!(connector.disconnects.get(), 0);
}

#[test]
fn unreachable_destination_disconnects_source() {
    let connector = FakeConnector::reaching(&["SQL01"]);
    let err = connect_both(&connector, ("SQL01", None), ("SQL02", None))
        .err()
        .expect("connection should fail");
    assert_eq!(err.code(), "connection_error");
    assert!(err.to_string().contains("SQL02"));
    assert_eq!(connector.disconnects.get(), 1);
}

#[test]
fn unreachable_source_connects_nothing_else() {
    let connector = FakeConnector::reaching(&["SQL02"]);
    let err = connect_both(&connector, ("SQL01", None), ("SQL02", None))
        .err()
        .expect("connection should fail");
    assert!(err.to_string().contains("SQL01"));
    assert_eq!(connector.disconnects.get(), 0);
}
