//! File-backed persistence of services and backups

use service_manager::models::{BackupStatus, Service};
use service_manager::store::{BackupRepository, JsonStore, ServiceRepository, StoreError};
use test_utils::{postgres_service, service_on_port, TestContext};

#[test]
fn test_records_survive_reopen() {
    let ctx = TestContext::new();
    let store = ctx.store();
    let saved = store.insert_service(Service::new(postgres_service("orders"))).unwrap();
    let mut backup = store.create_backup(saved.id().unwrap()).unwrap();
    backup.mark_failed("disk full");
    store.update_backup(&backup).unwrap();

    let reopened = ctx.reopen_store();

    let service = reopened.get_service(saved.id().unwrap()).unwrap();
    assert_eq!(service.environment_variables, saved.environment_variables);
    assert_eq!(service.port, saved.port);
    // The strategy cache is rebuilt on demand
    assert!(service.connection_string().unwrap().starts_with("postgres://app:"));

    let backups = reopened.backups_for(saved.id().unwrap());
    assert_eq!(backups.len(), 1);
    assert_eq!(backups[0].status, BackupStatus::Failed);
    assert_eq!(backups[0].error.as_deref(), Some("disk full"));
}

#[test]
fn test_update_cannot_steal_a_port() {
    let store = JsonStore::in_memory();
    store
        .insert_service(Service::new(service_on_port("a", "redis", 7000)))
        .unwrap();
    let mut b = store
        .insert_service(Service::new(service_on_port("b", "redis", 7001)))
        .unwrap();

    b.port = Some(7000);

    assert!(matches!(
        store.update_service(&b),
        Err(StoreError::PortConflict(7000))
    ));
}
