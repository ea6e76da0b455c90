//! Backup dispatch through the manager

use service_manager::managers::service::ServiceError;
use service_manager::models::BackupStatus;
use service_manager::store::BackupRepository;
use std::time::Duration;
use test_utils::{mysql_service, new_service, postgres_service, MockExecutor, MockResponse, TestContext};

#[tokio::test]
async fn test_inline_backup_completes_before_returning() {
    let ctx = TestContext::new();
    let manager = ctx.manager();
    let id = manager.create(postgres_service("orders")).unwrap().id().unwrap();

    let backup = manager.backup(id, true).await.unwrap();

    assert_eq!(backup.status, BackupStatus::Succeeded);
    let location = backup.location.unwrap();
    assert!(location.starts_with(&ctx.config().global.backup_directory));
    assert!(location.ends_with("appdb.sql.gz"));

    assert_eq!(ctx.executor().call_count(&ctx.script_path("postgres.sh")), 1);
    assert!(ctx.queue().pending().is_empty());
}

#[tokio::test]
async fn test_deferred_backup_returns_pending_record() {
    let ctx = TestContext::new();
    let manager = ctx.manager();
    let id = manager.create(mysql_service("shop")).unwrap().id().unwrap();

    let backup = manager.backup(id, false).await.unwrap();

    assert_eq!(backup.status, BackupStatus::Pending);
    assert_eq!(ctx.queue().pending(), vec![backup.id]);
    assert!(ctx.executor().get_calls().is_empty());
    assert_eq!(ctx.store().backups_for(id).len(), 1);
}

#[tokio::test]
async fn test_inline_backup_failure_propagates() {
    let executor = MockExecutor::new().with_default_response(MockResponse::Failure {
        stderr: "mysqldump: Access denied".to_string(),
        exit_code: 2,
    });
    let ctx = TestContext::new().with_executor(executor);
    let manager = ctx.manager();
    let id = manager.create(mysql_service("shop")).unwrap().id().unwrap();

    let err = manager.backup(id, true).await.unwrap_err();

    assert!(matches!(err, ServiceError::Backup(_)));
    let backups = ctx.store().backups_for(id);
    assert_eq!(backups.len(), 1);
    assert_eq!(backups[0].status, BackupStatus::Failed);
    assert!(backups[0].error.as_deref().unwrap().contains("Access denied"));
}

#[tokio::test]
async fn test_unsupported_backup_is_recorded_as_failed() {
    let ctx = TestContext::new();
    let manager = ctx.manager();
    let id = manager.create(new_service("cache", "redis")).unwrap().id().unwrap();

    assert!(manager.backup(id, true).await.is_err());

    let backups = ctx.store().backups_for(id);
    assert_eq!(backups[0].status, BackupStatus::Failed);
    assert_eq!(
        backups[0].error.as_deref(),
        Some("redis services do not support backups")
    );
}

#[tokio::test]
async fn test_worker_runs_deferred_backup_later() {
    let executor = MockExecutor::new().with_default_response(MockResponse::Delayed {
        delay: Duration::from_millis(200),
    });
    let ctx = TestContext::new().with_executor(executor);
    let (manager, worker) = ctx.manager_with_worker();
    let id = manager.create(postgres_service("orders")).unwrap().id().unwrap();

    let backup = manager.backup(id, false).await.unwrap();

    // Returned before the script finished
    assert_ne!(
        ctx.store().get_backup(backup.id).unwrap().status,
        BackupStatus::Succeeded
    );

    worker.shutdown().await.unwrap();
    assert_eq!(
        ctx.store().get_backup(backup.id).unwrap().status,
        BackupStatus::Succeeded
    );
}
