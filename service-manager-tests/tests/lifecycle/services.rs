//! Service lifecycle through the manager

use service_manager::managers::service::ServiceError;
use service_manager::store::{ServiceRepository, StoreError};
use test_utils::{
    env, new_service, service_on_port, service_with_container, MockRuntime, RuntimeCall,
    TestContext,
};

#[tokio::test]
async fn test_create_start_stop_destroy() {
    let ctx = TestContext::new();
    let manager = ctx.manager();

    let service = manager.create(service_on_port("orders", "postgres", 15432)).unwrap();
    let id = service.id().unwrap();

    let started = manager.start(id).await.unwrap();
    let container_id = started.container_id.clone().unwrap();
    assert!(ctx.runtime().is_running(&container_id));

    let spec = &ctx.runtime().created_specs()[0];
    assert_eq!(spec.image, "postgres");
    assert_eq!((spec.host_port, spec.container_port), (15432, 5432));
    assert!(spec
        .env
        .contains(&format!("POSTGRES_DB={}", service.env("POSTGRES_DB"))));

    manager.stop(id).await.unwrap();
    assert!(!ctx.runtime().is_running(&container_id));

    manager.destroy(id).await.unwrap();
    assert!(!ctx.runtime().contains(&container_id));
    assert!(manager.list().is_empty());

    // Nothing left behind in the data file either
    assert!(ctx.reopen_store().list_services().is_empty());
}

#[tokio::test]
async fn test_destroy_tolerates_vanished_container() {
    let runtime = MockRuntime::new().with_vanishing_container("c1");
    let ctx = TestContext::new().with_runtime(runtime);
    let manager = ctx.manager();
    let service = manager
        .create(service_with_container("cache", "redis", "c1"))
        .unwrap();

    manager.destroy(service.id().unwrap()).await.unwrap();

    // Delete was still attempted after kill found nothing
    let calls = ctx.runtime().get_calls();
    assert!(calls.contains(&RuntimeCall::Kill { id: "c1".to_string() }));
    assert!(calls.contains(&RuntimeCall::Delete { id: "c1".to_string() }));
    assert!(manager.list().is_empty());
}

#[tokio::test]
async fn test_destroy_of_unknown_service() {
    let ctx = TestContext::new();

    let err = ctx.manager().destroy(99).await.unwrap_err();

    assert!(matches!(err, ServiceError::Store(StoreError::ServiceNotFound(99))));
}

#[tokio::test]
async fn test_failed_kill_propagates_after_delete() {
    let runtime = MockRuntime::new().with_container("c1").with_failing_kill();
    let ctx = TestContext::new().with_runtime(runtime);
    let manager = ctx.manager();
    let service = manager
        .create(service_with_container("cache", "redis", "c1"))
        .unwrap();

    let err = manager.destroy(service.id().unwrap()).await.unwrap_err();

    assert!(err.to_string().contains("Mock kill failure"));
    assert!(!ctx.runtime().contains("c1"));
    // The record stays so destroy can be retried
    assert_eq!(manager.list().len(), 1);
}

#[test]
fn test_services_get_distinct_ports() {
    let ctx = TestContext::new();
    let manager = ctx.manager();

    let ports: std::collections::HashSet<_> = (0..20)
        .map(|i| {
            manager
                .create(new_service(&format!("cache-{}", i), "redis"))
                .unwrap()
                .port
                .unwrap()
        })
        .collect();

    assert_eq!(ports.len(), 20);
}

#[test]
fn test_update_environment_persists() {
    let ctx = TestContext::new();
    let manager = ctx.manager();
    let id = manager.create(new_service("cache", "redis")).unwrap().id().unwrap();

    manager
        .update_environment(id, env(&[("REDIS_PASS", "rotated"), ("APPENDONLY", "yes")]))
        .unwrap();

    let reloaded = ctx.reopen_store().get_service(id).unwrap();
    assert_eq!(reloaded.env("REDIS_PASS"), "rotated");
    assert_eq!(reloaded.env("APPENDONLY"), "yes");
}

#[test]
fn test_invalid_services_are_not_persisted() {
    let ctx = TestContext::new();
    let manager = ctx.manager();

    let err = manager.create(service_on_port("", "mongodb", 27017)).unwrap_err();

    match err {
        ServiceError::Validation(errors) => assert_eq!(
            errors.full_messages(),
            vec!["name can't be blank", "service_type is not included in the list"]
        ),
        other => panic!("unexpected error: {}", other),
    }
    assert!(manager.list().is_empty());
}
