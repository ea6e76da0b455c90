//! Container lifecycle against a real docker daemon

use super::common::{is_docker_available, ContainerGuard};
use service_manager::managers::backup::BackupManager;
use service_manager::managers::service::ServiceManager;
use service_manager::store::JsonStore;
use service_manager::utils::docker::{self, RuntimeError};
use service_manager::utils::docker_ops::{ContainerRuntime, DockerRuntime};
use std::sync::Arc;
use std::time::Duration;
use test_utils::{new_service, RecordingQueue};

const TIMEOUT: Duration = Duration::from_secs(120);

fn manager(runtime: Arc<DockerRuntime>) -> ServiceManager {
    let store = Arc::new(JsonStore::in_memory());
    let backups = BackupManager::new(store.clone(), Arc::new(RecordingQueue::new()));
    ServiceManager::new(store, runtime, backups, 10)
}

#[tokio::test]
#[ignore]
async fn test_redis_container_lifecycle() {
    if !is_docker_available() {
        eprintln!("Docker not available, skipping test");
        return;
    }

    let runtime = Arc::new(DockerRuntime::new(TIMEOUT));
    let manager = manager(runtime.clone());
    let service = manager.create(new_service("it-cache", "redis")).unwrap();
    let id = service.id().unwrap();
    let _guard = ContainerGuard::new(service.container_name());

    let started = manager.start(id).await.unwrap();
    let container_id = started.container_id.clone().unwrap();
    assert!(docker::inspect_container(&container_id, TIMEOUT).await.is_ok());

    // Stopping twice is fine: the second kill finds it not running
    manager.stop(id).await.unwrap();
    manager.stop(id).await.unwrap();

    manager.destroy(id).await.unwrap();
    assert!(matches!(
        runtime.get(&container_id).await.err(),
        Some(RuntimeError::NotFound(_))
    ));
}

#[tokio::test]
#[ignore]
async fn test_missing_container_is_not_found() {
    if !is_docker_available() {
        eprintln!("Docker not available, skipping test");
        return;
    }

    let runtime = DockerRuntime::new(TIMEOUT);

    let result = runtime.get("service-manager-does-not-exist").await;

    assert!(matches!(result.err(), Some(e) if e.is_not_found()));
}
