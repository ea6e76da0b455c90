//! Test context and harness for lifecycle testing
//!
//! Wires a [`ServiceManager`] to a file-backed store inside a temp directory,
//! a [`MockRuntime`] and a [`MockExecutor`], and keeps handles to all of them
//! for assertions.

use crate::config_builder::ConfigBuilder;
use service_manager::config::Config;
use service_manager::managers::backup::BackupManager;
use service_manager::managers::jobs::mock::RecordingQueue;
use service_manager::managers::jobs::{BackupJob, BackupSettings, JobQueue, WorkerQueue};
use service_manager::managers::service::ServiceManager;
use service_manager::store::JsonStore;
use service_manager::utils::docker_ops::mock::MockRuntime;
use service_manager::utils::executor::mock::MockExecutor;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

pub struct TestContext {
    temp_dir: TempDir,
    config: Config,
    store: Arc<JsonStore>,
    runtime: MockRuntime,
    executor: MockExecutor,
    queue: RecordingQueue,
}

impl TestContext {
    /// Create a test context with the default test configuration
    pub fn new() -> Self {
        Self::from_builder(ConfigBuilder::new())
    }

    /// Create a test context from a ConfigBuilder
    pub fn from_builder(builder: ConfigBuilder) -> Self {
        let (config, temp_dir) = builder.persist();
        let store = Arc::new(
            JsonStore::open(&config.global.data_file).expect("Failed to open test store"),
        );

        Self {
            temp_dir,
            config,
            store,
            runtime: MockRuntime::new(),
            executor: MockExecutor::new(),
            queue: RecordingQueue::new(),
        }
    }

    /// Replace the mock runtime (e.g. one with pre-registered containers)
    pub fn with_runtime(mut self, runtime: MockRuntime) -> Self {
        self.runtime = runtime;
        self
    }

    /// Replace the mock executor (e.g. one that fails backup scripts)
    pub fn with_executor(mut self, executor: MockExecutor) -> Self {
        self.executor = executor;
        self
    }

    pub fn temp_dir(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> Arc<JsonStore> {
        Arc::clone(&self.store)
    }

    /// Reopen the data file, as a fresh process would
    pub fn reopen_store(&self) -> JsonStore {
        JsonStore::open(&self.config.global.data_file).expect("Failed to reopen test store")
    }

    pub fn runtime(&self) -> &MockRuntime {
        &self.runtime
    }

    pub fn executor(&self) -> &MockExecutor {
        &self.executor
    }

    pub fn queue(&self) -> &RecordingQueue {
        &self.queue
    }

    /// The backup procedure, wired to the store and mock executor
    pub fn backup_job(&self) -> Arc<BackupJob> {
        Arc::new(BackupJob::new(
            self.store(),
            self.store(),
            Arc::new(self.executor.clone()),
            BackupSettings::from_config(&self.config.global),
        ))
    }

    /// Manager whose deferred backups are only recorded and whose inline
    /// backups run through the mock executor
    pub fn manager(&self) -> ServiceManager {
        let queue = self.queue.clone().with_job(self.backup_job());
        self.manager_with_queue(Arc::new(queue))
    }

    /// Manager backed by a real background worker. Needs a Tokio runtime.
    pub fn manager_with_worker(&self) -> (ServiceManager, Arc<WorkerQueue>) {
        let queue = Arc::new(WorkerQueue::spawn(self.backup_job()));
        (self.manager_with_queue(queue.clone()), queue)
    }

    fn manager_with_queue(&self, queue: Arc<dyn JobQueue>) -> ServiceManager {
        ServiceManager::new(
            self.store(),
            Arc::new(self.runtime.clone()),
            BackupManager::new(self.store(), queue),
            self.config.global.max_port_attempts,
        )
    }

    /// Program path the backup job runs for a script name
    pub fn script_path(&self, script: &str) -> String {
        self.config
            .global
            .scripts_directory
            .join(script)
            .to_string_lossy()
            .to_string()
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}
