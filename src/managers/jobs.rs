//! Backup job execution and the queues that dispatch it

use crate::config::{expand_tilde, GlobalConfig};
use crate::models::{Backup, BackupId, Service};
use crate::store::{BackupRepository, ServiceRepository};
use crate::utils::executor::CommandExecutor;
use crate::utils::locker::BackupLock;
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Accepts backup executions, either deferred or immediate
#[async_trait]
pub trait JobQueue: Send + Sync {
    /// Queue a backup for later execution and return without waiting
    async fn enqueue(&self, backup_id: BackupId) -> Result<()>;

    /// Execute a backup in the caller's task, returning once it finished
    async fn perform_now(&self, backup_id: BackupId) -> Result<()>;
}

/// Filesystem locations and limits for backup runs
#[derive(Debug, Clone)]
pub struct BackupSettings {
    pub backup_directory: PathBuf,
    pub scripts_directory: PathBuf,
    pub lock_directory: PathBuf,
    pub timeout: Duration,
}

impl BackupSettings {
    pub fn from_config(global: &GlobalConfig) -> Self {
        Self {
            backup_directory: expand_tilde(&global.backup_directory),
            scripts_directory: expand_tilde(&global.scripts_directory),
            lock_directory: expand_tilde(&global.lock_directory()),
            timeout: global.backup_timeout(),
        }
    }
}

/// The backup procedure: run the service type's script and record the outcome
pub struct BackupJob {
    services: Arc<dyn ServiceRepository>,
    backups: Arc<dyn BackupRepository>,
    executor: Arc<dyn CommandExecutor>,
    settings: BackupSettings,
}

impl BackupJob {
    pub fn new(
        services: Arc<dyn ServiceRepository>,
        backups: Arc<dyn BackupRepository>,
        executor: Arc<dyn CommandExecutor>,
        settings: BackupSettings,
    ) -> Self {
        Self {
            services,
            backups,
            executor,
            settings,
        }
    }

    /// Run one backup to completion.
    ///
    /// The record is always left `succeeded` or `failed`; a failed run is
    /// also returned as an error.
    pub async fn perform(&self, backup_id: BackupId) -> Result<Backup> {
        let mut backup = self
            .backups
            .get_backup(backup_id)
            .with_context(|| format!("Failed to load backup {}", backup_id))?;
        let service = self
            .services
            .get_service(backup.service_id)
            .with_context(|| format!("Failed to load service of backup {}", backup_id))?;

        info!("Starting backup {} of service '{}'", backup.id, service.name);
        let start = Instant::now();

        backup.mark_running();
        self.backups.update_backup(&backup)?;

        let outcome = self.execute(&service, &backup).await;

        match outcome {
            Ok(ref location) => {
                info!(
                    "Backup {} of '{}' completed in {:.1}s: {:?}",
                    backup.id,
                    service.name,
                    start.elapsed().as_secs_f64(),
                    location
                );
                backup.mark_succeeded(location.clone());
            }
            Err(ref e) => {
                error!("Backup {} of '{}' failed: {:#}", backup.id, service.name, e);
                backup.mark_failed(format!("{:#}", e));
            }
        }

        self.backups
            .update_backup(&backup)
            .with_context(|| format!("Failed to record outcome of backup {}", backup.id))?;

        outcome.map(|_| backup)
    }

    async fn execute(&self, service: &Service, backup: &Backup) -> Result<PathBuf> {
        if !service.can_backup() {
            bail!("{} services do not support backups", service.service_type());
        }

        let mut env = service.backup_environment_variables()?;
        let script = self
            .settings
            .scripts_directory
            .join(service.backup_script_path()?);
        let file_name = service.backup_file_name()?;

        let _lock = BackupLock::acquire(
            &self.settings.lock_directory,
            &format!("service-{}", backup.service_id),
        )?;

        let target_dir = self
            .settings
            .backup_directory
            .join(service.container_name())
            .join(backup.id.to_string());
        std::fs::create_dir_all(&target_dir)
            .with_context(|| format!("Failed to create backup directory: {:?}", target_dir))?;

        let location = target_dir.join(file_name);
        env.insert("BACKUP_DIR".to_string(), target_dir.to_string_lossy().to_string());
        env.insert("BACKUP_FILE".to_string(), location.to_string_lossy().to_string());

        debug!("Running backup script {:?}", script);
        self.executor
            .run_command(
                &script.to_string_lossy(),
                &[],
                &env,
                Some(self.settings.timeout),
            )
            .await
            .with_context(|| format!("Backup script {:?} failed", script))?;

        Ok(location)
    }
}

/// Runs queued backups one at a time on a background task
pub struct WorkerQueue {
    job: Arc<BackupJob>,
    sender: Mutex<Option<mpsc::UnboundedSender<BackupId>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl WorkerQueue {
    /// Start the worker. Must be called inside a Tokio runtime.
    pub fn spawn(job: Arc<BackupJob>) -> Self {
        let (sender, mut receiver) = mpsc::unbounded_channel::<BackupId>();
        let worker_job = Arc::clone(&job);

        let worker = tokio::spawn(async move {
            while let Some(backup_id) = receiver.recv().await {
                // Failures are already recorded on the backup
                if let Err(e) = worker_job.perform(backup_id).await {
                    warn!("Queued backup {} did not succeed: {:#}", backup_id, e);
                }
            }
            debug!("Backup worker stopped");
        });

        Self {
            job,
            sender: Mutex::new(Some(sender)),
            worker: Mutex::new(Some(worker)),
        }
    }

    /// Stop accepting work and wait for queued backups to finish
    pub async fn shutdown(&self) -> Result<()> {
        self.sender.lock().take();
        let worker = self.worker.lock().take();

        if let Some(worker) = worker {
            worker.await.context("Backup worker panicked")?;
        }
        Ok(())
    }
}

#[async_trait]
impl JobQueue for WorkerQueue {
    async fn enqueue(&self, backup_id: BackupId) -> Result<()> {
        let sender = self.sender.lock();
        let sender = sender
            .as_ref()
            .context("Backup queue has been shut down")?;
        sender
            .send(backup_id)
            .map_err(|_| anyhow::anyhow!("Backup worker is no longer running"))?;
        debug!("Queued backup {}", backup_id);
        Ok(())
    }

    async fn perform_now(&self, backup_id: BackupId) -> Result<()> {
        self.job.perform(backup_id).await.map(|_| ())
    }
}

/// A queue that records requests for assertions in tests
/// Available for use in external test crates
pub mod mock {
    use super::*;

    #[derive(Clone, Default)]
    pub struct RecordingQueue {
        pending: Arc<Mutex<Vec<BackupId>>>,
        performed: Arc<Mutex<Vec<BackupId>>>,
        job: Option<Arc<BackupJob>>,
    }

    impl RecordingQueue {
        pub fn new() -> Self {
            Self::default()
        }

        /// Also run `perform_now` requests through a real job
        pub fn with_job(mut self, job: Arc<BackupJob>) -> Self {
            self.job = Some(job);
            self
        }

        /// Ids handed to `enqueue` that nothing has run
        pub fn pending(&self) -> Vec<BackupId> {
            self.pending.lock().clone()
        }

        pub fn performed(&self) -> Vec<BackupId> {
            self.performed.lock().clone()
        }
    }

    #[async_trait]
    impl JobQueue for RecordingQueue {
        async fn enqueue(&self, backup_id: BackupId) -> Result<()> {
            self.pending.lock().push(backup_id);
            Ok(())
        }

        async fn perform_now(&self, backup_id: BackupId) -> Result<()> {
            self.performed.lock().push(backup_id);
            match self.job {
                Some(ref job) => job.perform(backup_id).await.map(|_| ()),
                None => Ok(()),
            }
        }
    }
}
