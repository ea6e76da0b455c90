//! Backup manager - creates backup records and dispatches their execution

use super::jobs::JobQueue;
use crate::models::{Backup, Service};
use crate::store::BackupRepository;
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;

pub struct BackupManager {
    backups: Arc<dyn BackupRepository>,
    queue: Arc<dyn JobQueue>,
}

impl BackupManager {
    pub fn new(backups: Arc<dyn BackupRepository>, queue: Arc<dyn JobQueue>) -> Self {
        Self { backups, queue }
    }

    /// Record a new backup of `service` and run it.
    ///
    /// With `inline` the backup runs before this returns and its failure is
    /// propagated; otherwise it is queued and the pending record returned.
    pub async fn backup(&self, service: &Service, inline: bool) -> Result<Backup> {
        let service_id = service
            .id()
            .with_context(|| format!("Service '{}' must be saved before it can be backed up", service.name))?;

        let backup = self
            .backups
            .create_backup(service_id)
            .with_context(|| format!("Failed to create backup record for '{}'", service.name))?;

        if inline {
            info!("Running backup {} of '{}' inline", backup.id, service.name);
            self.queue.perform_now(backup.id).await?;
            return self
                .backups
                .get_backup(backup.id)
                .context("Failed to reload backup record");
        }

        self.queue
            .enqueue(backup.id)
            .await
            .with_context(|| format!("Failed to queue backup {}", backup.id))?;
        info!("Queued backup {} of '{}'", backup.id, service.name);

        Ok(backup)
    }
}
