//! Backup attempt records

use super::ServiceId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

pub type BackupId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BackupStatus {
    Pending,
    Running,
    Succeeded,
    Failed,
}

impl fmt::Display for BackupStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackupStatus::Pending => write!(f, "pending"),
            BackupStatus::Running => write!(f, "running"),
            BackupStatus::Succeeded => write!(f, "succeeded"),
            BackupStatus::Failed => write!(f, "failed"),
        }
    }
}

/// One backup attempt of a service.
///
/// Created before dispatch; only the backup job moves it past `Pending`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Backup {
    pub id: BackupId,
    pub service_id: ServiceId,
    pub status: BackupStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub finished_at: Option<DateTime<Utc>>,
    /// Artifact written by a successful run
    #[serde(default)]
    pub location: Option<PathBuf>,
    #[serde(default)]
    pub error: Option<String>,
}

impl Backup {
    pub fn new(id: BackupId, service_id: ServiceId) -> Self {
        Self {
            id,
            service_id,
            status: BackupStatus::Pending,
            created_at: Utc::now(),
            started_at: None,
            finished_at: None,
            location: None,
            error: None,
        }
    }

    pub fn mark_running(&mut self) {
        self.status = BackupStatus::Running;
        self.started_at = Some(Utc::now());
    }

    pub fn mark_succeeded(&mut self, location: PathBuf) {
        self.status = BackupStatus::Succeeded;
        self.location = Some(location);
        self.error = None;
        self.finished_at = Some(Utc::now());
    }

    pub fn mark_failed(&mut self, error: impl Into<String>) {
        self.status = BackupStatus::Failed;
        self.error = Some(error.into());
        self.finished_at = Some(Utc::now());
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.status, BackupStatus::Succeeded | BackupStatus::Failed)
    }

    /// Wall time of a finished run
    pub fn duration(&self) -> Option<chrono::Duration> {
        Some(self.finished_at? - self.started_at?)
    }
}
