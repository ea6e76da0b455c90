//! Persistence of service and backup records
//!
//! The repositories are the only place port uniqueness can be enforced
//! atomically: [`ServiceRepository::insert_service`] and
//! [`ServiceRepository::update_service`] refuse a port another record holds.

mod json;

pub use json::JsonStore;

use crate::models::{Backup, BackupId, Service, ServiceId};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Service {0} not found")]
    ServiceNotFound(ServiceId),

    #[error("Backup {0} not found")]
    BackupNotFound(BackupId),

    #[error("Port {0} is already used by another service")]
    PortConflict(u16),

    #[error("Service '{0}' has not been persisted yet")]
    MissingId(String),

    #[error("Failed to access data file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to (de)serialize data file: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, StoreError>;

pub trait ServiceRepository: Send + Sync {
    /// Persist a new service, assigning its id
    fn insert_service(&self, service: Service) -> Result<Service>;

    fn update_service(&self, service: &Service) -> Result<()>;

    fn get_service(&self, id: ServiceId) -> Result<Service>;

    fn remove_service(&self, id: ServiceId) -> Result<()>;

    /// All services ordered by id
    fn list_services(&self) -> Vec<Service>;

    /// Whether a service other than `exclude` holds `port`
    fn port_in_use(&self, port: u16, exclude: Option<ServiceId>) -> bool;
}

pub trait BackupRepository: Send + Sync {
    /// Persist a new pending backup of a service
    fn create_backup(&self, service_id: ServiceId) -> Result<Backup>;

    fn get_backup(&self, id: BackupId) -> Result<Backup>;

    fn update_backup(&self, backup: &Backup) -> Result<()>;

    /// Backups of one service, oldest first
    fn backups_for(&self, service_id: ServiceId) -> Vec<Backup>;
}
