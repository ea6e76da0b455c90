//! Service Manager Library
//!
//! Lifecycle management for backing-store services (redis, postgres, mysql)
//! running in containers: validated service records, per-type strategies for
//! connection and backup details, container control and backup dispatch.

pub mod config;
pub mod managers;
pub mod models;
pub mod store;
pub mod strategies;
pub mod utils;

// Re-export commonly used types
pub use config::{load_config, Config, ConfigError};
pub use managers::backup::BackupManager;
pub use managers::jobs::{BackupJob, BackupSettings, JobQueue, WorkerQueue};
pub use managers::logging::{init_console_logging, init_logging, LogGuard, LoggingConfig};
pub use managers::service::{ServiceError, ServiceManager};
pub use models::{Backup, BackupStatus, EnvironmentVariables, NewService, Service, ValidationErrors};
pub use store::{BackupRepository, JsonStore, ServiceRepository, StoreError};
pub use strategies::{ServiceStrategy, ServiceType, StrategyRegistry, UnsupportedCapability};
