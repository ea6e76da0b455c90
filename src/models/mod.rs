pub mod backup;
pub mod service;
pub mod validation;

pub use backup::{Backup, BackupId, BackupStatus};
pub use service::{NewService, Service, ServiceId};
pub use validation::{Field, ValidationError, ValidationErrors};

/// Environment variables of a service, iterated in key order
pub type EnvironmentVariables = std::collections::BTreeMap<String, String>;
