//! Per-service-type behaviour
//!
//! Everything that differs between a redis cache and a postgres database lives
//! behind [`ServiceStrategy`]. A [`Service`] never branches on its type name; it
//! asks the strategy resolved through the [`StrategyRegistry`].

pub mod mysql;
pub mod postgres;
pub mod redis;
pub mod registry;

pub use mysql::MysqlStrategy;
pub use postgres::PostgresStrategy;
pub use redis::RedisStrategy;
pub use registry::{RegistryEntry, RegistryError, StrategyRegistry};

use crate::models::{EnvironmentVariables, Service};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Registered service types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceType {
    Redis,
    Postgres,
    Mysql,
}

impl ServiceType {
    pub const ALL: [ServiceType; 3] = [ServiceType::Redis, ServiceType::Postgres, ServiceType::Mysql];

    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceType::Redis => "redis",
            ServiceType::Postgres => "postgres",
            ServiceType::Mysql => "mysql",
        }
    }

    /// Image used when the configuration does not override it
    pub fn default_image(&self) -> &'static str {
        match self {
            ServiceType::Redis => "tutum/redis",
            ServiceType::Postgres => "postgres",
            ServiceType::Mysql => "mysql",
        }
    }

    pub fn strategy(&self) -> &'static dyn ServiceStrategy {
        match self {
            ServiceType::Redis => &RedisStrategy,
            ServiceType::Postgres => &PostgresStrategy,
            ServiceType::Mysql => &MysqlStrategy,
        }
    }
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ServiceType {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ServiceType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| RegistryError::UnknownServiceType(s.to_string()))
    }
}

/// A strategy does not implement the requested capability for its type
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{service_type} services do not support {capability}")]
pub struct UnsupportedCapability {
    pub service_type: ServiceType,
    pub capability: &'static str,
}

/// Resolving a strategy or one of its optional capabilities failed
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StrategyError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Unsupported(#[from] UnsupportedCapability),
}

/// Type-specific behaviour of a service.
///
/// Strategies are stateless; every method receives the owning service as a
/// read-only reference.
pub trait ServiceStrategy: fmt::Debug + Send + Sync {
    fn service_type(&self) -> ServiceType;

    /// Port the image listens on inside the container
    fn container_port(&self) -> u16;

    fn connection_string(&self, service: &Service, host: &str) -> String;

    /// Shell command that opens an interactive client session
    fn connection_command(&self, service: &Service, host: &str) -> String;

    /// Baseline environment, merged under the service's own variables
    fn default_environment_variables(&self, service: &Service) -> EnvironmentVariables;

    /// Variables that must hold a non-empty value
    fn required_environment_variables(&self) -> &'static [&'static str];

    /// Environment handed to the backup script
    fn backup_environment_variables(
        &self,
        _service: &Service,
        _host: &str,
    ) -> Result<EnvironmentVariables, UnsupportedCapability> {
        Err(self.unsupported("backups"))
    }

    /// Backup script, relative to the configured scripts directory
    fn backup_script_path(&self) -> Result<PathBuf, UnsupportedCapability> {
        Err(self.unsupported("backups"))
    }

    /// Name of the artifact a backup run produces
    fn backup_file_name(&self, _service: &Service) -> Result<String, UnsupportedCapability> {
        Err(self.unsupported("backups"))
    }

    fn supports_backup(&self) -> bool {
        self.backup_script_path().is_ok()
    }

    fn unsupported(&self, capability: &'static str) -> UnsupportedCapability {
        UnsupportedCapability {
            service_type: self.service_type(),
            capability,
        }
    }
}

/// Derive a database identifier from a service name.
///
/// Lowercases, maps anything outside `[a-z0-9_]` to `_` and falls back when
/// nothing usable remains.
pub(crate) fn database_identifier(name: &str, fallback: &str) -> String {
    let ident: String = name
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    let ident = ident.trim_matches('_');

    match ident.chars().next() {
        None => fallback.to_string(),
        Some(c) if c.is_ascii_digit() => format!("db_{}", ident),
        Some(_) => ident.to_string(),
    }
}
