//! Service type -> {canonical image, strategy} mapping
//!
//! The registry is process-wide and read-only. Install it once at startup with
//! [`StrategyRegistry::install`]; anything resolving strategies before that
//! gets the built-in defaults.

use super::{ServiceStrategy, ServiceType};
use crate::config::Config;
use std::collections::HashMap;
use std::sync::OnceLock;
use tracing::info;

static REGISTRY: OnceLock<StrategyRegistry> = OnceLock::new();

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("Unknown service type: '{0}'")]
    UnknownServiceType(String),

    #[error("Strategy registry is already installed")]
    AlreadyInstalled,

    #[error("A strategy registry with different host or images is already installed")]
    Conflicting,
}

/// What the registry knows about one service type
#[derive(Debug, Clone)]
pub struct RegistryEntry {
    pub service_type: ServiceType,
    pub image: String,
    pub strategy: &'static dyn ServiceStrategy,
}

#[derive(Debug, Clone)]
pub struct StrategyRegistry {
    host: String,
    entries: HashMap<ServiceType, RegistryEntry>,
}

impl StrategyRegistry {
    /// Every service type with its default image, connecting through localhost
    pub fn builtin() -> Self {
        let entries = ServiceType::ALL
            .into_iter()
            .map(|service_type| {
                let entry = RegistryEntry {
                    service_type,
                    image: service_type.default_image().to_string(),
                    strategy: service_type.strategy(),
                };
                (service_type, entry)
            })
            .collect();

        Self {
            host: "localhost".to_string(),
            entries,
        }
    }

    /// Built-in registry with the configured host and image overrides applied
    pub fn from_config(config: &Config) -> Result<Self, RegistryError> {
        let mut registry = Self::builtin();
        registry.host = config.global.host.clone();

        for (name, image) in &config.images {
            let service_type: ServiceType = name.parse()?;
            if let Some(entry) = registry.entries.get_mut(&service_type) {
                entry.image = image.clone();
            }
        }

        Ok(registry)
    }

    /// Make this the process-wide registry
    pub fn install(self) -> Result<&'static StrategyRegistry, RegistryError> {
        REGISTRY.set(self).map_err(|_| RegistryError::AlreadyInstalled)?;
        let registry = Self::global();
        info!(
            "Installed strategy registry for {} service types (host {})",
            registry.entries.len(),
            registry.host
        );
        Ok(registry)
    }

    /// Install the registry described by `config`.
    ///
    /// Succeeds when an identical registry is already in place, so several
    /// managers built from the same config can share one process.
    pub fn install_configured(config: &Config) -> Result<&'static StrategyRegistry, RegistryError> {
        let registry = Self::from_config(config)?;
        if let Some(installed) = REGISTRY.get() {
            return if installed.same_settings(&registry) {
                Ok(installed)
            } else {
                Err(RegistryError::Conflicting)
            };
        }

        match registry.clone().install() {
            Err(RegistryError::AlreadyInstalled) if Self::global().same_settings(&registry) => {
                Ok(Self::global())
            }
            result => result,
        }
    }

    /// Same host and the same image for every service type
    pub fn same_settings(&self, other: &StrategyRegistry) -> bool {
        self.host == other.host
            && self.entries.len() == other.entries.len()
            && self.entries.iter().all(|(service_type, entry)| {
                other
                    .entries
                    .get(service_type)
                    .is_some_and(|o| o.image == entry.image)
            })
    }

    /// The process-wide registry, falling back to [`StrategyRegistry::builtin`]
    pub fn global() -> &'static StrategyRegistry {
        REGISTRY.get_or_init(Self::builtin)
    }

    /// Look up a service type. Unknown types are an error, never a default.
    pub fn lookup(&self, service_type: &str) -> Result<&RegistryEntry, RegistryError> {
        let parsed: ServiceType = service_type.parse()?;
        self.entries
            .get(&parsed)
            .ok_or_else(|| RegistryError::UnknownServiceType(service_type.to_string()))
    }

    pub fn canonical_image(&self, service_type: &str) -> Option<&str> {
        self.lookup(service_type).ok().map(|e| e.image.as_str())
    }

    pub fn is_hosted(&self, service_type: &str) -> bool {
        self.lookup(service_type).is_ok()
    }

    /// Registered type names in a stable order
    pub fn service_types(&self) -> Vec<&'static str> {
        let mut types: Vec<_> = self.entries.keys().copied().collect();
        types.sort();
        types.into_iter().map(|t| t.as_str()).collect()
    }

    pub fn host(&self) -> &str {
        &self.host
    }
}
