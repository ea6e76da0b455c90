//! The service record and its lifecycle logic

use super::validation::{self, Field, ValidationErrors};
use super::EnvironmentVariables;
use crate::store::ServiceRepository;
use crate::strategies::{RegistryError, ServiceStrategy, StrategyError, StrategyRegistry};
use crate::utils::docker_ops::{ContainerHandle, ContainerRuntime};
use crate::utils::RuntimeError;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::ops::Range;
use std::path::PathBuf;
use std::sync::OnceLock;
use tracing::{debug, info, warn};

pub type ServiceId = u64;

/// Fields a caller supplies when constructing a service
#[derive(Debug, Clone, Default)]
pub struct NewService {
    pub name: String,
    pub service_type: String,
    pub port: Option<u16>,
    pub image: Option<String>,
    pub environment_variables: EnvironmentVariables,
    pub container_id: Option<String>,
}

/// One backing-store instance (cache, database) and its container.
///
/// `service_type` is fixed at construction; the strategy resolved from it is
/// cached for the lifetime of the value.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Service {
    #[serde(default)]
    id: Option<ServiceId>,
    pub name: String,
    service_type: String,
    pub port: Option<u16>,
    pub image: Option<String>,
    #[serde(default)]
    pub environment_variables: EnvironmentVariables,
    /// Lookup key of the associated container, if any
    #[serde(default)]
    pub container_id: Option<String>,
    #[serde(skip)]
    port_assigned: bool,
    #[serde(skip)]
    strategy: OnceLock<&'static dyn ServiceStrategy>,
}

impl Service {
    /// Range automatically assigned ports are drawn from
    pub const PORT_RANGE: Range<u16> = 1024..65535;

    /// Build a service. For registered types, defaults are filled in order:
    /// port, environment (existing values win), image.
    pub fn new(fields: NewService) -> Self {
        let mut service = Self {
            id: None,
            name: fields.name,
            service_type: fields.service_type,
            port: fields.port,
            image: fields.image,
            environment_variables: fields.environment_variables,
            container_id: fields.container_id,
            port_assigned: false,
            strategy: OnceLock::new(),
        };

        if service.is_hosted() {
            service.assign_port();
            service.assign_environment_variables();
            service.assign_image();
        }

        service
    }

    pub fn id(&self) -> Option<ServiceId> {
        self.id
    }

    pub(crate) fn set_id(&mut self, id: ServiceId) {
        self.id = Some(id);
    }

    pub fn service_type(&self) -> &str {
        &self.service_type
    }

    /// Value of an environment variable, empty when unset
    pub fn env(&self, key: &str) -> &str {
        self.environment_variables
            .get(key)
            .map(String::as_str)
            .unwrap_or_default()
    }

    /// Whether the type is known to the registry
    pub fn is_hosted(&self) -> bool {
        StrategyRegistry::global().is_hosted(&self.service_type)
    }

    /// Whether the current port was drawn automatically rather than supplied
    pub fn port_was_assigned(&self) -> bool {
        self.port_assigned
    }

    /// Resolve (once) the strategy for this service's type
    pub fn strategy(&self) -> Result<&'static dyn ServiceStrategy, RegistryError> {
        if let Some(strategy) = self.strategy.get() {
            return Ok(*strategy);
        }
        let entry = StrategyRegistry::global().lookup(&self.service_type)?;
        Ok(*self.strategy.get_or_init(|| entry.strategy))
    }

    fn assign_port(&mut self) {
        if self.port.is_none() {
            self.reassign_port();
        }
    }

    /// Draw a fresh random port, used when the previous one collided
    pub fn reassign_port(&mut self) -> u16 {
        let port = rand::thread_rng().gen_range(Self::PORT_RANGE);
        debug!("Assigned port {} to service '{}'", port, self.name);
        self.port = Some(port);
        self.port_assigned = true;
        port
    }

    fn assign_environment_variables(&mut self) {
        if let Ok(strategy) = self.strategy() {
            let mut merged = strategy.default_environment_variables(self);
            merged.extend(std::mem::take(&mut self.environment_variables));
            self.environment_variables = merged;
        }
    }

    fn assign_image(&mut self) {
        if self.image.is_none() {
            self.image = StrategyRegistry::global()
                .canonical_image(&self.service_type)
                .map(str::to_string);
        }
    }

    /// Run every check and report all failures together
    pub fn validate(&self, services: &dyn ServiceRepository) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();

        if self.name.trim().is_empty() {
            errors.add(Field::Name, validation::BLANK);
        }

        match self.port {
            None => errors.add(Field::Port, validation::BLANK),
            Some(0) => errors.add(Field::Port, validation::OUT_OF_RANGE),
            Some(port) if services.port_in_use(port, self.id) => {
                errors.add(Field::Port, validation::TAKEN)
            }
            Some(_) => {}
        }

        let registry = StrategyRegistry::global();
        if self.service_type.trim().is_empty() {
            errors.add(Field::ServiceType, validation::BLANK);
        } else if !registry.is_hosted(&self.service_type) {
            errors.add(Field::ServiceType, validation::NOT_INCLUDED);
        }

        if let Ok(entry) = registry.lookup(&self.service_type) {
            match self.image.as_deref().map(str::trim) {
                None | Some("") => errors.add(Field::Image, validation::BLANK),
                Some(image) if image != entry.image => {
                    errors.add(Field::Image, validation::NOT_INCLUDED)
                }
                Some(_) => {}
            }

            for variable in entry.strategy.required_environment_variables() {
                if self.env(variable).trim().is_empty() {
                    errors.add(Field::EnvironmentVariables, format!("{} is required", variable));
                }
            }
        }

        errors.into_result()
    }

    pub fn connection_string(&self) -> Result<String, RegistryError> {
        let host = StrategyRegistry::global().host();
        Ok(self.strategy()?.connection_string(self, host))
    }

    pub fn connection_command(&self) -> Result<String, RegistryError> {
        let host = StrategyRegistry::global().host();
        Ok(self.strategy()?.connection_command(self, host))
    }

    pub fn backup_environment_variables(&self) -> Result<EnvironmentVariables, StrategyError> {
        let host = StrategyRegistry::global().host();
        Ok(self.strategy()?.backup_environment_variables(self, host)?)
    }

    pub fn backup_script_path(&self) -> Result<PathBuf, StrategyError> {
        Ok(self.strategy()?.backup_script_path()?)
    }

    pub fn backup_file_name(&self) -> Result<String, StrategyError> {
        Ok(self.strategy()?.backup_file_name(self)?)
    }

    /// True when the strategy yields a non-empty backup environment.
    /// Unsupported or unknown types answer `false`.
    pub fn can_backup(&self) -> bool {
        match self.backup_environment_variables() {
            Ok(env) => !env.is_empty(),
            Err(e) => {
                debug!("Service '{}' cannot be backed up: {}", self.name, e);
                false
            }
        }
    }

    /// Environment rendered as `KEY=VALUE` for the container runtime
    pub fn container_env(&self) -> Vec<String> {
        self.environment_variables
            .iter()
            .map(|(key, value)| format!("{}={}", key, value))
            .collect()
    }

    /// Stable container name, `service-<id>-<slug>`
    pub fn container_name(&self) -> String {
        let slug: String = self
            .name
            .to_lowercase()
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
            .collect();
        let id = self.id.map(|id| id.to_string()).unwrap_or_else(|| "new".to_string());
        format!("service-{}-{}", id, slug.trim_matches('-'))
            .trim_end_matches('-')
            .to_string()
    }

    /// Resolve the associated container, `None` when there is none
    pub async fn container(
        &self,
        runtime: &dyn ContainerRuntime,
    ) -> Result<Option<Box<dyn ContainerHandle>>, RuntimeError> {
        match self.container_id.as_deref().filter(|id| !id.is_empty()) {
            Some(id) => runtime.get(id).await.map(Some),
            None => Ok(None),
        }
    }

    /// Force-stop and remove the associated container.
    ///
    /// Removal is attempted even when stopping failed. A container that is
    /// already gone is not an error, so this can be retried safely.
    pub async fn destroy(&self, runtime: &dyn ContainerRuntime) -> Result<(), RuntimeError> {
        let container = match self.container(runtime).await {
            Ok(Some(container)) => container,
            Ok(None) => return Ok(()),
            Err(e) if e.is_not_found() => {
                warn!("Container of service '{}' is already gone", self.name);
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        let killed = container.kill().await;
        let deleted = container.delete().await;

        for result in [killed, deleted] {
            match result {
                Err(e) if e.is_not_found() => {
                    debug!("Container {} vanished during destroy", container.id());
                }
                Err(e) => return Err(e),
                Ok(()) => {}
            }
        }

        info!("Destroyed container {} of service '{}'", container.id(), self.name);
        Ok(())
    }
}
