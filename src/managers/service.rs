//! Service manager - client-facing lifecycle of services and their containers

use super::backup::BackupManager;
use super::jobs::{BackupJob, BackupSettings, WorkerQueue};
use crate::config::{expand_tilde, Config};
use crate::models::{
    validation, Backup, EnvironmentVariables, Field, NewService, Service, ServiceId, ValidationErrors,
};
use crate::store::{JsonStore, ServiceRepository, StoreError};
use crate::strategies::{RegistryError, ServiceStrategy, StrategyRegistry};
use crate::utils::docker_ops::{ContainerHandle, ContainerRuntime, DockerRuntime};
use crate::utils::executor::RealExecutor;
use crate::utils::{ContainerSpec, RuntimeError};
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("No free port found for service '{name}' after {attempts} attempts")]
    PortsExhausted { name: String, attempts: u32 },

    #[error(transparent)]
    Backup(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, ServiceError>;

pub struct ServiceManager {
    services: Arc<dyn ServiceRepository>,
    runtime: Arc<dyn ContainerRuntime>,
    backups: BackupManager,
    max_port_attempts: u32,
}

impl ServiceManager {
    pub fn new(
        services: Arc<dyn ServiceRepository>,
        runtime: Arc<dyn ContainerRuntime>,
        backups: BackupManager,
        max_port_attempts: u32,
    ) -> Self {
        Self {
            services,
            runtime,
            backups,
            max_port_attempts: max_port_attempts.max(1),
        }
    }

    /// Wire the production stack: configured strategy registry, JSON store,
    /// docker CLI and background backup worker.
    /// Must be called inside a Tokio runtime.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let registry = StrategyRegistry::install_configured(config)?;
        debug!("Using strategy registry with host {}", registry.host());

        let global = &config.global;
        let store = Arc::new(JsonStore::open(expand_tilde(&global.data_file))?);

        let job = Arc::new(BackupJob::new(
            store.clone(),
            store.clone(),
            Arc::new(RealExecutor::new()),
            BackupSettings::from_config(global),
        ));
        let backups = BackupManager::new(store.clone(), Arc::new(WorkerQueue::spawn(job)));

        Ok(Self::new(
            store,
            Arc::new(DockerRuntime::new(global.docker_timeout())),
            backups,
            global.max_port_attempts,
        ))
    }

    /// Validate and persist a new service.
    ///
    /// An automatically drawn port that turns out to be taken is redrawn up
    /// to `max_port_attempts` times. A port the caller chose is never changed.
    pub fn create(&self, fields: NewService) -> Result<Service> {
        let mut service = Service::new(fields);
        let mut attempts = 1;

        loop {
            match service.validate(self.services.as_ref()) {
                Err(errors) if service.port_was_assigned() && only_port_taken(&errors) => {}
                Err(errors) => return Err(errors.into()),
                Ok(()) => match self.services.insert_service(service.clone()) {
                    Ok(saved) => {
                        info!(
                            "Created {} service '{}' on port {}",
                            saved.service_type(),
                            saved.name,
                            saved.port.unwrap_or_default()
                        );
                        return Ok(saved);
                    }
                    // Lost a race with a concurrent insert
                    Err(StoreError::PortConflict(_)) if service.port_was_assigned() => {}
                    Err(e) => return Err(e.into()),
                },
            }

            if attempts >= self.max_port_attempts {
                return Err(ServiceError::PortsExhausted {
                    name: service.name,
                    attempts,
                });
            }

            attempts += 1;
            let previous = service.port.unwrap_or_default();
            let port = service.reassign_port();
            warn!(
                "Port {} is taken, retrying service '{}' on port {}",
                previous, service.name, port
            );
        }
    }

    pub fn get(&self, id: ServiceId) -> Result<Service> {
        Ok(self.services.get_service(id)?)
    }

    pub fn list(&self) -> Vec<Service> {
        self.services.list_services()
    }

    /// Merge variables into a service's environment and save it if still valid
    pub fn update_environment(&self, id: ServiceId, vars: EnvironmentVariables) -> Result<Service> {
        let mut service = self.get(id)?;
        service.environment_variables.extend(vars);
        service.validate(self.services.as_ref())?;
        self.services.update_service(&service)?;
        debug!("Updated environment of service '{}'", service.name);
        Ok(service)
    }

    /// Start the service's container, creating it first when there is none
    pub async fn start(&self, id: ServiceId) -> Result<Service> {
        let mut service = self.get(id)?;
        let strategy = service.strategy()?;

        let existing = service.container(self.runtime.as_ref()).await;
        let container = match existing {
            Ok(Some(container)) => container,
            Ok(None) => self.create_container(&mut service, strategy).await?,
            Err(e) if e.is_not_found() => {
                warn!(
                    "Container of service '{}' is gone, creating a new one",
                    service.name
                );
                self.create_container(&mut service, strategy).await?
            }
            Err(e) => return Err(e.into()),
        };

        container.start().await?;
        self.services.update_service(&service)?;
        info!("Started service '{}' ({})", service.name, container.id());

        Ok(service)
    }

    async fn create_container(
        &self,
        service: &mut Service,
        strategy: &dyn ServiceStrategy,
    ) -> Result<Box<dyn ContainerHandle>> {
        service.validate(self.services.as_ref())?;

        // Port and image are present once validation passed
        let spec = ContainerSpec {
            name: service.container_name(),
            image: service.image.clone().unwrap_or_default(),
            env: service.container_env(),
            host_port: service.port.unwrap_or_default(),
            container_port: strategy.container_port(),
        };

        let id = self.runtime.create(&spec).await?;
        info!("Created container {} for service '{}'", id, service.name);
        service.container_id = Some(id.clone());
        self.services.update_service(service)?;

        Ok(self.runtime.get(&id).await?)
    }

    /// Stop the service's container. A container that no longer exists is
    /// forgotten rather than reported.
    pub async fn stop(&self, id: ServiceId) -> Result<Service> {
        let mut service = self.get(id)?;

        let existing = service.container(self.runtime.as_ref()).await;
        let killed = match existing {
            Ok(Some(container)) => container.kill().await,
            Ok(None) => {
                debug!("Service '{}' has no container to stop", service.name);
                return Ok(service);
            }
            Err(e) => Err(e),
        };

        match killed {
            Ok(()) => info!("Stopped service '{}'", service.name),
            Err(e) if e.is_not_found() => {
                warn!("Container of service '{}' is already gone", service.name);
                service.container_id = None;
                self.services.update_service(&service)?;
            }
            Err(e) => return Err(e.into()),
        }

        Ok(service)
    }

    /// Tear down the container and remove the record
    pub async fn destroy(&self, id: ServiceId) -> Result<()> {
        let service = self.get(id)?;
        service.destroy(self.runtime.as_ref()).await?;
        self.services.remove_service(id)?;
        info!("Destroyed service '{}'", service.name);
        Ok(())
    }

    pub async fn backup(&self, id: ServiceId, inline: bool) -> Result<Backup> {
        let service = self.get(id)?;
        Ok(self.backups.backup(&service, inline).await?)
    }
}

fn only_port_taken(errors: &ValidationErrors) -> bool {
    errors.len() == 1 && errors.contains(Field::Port, validation::TAKEN)
}
