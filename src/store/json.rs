//! In-memory record store with optional JSON file persistence

use super::{BackupRepository, Result, ServiceRepository, StoreError};
use crate::models::{Backup, BackupId, Service, ServiceId};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
struct Data {
    #[serde(default)]
    next_service_id: ServiceId,
    #[serde(default)]
    next_backup_id: BackupId,
    #[serde(default)]
    services: BTreeMap<ServiceId, Service>,
    #[serde(default)]
    backups: BTreeMap<BackupId, Backup>,
}

impl Data {
    fn port_in_use(&self, port: u16, exclude: Option<ServiceId>) -> bool {
        self.services
            .iter()
            .any(|(id, service)| Some(*id) != exclude && service.port == Some(port))
    }
}

/// Store backing both repositories.
///
/// All records are held in memory behind one mutex; when opened on a file,
/// every mutation is written back before the call returns.
pub struct JsonStore {
    data: Mutex<Data>,
    path: Option<PathBuf>,
}

impl JsonStore {
    /// A store that lives only as long as the value
    pub fn in_memory() -> Self {
        Self {
            data: Mutex::new(Data::default()),
            path: None,
        }
    }

    /// Open (or start) a store persisted at `path`
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let data = if path.exists() {
            let contents = fs::read_to_string(&path)?;
            let data: Data = serde_json::from_str(&contents)?;
            info!(
                "Loaded {} services and {} backups from {:?}",
                data.services.len(),
                data.backups.len(),
                path
            );
            data
        } else {
            debug!("Data file {:?} does not exist yet, starting empty", path);
            Data::default()
        };

        Ok(Self {
            data: Mutex::new(data),
            path: Some(path),
        })
    }

    /// Apply a mutation and persist the result.
    ///
    /// The mutation runs on a copy that replaces the held state only once it
    /// has been written, so a failed write leaves memory untouched.
    fn write<T>(&self, mutate: impl FnOnce(&mut Data) -> Result<T>) -> Result<T> {
        let mut data = self.data.lock();

        let Some(ref path) = self.path else {
            return mutate(&mut data);
        };

        let mut candidate = data.clone();
        let value = mutate(&mut candidate)?;
        Self::persist(path, &candidate)?;
        *data = candidate;

        Ok(value)
    }

    fn persist(path: &Path, data: &Data) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        // Write-then-rename so a crash never leaves a truncated file
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(data)?)?;
        fs::rename(&tmp, path)?;
        Ok(())
    }
}

impl ServiceRepository for JsonStore {
    fn insert_service(&self, mut service: Service) -> Result<Service> {
        self.write(|data| {
            if let Some(port) = service.port {
                if data.port_in_use(port, None) {
                    return Err(StoreError::PortConflict(port));
                }
            }

            data.next_service_id += 1;
            service.set_id(data.next_service_id);
            data.services.insert(data.next_service_id, service.clone());
            Ok(service)
        })
    }

    fn update_service(&self, service: &Service) -> Result<()> {
        let id = service
            .id()
            .ok_or_else(|| StoreError::MissingId(service.name.clone()))?;

        self.write(|data| {
            if !data.services.contains_key(&id) {
                return Err(StoreError::ServiceNotFound(id));
            }
            if let Some(port) = service.port {
                if data.port_in_use(port, Some(id)) {
                    return Err(StoreError::PortConflict(port));
                }
            }
            data.services.insert(id, service.clone());
            Ok(())
        })
    }

    fn get_service(&self, id: ServiceId) -> Result<Service> {
        self.data
            .lock()
            .services
            .get(&id)
            .cloned()
            .ok_or(StoreError::ServiceNotFound(id))
    }

    fn remove_service(&self, id: ServiceId) -> Result<()> {
        self.write(|data| {
            data.services
                .remove(&id)
                .map(|_| ())
                .ok_or(StoreError::ServiceNotFound(id))
        })
    }

    fn list_services(&self) -> Vec<Service> {
        self.data.lock().services.values().cloned().collect()
    }

    fn port_in_use(&self, port: u16, exclude: Option<ServiceId>) -> bool {
        self.data.lock().port_in_use(port, exclude)
    }
}

impl BackupRepository for JsonStore {
    fn create_backup(&self, service_id: ServiceId) -> Result<Backup> {
        self.write(|data| {
            if !data.services.contains_key(&service_id) {
                return Err(StoreError::ServiceNotFound(service_id));
            }
            data.next_backup_id += 1;
            let backup = Backup::new(data.next_backup_id, service_id);
            data.backups.insert(backup.id, backup.clone());
            Ok(backup)
        })
    }

    fn get_backup(&self, id: BackupId) -> Result<Backup> {
        self.data
            .lock()
            .backups
            .get(&id)
            .cloned()
            .ok_or(StoreError::BackupNotFound(id))
    }

    fn update_backup(&self, backup: &Backup) -> Result<()> {
        self.write(|data| match data.backups.get_mut(&backup.id) {
            Some(existing) => {
                *existing = backup.clone();
                Ok(())
            }
            None => Err(StoreError::BackupNotFound(backup.id)),
        })
    }

    fn backups_for(&self, service_id: ServiceId) -> Vec<Backup> {
        self.data
            .lock()
            .backups
            .values()
            .filter(|b| b.service_id == service_id)
            .cloned()
            .collect()
    }
}
