//! Fluent API for building test configurations
//!
//! Every path points inside a private temp directory so tests never touch the
//! user's data file, backups or logs.

use service_manager::config::{Config, GlobalConfig};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Builder for creating test configurations
pub struct ConfigBuilder {
    temp_dir: TempDir,
    global: GlobalConfig,
    images: HashMap<String, String>,
}

impl ConfigBuilder {
    /// Create a new ConfigBuilder rooted in a fresh temp directory
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let root = temp_dir.path();

        let global = GlobalConfig {
            data_file: root.join("data").join("services.json"),
            backup_directory: root.join("backups"),
            scripts_directory: root.join("scripts"),
            lock_directory: Some(root.join("locks")),
            log_directory: root.join("logs"),
            backup_timeout_seconds: 30,
            ..GlobalConfig::default()
        };

        Self {
            temp_dir,
            global,
            images: HashMap::new(),
        }
    }

    /// Host used in connection strings and backup environments
    pub fn with_host(mut self, host: &str) -> Self {
        self.global.host = host.to_string();
        self
    }

    /// Override the canonical image of a service type
    pub fn with_image(mut self, service_type: &str, image: &str) -> Self {
        self.images.insert(service_type.to_string(), image.to_string());
        self
    }

    pub fn with_max_port_attempts(mut self, attempts: u32) -> Self {
        self.global.max_port_attempts = attempts;
        self
    }

    pub fn with_backup_timeout(mut self, seconds: u64) -> Self {
        self.global.backup_timeout_seconds = seconds;
        self
    }

    /// Point backups at a real scripts directory
    pub fn with_scripts_directory(mut self, path: &Path) -> Self {
        self.global.scripts_directory = path.to_path_buf();
        self
    }

    /// Get the temp directory path
    pub fn temp_dir(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Path the config will be written to by [`ConfigBuilder::persist`]
    pub fn config_path(&self) -> PathBuf {
        self.temp_dir.path().join("service-manager.toml")
    }

    /// Build the config (temp directory is dropped)
    pub fn build(self) -> Config {
        Config {
            global: self.global,
            images: self.images,
        }
    }

    /// Write the config as TOML and keep the temp directory alive
    pub fn persist(self) -> (Config, TempDir) {
        let path = self.config_path();
        let config = Config {
            global: self.global,
            images: self.images,
        };

        let toml_str = toml::to_string_pretty(&config).expect("Failed to serialize config");
        fs::write(&path, toml_str).expect("Failed to write config file");

        (config, self.temp_dir)
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
