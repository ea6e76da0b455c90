use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub global: GlobalConfig,

    /// Canonical image overrides, keyed by service type
    #[serde(default)]
    pub images: HashMap<String, String>,
}

/// Global configuration settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GlobalConfig {
    /// Host used in connection strings and backup environments
    #[serde(default = "default_host")]
    pub host: String,

    /// JSON file holding service and backup records
    #[serde(default = "default_data_file")]
    pub data_file: PathBuf,

    /// Where backup artifacts are written
    #[serde(default = "default_backup_directory")]
    pub backup_directory: PathBuf,

    /// Directory containing the per-type backup scripts
    #[serde(default = "default_scripts_directory")]
    pub scripts_directory: PathBuf,

    /// Directory for per-service backup lock files (OS temp dir when unset)
    #[serde(default)]
    pub lock_directory: Option<PathBuf>,

    /// Timeout settings
    #[serde(default = "default_docker_timeout")]
    pub docker_timeout_seconds: u64,
    #[serde(default = "default_backup_timeout")]
    pub backup_timeout_seconds: u64,

    /// How many random ports to try before giving up on a collision
    #[serde(default = "default_max_port_attempts")]
    pub max_port_attempts: u32,

    /// Logging configuration
    #[serde(default = "default_log_directory")]
    pub log_directory: PathBuf,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_log_max_files")]
    pub log_max_files: u32,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            data_file: default_data_file(),
            backup_directory: default_backup_directory(),
            scripts_directory: default_scripts_directory(),
            lock_directory: None,
            docker_timeout_seconds: default_docker_timeout(),
            backup_timeout_seconds: default_backup_timeout(),
            max_port_attempts: default_max_port_attempts(),
            log_directory: default_log_directory(),
            log_level: default_log_level(),
            log_max_files: default_log_max_files(),
        }
    }
}

impl GlobalConfig {
    pub fn docker_timeout(&self) -> Duration {
        Duration::from_secs(self.docker_timeout_seconds)
    }

    pub fn backup_timeout(&self) -> Duration {
        Duration::from_secs(self.backup_timeout_seconds)
    }

    pub fn lock_directory(&self) -> PathBuf {
        self.lock_directory
            .clone()
            .unwrap_or_else(std::env::temp_dir)
    }
}

// Default value functions

fn default_host() -> String { "localhost".to_string() }
fn default_data_file() -> PathBuf { PathBuf::from("~/.local/share/service-manager/services.json") }
fn default_backup_directory() -> PathBuf { PathBuf::from("~/backups/services") }
fn default_scripts_directory() -> PathBuf { PathBuf::from("scripts/backup") }
fn default_docker_timeout() -> u64 { 30 }
fn default_backup_timeout() -> u64 { 3600 }
fn default_max_port_attempts() -> u32 { 10 }
fn default_log_directory() -> PathBuf { PathBuf::from("~/logs") }
fn default_log_level() -> String { "info".to_string() }
fn default_log_max_files() -> u32 { 10 }
