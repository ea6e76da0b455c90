//! Configuration module for service-manager
//!
//! Loads and validates the TOML configuration that sets the host used in
//! connection strings, where records and backups live, runtime timeouts and
//! optional overrides of each service type's canonical image.
//!
//! ## Example Usage
//!
//! ```no_run
//! use service_manager::config;
//! use service_manager::strategies::StrategyRegistry;
//!
//! let config = config::load_config("service-manager.toml")?;
//! StrategyRegistry::from_config(&config)?.install()?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod loader;
mod types;

pub use loader::{load_config, parse_config, ConfigError, Result};
pub use types::*;

/// Expand tilde (~) in path
pub fn expand_tilde(path: &std::path::Path) -> std::path::PathBuf {
    if let Ok(stripped) = path.strip_prefix("~") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    path.to_path_buf()
}
