//! Logging setup with file rotation
//!
//! Two outputs:
//! - Console: INFO and above, concise
//! - File: configured level, rotated daily, oldest files pruned

use crate::config::{expand_tilde, GlobalConfig};
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

const LOG_FILE_PREFIX: &str = "service-manager";

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub log_directory: PathBuf,
    /// Level for file output; the console always uses INFO
    pub log_level: Level,
    /// Number of log files kept after cleanup
    pub max_files: u32,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_directory: dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("logs"),
            log_level: Level::DEBUG,
            max_files: 10,
        }
    }
}

impl LoggingConfig {
    pub fn from_config(global: &GlobalConfig) -> Self {
        Self {
            log_directory: global.log_directory.clone(),
            log_level: parse_level(&global.log_level),
            max_files: global.log_max_files,
        }
    }
}

fn parse_level(level: &str) -> Level {
    match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" | "warning" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

/// Install console and rolling-file logging.
///
/// Keep the returned guard alive for the life of the program; dropping it
/// flushes buffered file output.
pub fn init_logging(config: &LoggingConfig) -> Result<LogGuard> {
    let log_dir = expand_tilde(&config.log_directory);
    fs::create_dir_all(&log_dir)
        .with_context(|| format!("Failed to create log directory: {:?}", log_dir))?;

    let file_appender = RollingFileAppender::new(
        Rotation::DAILY,
        &log_dir,
        format!("{}.log", LOG_FILE_PREFIX),
    );
    let (non_blocking, file_guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true)
        .with_filter(level_filter(config.log_level));

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(level_filter(Level::INFO));

    tracing_subscriber::registry()
        .with(file_layer)
        .with(console_layer)
        .try_init()
        .context("A global logger is already installed")?;

    cleanup_old_logs(&log_dir, config.max_files)?;

    Ok(LogGuard {
        _file_guard: file_guard,
    })
}

/// Console-only logging for embedders without a log directory.
/// Does nothing if a logger is already installed.
pub fn init_console_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// `RUST_LOG` wins over the configured level
fn level_filter(level: Level) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{},service_manager={}", level, level)))
}

/// Keep only the `max_files` most recently modified log files
fn cleanup_old_logs(log_dir: &Path, max_files: u32) -> Result<()> {
    let mut log_files: Vec<_> = fs::read_dir(log_dir)?
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            name.starts_with(LOG_FILE_PREFIX) && name.contains(".log")
        })
        .collect();

    log_files.sort_by_key(|entry| {
        std::cmp::Reverse(entry.metadata().and_then(|m| m.modified()).ok())
    });

    for file in log_files.into_iter().skip(max_files as usize) {
        match fs::remove_file(file.path()) {
            Ok(()) => tracing::debug!("Removed old log file: {:?}", file.path()),
            Err(e) => tracing::warn!("Failed to remove old log file {:?}: {}", file.path(), e),
        }
    }

    Ok(())
}

/// Keeps the file writer alive; flushes on drop
pub struct LogGuard {
    _file_guard: WorkerGuard,
}
